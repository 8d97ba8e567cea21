use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::{error, warn};

use super::{jwt::JwtKeys, repo::UserRepo, repo_types::User};
use crate::{error::AppError, state::AppState};

/// Resolves a bearer token to the user it was issued for.
#[derive(Clone)]
pub struct AuthGate {
    keys: JwtKeys,
    users: Arc<dyn UserRepo>,
}

impl FromRef<AppState> for AuthGate {
    fn from_ref(state: &AppState) -> Self {
        Self::new(JwtKeys::from_ref(state), state.users.clone())
    }
}

impl AuthGate {
    pub fn new(keys: JwtKeys, users: Arc<dyn UserRepo>) -> Self {
        Self { keys, users }
    }

    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let claims = self.keys.verify(token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            AppError::Unauthenticated
        })?;

        let user = self
            .users
            .find_by_email(&claims.sub)
            .await
            .map_err(|e| {
                error!(error = %e, "find_by_email failed");
                AppError::Internal(e)
            })?;

        match user {
            Some(user) if user.id == claims.user_id => Ok(user),
            Some(user) => {
                warn!(user_id = %user.id, token_user_id = %claims.user_id, "token user id mismatch");
                Err(AppError::Unauthenticated)
            }
            None => {
                warn!(user_id = %claims.user_id, "token subject no longer exists");
                Err(AppError::Unauthenticated)
            }
        }
    }
}

/// The authenticated user of a protected route.
pub struct AuthUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthGate: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Read Authorization header
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AppError::NotAuthenticated)?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::NotAuthenticated)?;

        let gate = AuthGate::from_ref(state);
        gate.authenticate(token).await.map(AuthUser)
    }
}
