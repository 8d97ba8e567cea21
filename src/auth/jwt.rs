use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{config::JwtConfig, state::AppState};

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,   // subject email
    pub user_id: Uuid, // user ID
    pub iat: usize,    // issued at (unix timestamp)
    pub exp: usize,    // expires at (unix timestamp)
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub algorithm: Algorithm,
    pub ttl: Duration,
}

impl From<&JwtConfig> for JwtKeys {
    fn from(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            algorithm: cfg.algorithm,
            ttl: Duration::from_secs((cfg.ttl_minutes.max(0) as u64) * 60),
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn issue(&self, email: &str, user_id: Uuid) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: email.to_owned(),
            user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    /// Fails on a bad signature, a malformed token, a different algorithm
    /// or an `exp` that is already in the past.
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.user_id, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str, algorithm: Algorithm) -> JwtKeys {
        JwtKeys::from(&JwtConfig {
            secret: secret.into(),
            algorithm,
            ttl_minutes: 30,
        })
    }

    #[test]
    fn issue_and_verify_token() {
        let keys = make_keys("dev-secret", Algorithm::HS256);
        let user_id = Uuid::new_v4();
        let token = keys.issue("alice@wonderland.com", user_id).expect("issue");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, "alice@wonderland.com");
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn verify_rejects_other_secret() {
        let token = make_keys("secret-a", Algorithm::HS256)
            .issue("a@b.co", Uuid::new_v4())
            .unwrap();
        assert!(make_keys("secret-b", Algorithm::HS256).verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_other_algorithm() {
        let token = make_keys("same", Algorithm::HS512)
            .issue("a@b.co", Uuid::new_v4())
            .unwrap();
        assert!(make_keys("same", Algorithm::HS256).verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_garbage() {
        let keys = make_keys("dev-secret", Algorithm::HS256);
        assert!(keys.verify("").is_err());
        assert!(keys.verify("not.a.jwt").is_err());
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = make_keys("dev-secret", Algorithm::HS256);
        let past = OffsetDateTime::now_utc().unix_timestamp() - 10;
        let claims = Claims {
            sub: "late@example.com".into(),
            user_id: Uuid::new_v4(),
            iat: (past - 60) as usize,
            exp: past as usize,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).unwrap();
        assert!(keys.verify(&token).is_err());
    }
}
