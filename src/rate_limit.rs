use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::{error::AppError, state::AppState, store::KvStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { count: u64 },
    Limited { retry_after: u64 },
}

/// Fixed-window request counter per client.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn KvStore>,
    limit: u64,
    window: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn KvStore>, limit: u64, window: Duration) -> Self {
        Self {
            store,
            limit,
            window,
        }
    }

    fn key(client: &str) -> String {
        format!("rate_limit:{client}")
    }

    /// Counts one request for `client`. The n-th request of a window is
    /// allowed iff n <= limit.
    pub async fn check(&self, client: &str) -> anyhow::Result<Decision> {
        let key = Self::key(client);
        let count = self.store.incr_window(&key, self.window).await?;
        if count <= self.limit {
            return Ok(Decision::Allowed { count });
        }

        let remaining = match self.store.ttl(&key).await {
            Ok(Some(secs)) => secs,
            Ok(None) => self.window.as_secs(),
            Err(e) => {
                warn!(error = %e, "rate limit ttl lookup failed");
                self.window.as_secs()
            }
        };
        Ok(Decision::Limited {
            retry_after: remaining.max(1),
        })
    }
}

fn client_id(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".into())
}

/// Global middleware; runs before routing, authentication and body parsing.
pub async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let client = client_id(&req);
    match state.rate_limiter.check(&client).await {
        Ok(Decision::Allowed { count }) => {
            debug!(%client, count, "request allowed");
            next.run(req).await
        }
        Ok(Decision::Limited { retry_after }) => {
            warn!(%client, retry_after, "rate limit exceeded");
            AppError::RateLimited {
                message: format!("Too many requests. Try again in {retry_after} seconds."),
                retry_after: Some(retry_after),
            }
            .into_response()
        }
        Err(e) => {
            // fail open
            warn!(error = %e, %client, "rate limiter unavailable, allowing request");
            next.run(req).await
        }
    }
}
