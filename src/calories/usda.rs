use async_trait::async_trait;
use reqwest::{header::RETRY_AFTER, StatusCode};
use serde::Deserialize;
use tracing::{debug, error, instrument, warn};

use super::food::FoodCandidate;
use crate::{config::UsdaConfig, error::AppError};

/// Ranked food search against an external database.
#[async_trait]
pub trait FoodSource: Send + Sync {
    /// Candidates in the order the source ranked them. Fails with
    /// `RateLimited` when the source throttles us and `UpstreamUnavailable`
    /// for anything else.
    async fn search(&self, dish_name: &str) -> Result<Vec<FoodCandidate>, AppError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    foods: Vec<FoodCandidate>,
}

/// FoodData Central `foods/search` client.
#[derive(Clone)]
pub struct UsdaClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    page_size: u32,
}

impl UsdaClient {
    pub fn new(cfg: &UsdaConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(cfg.timeout).build()?;
        Ok(Self {
            http,
            api_url: cfg.api_url.clone(),
            api_key: cfg.api_key.clone(),
            page_size: cfg.page_size,
        })
    }
}

fn upstream_failure(e: reqwest::Error) -> AppError {
    // the request URL carries the api key, keep it out of the logs
    error!(error = %e.without_url(), "usda request failed");
    AppError::UpstreamUnavailable
}

#[async_trait]
impl FoodSource for UsdaClient {
    #[instrument(skip(self))]
    async fn search(&self, dish_name: &str) -> Result<Vec<FoodCandidate>, AppError> {
        let page_size = self.page_size.to_string();
        let response = self
            .http
            .get(&self.api_url)
            .query(&[
                ("query", dish_name),
                ("api_key", self.api_key.as_str()),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .map_err(upstream_failure)?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            warn!(?retry_after, "usda rate limit exceeded");
            return Err(AppError::RateLimited {
                message: "Rate Limit Exceeded".into(),
                retry_after,
            });
        }

        let response = response.error_for_status().map_err(upstream_failure)?;
        let body: SearchResponse = response.json().await.map_err(upstream_failure)?;

        debug!(count = body.foods.len(), "usda search returned");
        Ok(body.foods)
    }
}
