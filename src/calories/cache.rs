use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::store::KvStore;

/// What we remember about a dish between requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub description: String,
    pub calories_per_serving: f64,
}

/// Dish cache keyed by the dish name exactly as the client sent it.
///
/// The store behind it is best effort: read failures are a miss and write
/// failures are dropped, both with a warning.
#[derive(Clone)]
pub struct CalorieCache {
    store: Arc<dyn KvStore>,
    ttl: Option<Duration>,
}

impl CalorieCache {
    pub fn new(store: Arc<dyn KvStore>, ttl: Option<Duration>) -> Self {
        Self { store, ttl }
    }

    pub async fn get(&self, dish_name: &str) -> Option<CacheEntry> {
        let raw = match self.store.get(dish_name).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "cache unavailable, treating as miss");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entry) => {
                debug!(dish_name, "cache hit");
                Some(entry)
            }
            Err(e) => {
                warn!(error = %e, dish_name, "unreadable cache entry, treating as miss");
                None
            }
        }
    }

    pub async fn set(&self, dish_name: &str, entry: &CacheEntry) {
        let raw = match serde_json::to_string(entry) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "cache entry not serializable");
                return;
            }
        };
        if let Err(e) = self.store.set(dish_name, &raw, self.ttl).await {
            warn!(error = %e, dish_name, "cache write failed");
        }
    }
}
