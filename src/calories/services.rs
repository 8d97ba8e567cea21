use tracing::{debug, info, instrument, warn};

use super::{
    cache::CacheEntry,
    dto::CalorieResponse,
    estimator::calories_per_serving,
    matcher::find_best_match,
};
use crate::{error::AppError, state::AppState};

/// Cache-first calorie lookup for one dish.
///
/// A miss searches the food source, picks the best candidate, estimates its
/// calories per serving and stores that before answering. The total is always
/// recomputed from `servings`, never cached.
#[instrument(skip(st))]
pub async fn lookup_calories(
    st: &AppState,
    dish_name: &str,
    servings: i64,
) -> Result<CalorieResponse, AppError> {
    if let Some(entry) = st.cache.get(dish_name).await {
        return Ok(CalorieResponse::scaled(
            entry.description,
            entry.calories_per_serving,
            servings,
        ));
    }

    let candidates = st.foods.search(dish_name).await?;
    let Some((best, score)) = find_best_match(dish_name, &candidates) else {
        info!("no foods returned for dish");
        return Err(AppError::NotFound);
    };
    debug!(fdc_id = ?best.fdc_id, description = %best.description, score, "best match");

    let entry = CacheEntry {
        description: best.description.clone(),
        calories_per_serving: calories_per_serving(best),
    };

    // Detached so the write still lands if the client goes away mid-request.
    let cache = st.cache.clone();
    let key = dish_name.to_owned();
    let to_store = entry.clone();
    let write = tokio::spawn(async move { cache.set(&key, &to_store).await });
    if let Err(e) = write.await {
        warn!(error = %e, "cache write task failed");
    }

    Ok(CalorieResponse::scaled(
        entry.description,
        entry.calories_per_serving,
        servings,
    ))
}
