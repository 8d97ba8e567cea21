use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, instrument};

use super::{
    dto::{CalorieRequest, CalorieResponse},
    services::lookup_calories,
};
use crate::{auth::extractors::AuthUser, error::AppError, state::AppState, validation::ValidJson};

pub fn calorie_routes() -> Router<AppState> {
    Router::new().route("/get-calories", post(get_calories))
}

#[instrument(skip_all, fields(user_id = %user.id, dish_name = %payload.dish_name))]
pub async fn get_calories(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidJson(payload): ValidJson<CalorieRequest>,
) -> Result<Json<CalorieResponse>, AppError> {
    let response = lookup_calories(&state, &payload.dish_name, payload.servings).await?;
    info!(
        servings = response.servings,
        total_calories = response.total_calories,
        "calories estimated"
    );
    Ok(Json(response))
}
