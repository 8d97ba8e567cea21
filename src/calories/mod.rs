pub mod cache;
mod dto;
pub mod estimator;
pub mod food;
pub mod handlers;
pub mod matcher;
pub mod services;
pub mod usda;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::calorie_routes()
}
