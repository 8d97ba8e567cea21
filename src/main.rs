mod app;
mod auth;
mod calories;
mod config;
mod error;
mod rate_limit;
mod state;
mod store;
#[cfg(test)]
mod testing;
mod validation;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let default_filter = if config.debug {
        "calorie_counter=debug,axum=info,tower_http=info"
    } else {
        "calorie_counter=info,axum=info,tower_http=info"
    };
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let server = config.server.clone();
    let state = AppState::init(config).await?;
    app::serve(app::build_app(state), &server).await
}
