//! API service routes

use access_log::RequestLogger;
use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use serde_json::json;

use crate::state::AppState;

/// Create the router for the API service, with every route behind the request logger
pub fn create_router(state: AppState, logger: &RequestLogger) -> Router {
    let routes = Router::new()
        .route("/health", get(health_check))
        .with_state(state);

    logger.wrap(routes)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service",
        "mode": state.mode.as_str(),
    }))
}
