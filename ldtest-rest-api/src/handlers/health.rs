//! Health check endpoint

use axum::{extract::State, response::IntoResponse, Json};
use tracing::debug;

use crate::{context::LoadContext, models::HealthResponse};

/// Liveness probe. Reports the number of cached results.
pub async fn health_check(State(ctx): State<LoadContext>) -> impl IntoResponse {
    debug!("Health check requested");

    Json(HealthResponse::healthy(ctx.cache.len()))
}
