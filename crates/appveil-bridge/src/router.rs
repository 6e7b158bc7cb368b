//! Axum router wiring for the diagnostics endpoints.

use axum::{routing::get, Router};

use crate::{app_state::AppState, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(ops::healthz))
        .route("/v1/status", get(ops::status))
        .route("/v1/snapshot", get(ops::snapshot))
        .route("/v1/linked", get(ops::linked))
        .with_state(state)
}
