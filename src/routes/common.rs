//! Common routes: health, readiness, version.

use crate::state::PresentingState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    presenters: usize,
    finalized: bool,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

/// Ready once registration is finalized.
async fn ready(State(state): State<PresentingState>) -> (StatusCode, Json<ReadyBody>) {
    let registry = state.collection.registry();
    let finalized = registry.is_finalized();
    let body = ReadyBody {
        status: if finalized { "ok" } else { "degraded" },
        presenters: registry.record_types().len(),
        finalized,
    };
    let status = if finalized {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Common routes (no state): GET /health, GET /version, GET /info.
pub fn common_routes() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/info", get(version))
}

/// Common routes including readiness on registry finalization.
pub fn common_routes_with_ready(state: PresentingState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .route("/info", get(version))
        .with_state(state)
}
