//! List and show handlers over the presenting pipeline.

use crate::error::AppError;
use crate::response::presented_ok;
use crate::scope::BoxScope;
use crate::service::{PresentParams, PresentingOptions};
use crate::state::PresentingState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};

/// Presenter-backed base scope for `name`, or 404 when either side is unknown.
fn resolve(state: &PresentingState, name: &str, options: &PresentingOptions) -> Result<BoxScope, AppError> {
    let record_type = options.record_type(name);
    if state.collection.registry().lookup(&record_type).is_none() {
        return Err(AppError::NotFound(name.to_string()));
    }
    state
        .scopes
        .scope_for(&record_type)
        .ok_or_else(|| AppError::NotFound(name.to_string()))
}

pub async fn list(
    State(state): State<PresentingState>,
    Path(name): Path<String>,
    Query(params): Query<PresentParams>,
) -> Result<impl IntoResponse, AppError> {
    let options = PresentingOptions::from(params);
    let scope = resolve(&state, &name, &options)?;
    let response = state.collection.presenting(&name, options, move |_| scope)?;
    Ok(presented_ok(response))
}

pub async fn show(
    State(state): State<PresentingState>,
    Path((name, id_str)): Path<(String, String)>,
    Query(params): Query<PresentParams>,
) -> Result<impl IntoResponse, AppError> {
    let id: i64 = id_str
        .parse()
        .map_err(|_| AppError::BadRequest("invalid id".into()))?;
    let options = PresentingOptions::from(params);
    let scope = resolve(&state, &name, &options)?;
    let response = state.collection.present_one(&name, id, options, move |_| scope)?;
    if response.count() == 0 {
        return Err(AppError::NotFound(id_str));
    }
    Ok(presented_ok(response))
}
