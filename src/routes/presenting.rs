//! Presenting routes: one list and one show endpoint per presented name.

use crate::handlers::presenting::{list, show};
use crate::state::PresentingState;
use axum::{routing::get, Router};

pub fn presenting_routes(state: PresentingState) -> Router {
    Router::new()
        .route("/:name", get(list))
        .route("/:name/:id", get(show))
        .with_state(state)
}
