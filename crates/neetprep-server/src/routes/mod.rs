//! HTTP route handlers.

pub mod pages;
pub mod quiz;
pub mod tutor;

use std::sync::Arc;

use axum::middleware;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::session::require_session;
use crate::state::AppState;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(pages::routes())
        .nest("/api", api_routes())
        .layer(middleware::from_fn(require_session))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new().merge(tutor::routes()).merge(quiz::routes())
}
