//! # REST Routes
//!
//! Route definitions for the kernel's REST API.
//!
//! # Route Structure
//!
//! ```text
//! /api/v1
//! ├── /health                      GET  - Health check
//! └── /trades                      POST - Create trade
//!     └── /{id}
//!         ├── /state               GET  - Full state snapshot
//!         ├── /transitions         POST - Request a transition
//!         ├── /events              GET  - Audit tail
//!         └── /escrow              GET  - Escrow progress view
//!             └── /hold            POST - Place the escrow hold
//! ```

use crate::api::rest::handlers::{
    create_trade, get_escrow, get_events, get_trade_state, health_check, hold_escrow,
    transition_trade, AppState,
};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Creates the REST API router with all endpoints and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api/v1", api_v1())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

fn api_v1() -> Router<Arc<AppState>> {
    let trade_routes = Router::new()
        .route("/", post(create_trade))
        .route("/{id}/state", get(get_trade_state))
        .route("/{id}/transitions", post(transition_trade))
        .route("/{id}/events", get(get_events))
        .route("/{id}/escrow", get(get_escrow))
        .route("/{id}/escrow/hold", post(hold_escrow));

    Router::new()
        .route("/health", get(health_check))
        .nest("/trades", trade_routes)
}

/// Creates a minimal router for testing without middleware.
#[cfg(test)]
pub fn create_test_router(state: Arc<AppState>) -> Router {
    Router::new().nest("/api/v1", api_v1()).with_state(state)
}
