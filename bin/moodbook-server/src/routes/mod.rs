//! Axum router construction.
//!
//! [`build`] assembles the complete application router:
//! - the `/message` submit / list routes
//! - the health / heartbeat route
//! - a `400 Invalid route` fallback for every other method or path
//! - middleware layers (CORS headers and preflight, per-request trace ID)

mod health;
mod message;

use std::sync::Arc;

use axum::{Router, middleware};

use crate::error::ServerError;
use crate::middleware::{cors, trace};
use crate::state::AppState;

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .merge(health::router())
        .merge(message::router())
        .fallback(invalid_route)
        .method_not_allowed_fallback(invalid_route)
        .with_state(state)
        .layer(cors::cors_layer())
        .layer(middleware::from_fn(trace::trace_middleware));

    // Outermost, so headers are stamped after every inner layer has run.
    for layer in cors::cors_headers() {
        app = app.layer(layer);
    }
    app
}

async fn invalid_route() -> ServerError {
    ServerError::BadRequest("Invalid route".into())
}
