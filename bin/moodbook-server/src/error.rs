//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors are converted to a JSON body
//! `{"error": "..."}` with the matching status code.
//!
//! Storage failures are logged with full detail, but the caller only sees
//! the short message chosen by the handler, so bucket names and SDK error
//! text never reach clients.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use moodbook_core::LogError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// The request body could not be decoded, or the route does not exist.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The message log could not be read or written.
    #[error("{message}: {source}")]
    Storage {
        message: &'static str,
        #[source]
        source: LogError,
    },
}

impl ServerError {
    pub fn storage(message: &'static str) -> impl FnOnce(LogError) -> Self {
        move |source| ServerError::Storage { message, source }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, client_message) = match self {
            ServerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ServerError::Storage { message, source } => {
                error!(error = %source, "{message}");
                (StatusCode::INTERNAL_SERVER_ERROR, message.to_owned())
            }
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}
