//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use moodbook_core::MessageLog;

use crate::config::Config;

/// State shared across all HTTP handlers.
///
/// Nothing here caches log contents; each request goes back to the store.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    pub log: Arc<MessageLog>,
}
