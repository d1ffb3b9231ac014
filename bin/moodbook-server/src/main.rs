//! moodbook-server – entry point.
//!
//! Startup order:
//! 1. Parse configuration from environment variables (and `.env`).
//! 2. Initialise structured tracing (JSON in production, pretty in dev).
//! 3. Build the blob store and classifier from configuration.
//! 4. Build the Axum router and start the HTTP server with graceful shutdown.

mod config;
mod error;
mod middleware;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use moodbook_core::{BlobStore, InMemoryBlobStore, MessageLog, OpenAiClassifier, S3BlobStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, StoreBackend};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ───────────────────────────────────────────────────────
    let cfg = Config::from_env()?;

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    init_tracing(&cfg);

    info!(version = env!("CARGO_PKG_VERSION"), "moodbook-server starting");

    // ── 3. Collaborators ───────────────────────────────────────────────────────
    let store: Arc<dyn BlobStore> = match &cfg.store {
        StoreBackend::S3(s3) => Arc::new(S3BlobStore::connect(s3.clone()).await),
        StoreBackend::Memory => {
            warn!("using in-memory blob store; messages are lost on restart");
            Arc::new(InMemoryBlobStore::new())
        }
    };

    if cfg.classifier.api_key.is_none() {
        warn!("OPENAI_API_KEY not set; every message will be labelled 'unknown'");
    }
    let classifier = OpenAiClassifier::new(cfg.classifier.clone())?;

    let log = MessageLog::new(store, Arc::new(classifier), cfg.messages_key.clone())
        .with_write_mode(cfg.write_mode)
        .with_max_attempts(cfg.write_attempts);
    info!(key = %log.key(), write_mode = %cfg.write_mode, "message log ready");

    let state = Arc::new(AppState {
        config: Arc::new(cfg.clone()),
        log: Arc::new(log),
    });

    // ── 4. HTTP server with graceful shutdown ──────────────────────────────────
    let app = routes::build(state);
    let addr: SocketAddr = cfg.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("moodbook-server stopped");
    Ok(())
}

/// `RUST_LOG` wins over `MOODBOOK_LOG`; an unparsable `MOODBOOK_LOG` falls
/// back to `info` with a note on stderr, since no subscriber exists yet.
fn init_tracing(cfg: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(&cfg.log_level).unwrap_or_else(|e| {
            eprintln!("moodbook-server: ignoring MOODBOOK_LOG={:?} ({e}); using 'info'", cfg.log_level);
            EnvFilter::new("info")
        })
    });

    let fmt = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if cfg.log_json {
        fmt.json().init();
    } else {
        fmt.init();
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix (what container runtimes send).
async fn shutdown_signal() {
    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable; only Ctrl-C stops the server");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    let signal = tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => "ctrl-c",
            Err(e) => {
                warn!(error = %e, "Ctrl-C handler unavailable");
                "ctrl-c (handler error)"
            }
        },
        () = sigterm => "sigterm",
    };

    info!(signal, "draining connections before exit");
}
