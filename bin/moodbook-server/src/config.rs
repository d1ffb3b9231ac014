//! Server configuration, loaded from environment variables at startup.
//!
//! A `.env` file in the working directory is read first (if present) so
//! local development does not need exported variables. The resulting
//! [`Config`] is immutable for the lifetime of the process.

use std::time::Duration;

use anyhow::{Context, bail};
use moodbook_core::{OpenAiConfig, S3Config, WriteMode};

/// Where the message log blob lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    S3(S3Config),
    /// Process memory; contents vanish on restart.
    Memory,
}

/// Runtime configuration for moodbook-server.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    pub store: StoreBackend,

    /// Object key of the log blob (default: `"messages.json"`).
    pub messages_key: String,

    pub classifier: OpenAiConfig,

    pub write_mode: WriteMode,

    /// Fetch-merge-replace cycles allowed per append in optimistic mode.
    pub write_attempts: u32,

    /// `tracing` filter string, e.g. `"info"` or `"debug,aws_config=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    ///
    /// Fails only on values that cannot be interpreted (for example an
    /// unknown write mode) or when S3 is selected without a bucket.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let env_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_owned());

        let store = match env_or("MOODBOOK_STORE", "s3").as_str() {
            "s3" => {
                let bucket = get("BUCKET_NAME")
                    .filter(|b| !b.is_empty())
                    .context("BUCKET_NAME must be set when MOODBOOK_STORE=s3")?;
                StoreBackend::S3(S3Config {
                    bucket,
                    region: get("MOODBOOK_S3_REGION"),
                    endpoint_url: get("MOODBOOK_S3_ENDPOINT"),
                })
            }
            "memory" => StoreBackend::Memory,
            other => bail!("MOODBOOK_STORE='{other}' is not one of 's3', 'memory'"),
        };

        let defaults = OpenAiConfig::default();
        let classifier = OpenAiConfig {
            api_key: get("OPENAI_API_KEY").filter(|k| !k.is_empty()),
            base_url: env_or("MOODBOOK_OPENAI_BASE_URL", &defaults.base_url),
            model: env_or("MOODBOOK_OPENAI_MODEL", &defaults.model),
            timeout: Duration::from_secs(parse_or(&get, "MOODBOOK_CLASSIFY_TIMEOUT_SECS", 30)),
        };

        let write_mode_raw = env_or("MOODBOOK_WRITE_MODE", "last-writer-wins");
        let write_mode = write_mode_raw.parse::<WriteMode>().with_context(|| {
            format!("MOODBOOK_WRITE_MODE='{write_mode_raw}' is not one of 'last-writer-wins', 'optimistic'")
        })?;

        Ok(Self {
            bind_address: env_or("MOODBOOK_BIND", "0.0.0.0:3000"),
            store,
            messages_key: env_or("MOODBOOK_MESSAGES_KEY", "messages.json"),
            classifier,
            write_mode,
            write_attempts: parse_or(&get, "MOODBOOK_WRITE_ATTEMPTS", 5),
            log_level: env_or("MOODBOOK_LOG", "info"),
            log_json: get("MOODBOOK_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn parse_or<T: std::str::FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    get(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
