//! Best-effort emotion classification.
//!
//! A [`Classifier`] never fails: every problem on the way to a label is
//! logged and folded into [`Emotion::Unknown`], so classification can never
//! block storing a message.

pub mod openai;

pub use openai::{OpenAiClassifier, OpenAiConfig};

use async_trait::async_trait;
use thiserror::Error;

use crate::entry::Emotion;

/// Assigns an [`Emotion`] to free text.
#[async_trait]
pub trait Classifier: Send + Sync + 'static {
    async fn classify(&self, text: &str) -> Emotion;
}

/// Why a classification attempt produced no usable label.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("no API key configured")]
    MissingApiKey,

    #[error("classification request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("response contained no tool call")]
    NoToolCall,

    #[error("tool call returned no labels")]
    EmptyLabels,

    #[error("tool call arguments are not valid JSON: {0}")]
    Arguments(#[from] serde_json::Error),
}
