//! Stored message records and their emotion label.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use uuid::Uuid;

/// Emotion label attached to every stored message.
///
/// The seven classifiable labels form a closed set; [`Emotion::Unknown`] is
/// the sentinel used whenever classification did not produce one of them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Display, EnumIter, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum Emotion {
    Happy,
    Love,
    Angry,
    Sad,
    Afraid,
    Bored,
    Calm,
    #[default]
    Unknown,
}

impl Emotion {
    /// The labels a classifier may choose from (everything except `unknown`).
    pub fn labels() -> Vec<&'static str> {
        Emotion::iter()
            .filter(|e| *e != Emotion::Unknown)
            .map(Into::into)
            .collect()
    }

    /// Parse a label, mapping anything outside the closed set to `unknown`.
    pub fn from_label(label: &str) -> Self {
        Emotion::from_str(label.trim()).unwrap_or(Emotion::Unknown)
    }
}

// Stored blobs may carry labels written by older deployments or returned
// verbatim by the model; those decode as `unknown` instead of failing.
impl<'de> Deserialize<'de> for Emotion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Emotion::from_label(&label))
    }
}

/// Request body for submitting a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl NewMessage {
    /// Decode a request body. Only a JSON object is accepted; missing
    /// fields become empty strings.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        let fields: Map<String, Value> = serde_json::from_slice(body)?;
        NewMessage::deserialize(Value::Object(fields))
    }
}

/// One stored message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// UUID v4 assigned at creation.
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    /// Unix timestamp (seconds) assigned at creation.
    pub time: i64,
    pub emotion_type: Emotion,
}

impl Entry {
    /// Build a new entry with a freshly generated id.
    pub fn new(submitted: NewMessage, emotion: Emotion, time: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: submitted.name,
            email: submitted.email,
            message: submitted.message,
            time,
            emotion_type: emotion,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
