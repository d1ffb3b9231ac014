//! Classifier backed by an OpenAI-compatible chat-completions API.
//!
//! The message is sent as a single user turn together with one function
//! tool whose only parameter is an array of labels restricted to
//! [`Emotion::labels`]. The model is forced to call that tool; the first
//! label of the first tool call is the result.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::{Classifier, ClassifyError};
use crate::entry::Emotion;

const TOOL_NAME: &str = "check_message_emotional_type";
const TOOL_DESCRIPTION: &str = "Check the emotional type of the message and return only one from: \
     \"happy\", \"love\", \"angry\", \"sad\", \"afraid\", \"bored\", or \"calm\".";

/// Settings for [`OpenAiClassifier`].
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Bearer token. When absent every message is labelled `unknown`.
    pub api_key: Option<String>,
    /// API root, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub model: String,
    /// Whole-request timeout applied by the HTTP client.
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_owned(),
            model: "gpt-4o-mini".to_owned(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiClassifier {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiClassifier {
    pub fn new(config: OpenAiConfig) -> Result<Self, ClassifyError> {
        let client = Client::builder()
            .user_agent(concat!("moodbook/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// Run one classification round-trip, reporting why it failed if it did.
    pub async fn try_classify(&self, text: &str) -> Result<Emotion, ClassifyError> {
        let api_key = self.config.api_key.as_deref().ok_or(ClassifyError::MissingApiKey)?;
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));

        let response: ChatCompletionResponse = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&self.request_body(text))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        label_from_response(&response)
    }

    fn request_body<'a>(&'a self, text: &'a str) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: text,
            }],
            tools: vec![json!({
                "type": "function",
                "function": {
                    "name": TOOL_NAME,
                    "description": TOOL_DESCRIPTION,
                    "parameters": {
                        "type": "object",
                        "properties": {
                            "emotional_types": {
                                "type": "array",
                                "items": { "type": "string", "enum": Emotion::labels() },
                            },
                        },
                        "required": ["emotional_types"],
                    },
                },
            })],
            tool_choice: json!({ "type": "function", "function": { "name": TOOL_NAME } }),
        }
    }
}

#[async_trait]
impl Classifier for OpenAiClassifier {
    async fn classify(&self, text: &str) -> Emotion {
        match self.try_classify(text).await {
            Ok(emotion) => {
                debug!(%emotion, "message classified");
                emotion
            }
            Err(e) => {
                warn!(error = %e, "classification failed; labelling message as unknown");
                Emotion::Unknown
            }
        }
    }
}

/// Extract the label from a chat-completion response.
fn label_from_response(response: &ChatCompletionResponse) -> Result<Emotion, ClassifyError> {
    let call = response
        .choices
        .first()
        .and_then(|c| c.message.tool_calls.as_ref())
        .and_then(|calls| calls.first())
        .ok_or(ClassifyError::NoToolCall)?;

    let args: ToolArguments = serde_json::from_str(&call.function.arguments)?;
    let first = args.emotional_types.first().ok_or(ClassifyError::EmptyLabels)?;
    Ok(Emotion::from_label(first))
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    tools: Vec<Value>,
    tool_choice: Value,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ToolArguments {
    #[serde(default)]
    emotional_types: Vec<String>,
}

// ── Tests ──────────────────────────────────────────────────────────────────────
