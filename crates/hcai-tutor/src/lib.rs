//! Turn pipeline for a Human-Centred AI tutor chatbot.
//!
//! `hcai-tutor` processes one user turn at a time through a fixed, linear
//! pipeline on top of any OpenAI-compatible chat completions endpoint:
//!
//! 1. [`SafetyScreen`](safety::SafetyScreen) checks the raw text against an
//!    ordered table of prohibited patterns. A match ends the turn with a canned
//!    refusal; nothing is stored or logged.
//! 2. The accepted text becomes a user [`Turn`](agent::session::Turn) in the
//!    caller-owned [`Session`](agent::session::Session) and a row in the CSV
//!    [`EventLogger`](event_log::EventLogger).
//! 3. [`build_messages`](context::build_messages) assembles the tutor persona,
//!    the prior history, and the new text, and the
//!    [`CompletionGateway`](api::gateway::CompletionGateway) asks the model.
//!    Without an API key the controller answers with a fixed demo-mode notice
//!    instead.
//! 4. The answer becomes an assistant turn and a second log row.
//!
//! The [`TurnController`](agent::controller::TurnController) drives all four
//! steps.
//!
//! ```ignore
//! use hcai_tutor::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TutorConfig::from_env()?;
//!     let controller = config.build_controller()?.with_event_handler(&LoggingHandler);
//!
//!     let mut session = Session::new();
//!     let outcome = controller
//!         .handle_turn(&mut session, "What is fairness in ML?", &TurnOptions::default())
//!         .await;
//!     println!("{}", outcome.text());
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`agent`] | [`TurnController`](agent::controller::TurnController), session history, turn events |
//! | [`api`] | [`CompletionBackend`](api::gateway::CompletionBackend) seam and the gateway's tagged reply |
//! | [`safety`] | Pattern table, verdicts, the refusal message |
//! | [`context`] | Message assembly for the completion request |
//! | [`event_log`] | Append-only CSV session log |
//! | [`config`] | [`TutorConfig`](config::TutorConfig) resolved from environment lookups |
//! | [`prompt`] / [`lessons`] | Persona text, scenario seeds, reflection template, mini-lessons |

pub mod agent;
pub mod api;
pub mod config;
pub mod context;
pub mod event_log;
pub mod lessons;
pub mod prelude;
pub mod prompt;
pub mod safety;

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::api::CompletionError;

// ── Constants ──────────────────────────────────────────────────────

/// Default OpenAI-compatible chat completions endpoint.
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default model for tutor completions.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Sampling temperature used for every tutor completion.
pub const TUTOR_TEMPERATURE: f32 = 0.4;

/// Default HTTP timeout for a single completion request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// ── Message types ──────────────────────────────────────────────────

/// Role of a message in the completion request.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A message in the completion request.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

// ── Request types ──────────────────────────────────────────────────

/// Chat completion request body.
#[derive(Serialize, Debug, Default)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

// ── Response types ─────────────────────────────────────────────────

/// Raw API response (internal deserialization target).
#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<ApiErrorResponse>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: RawResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    message: String,
}

/// Clean return type from [`CompletionClient::chat`].
#[derive(Debug)]
pub struct ChatCompletion {
    pub content: Option<String>,
    pub usage: Option<UsageInfo>,
    pub finish_reason: Option<String>,
}

/// Token usage statistics.
#[derive(Deserialize, Debug, Clone)]
pub struct UsageInfo {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for an OpenAI-compatible chat completions endpoint.
pub struct CompletionClient {
    pub(crate) client: reqwest::Client,
    pub(crate) api_key: String,
    pub(crate) endpoint: String,
}

impl CompletionClient {
    /// Create a client for the default endpoint and timeout.
    pub fn new(api_key: impl Into<String>) -> Result<Self, CompletionError> {
        Self::with_endpoint(api_key, DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a client for a custom endpoint (proxies, local gateways, tests).
    pub fn with_endpoint(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("hcai-tutor/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| CompletionError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        })
    }

    /// The endpoint this client posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send a chat completion request.
    pub async fn chat(&self, body: &ChatRequest) -> Result<ChatCompletion, CompletionError> {
        debug!(
            "Completion request to {}: model={}, messages={}, temperature={}",
            self.endpoint,
            body.model,
            body.messages.len(),
            body.temperature,
        );
        let start = Instant::now();

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| CompletionError::Transport(format!("failed to read response: {e}")))?;

        debug!(
            "Completion response: {} after {:.1}s, {} bytes",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(CompletionError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: RawChatResponse =
            serde_json::from_str(&text).map_err(|e| CompletionError::Malformed(e.to_string()))?;

        if let Some(err) = parsed.error {
            return Err(CompletionError::Api(err.message));
        }

        if let Some(ref usage) = parsed.usage {
            debug!(
                "Completion usage: {} prompt + {} completion = {} tokens",
                usage.prompt_tokens.unwrap_or(0),
                usage.completion_tokens.unwrap_or(0),
                usage.total_tokens.unwrap_or(0),
            );
        }

        match parsed.choices.and_then(|c| c.into_iter().next()) {
            Some(c) => {
                debug!(
                    "Completion text: {} chars",
                    c.message.content.as_ref().map_or(0, |s| s.chars().count())
                );
                Ok(ChatCompletion {
                    content: c.message.content,
                    usage: parsed.usage,
                    finish_reason: c.finish_reason,
                })
            }
            None => {
                debug!("Completion had no choices");
                Ok(ChatCompletion {
                    content: None,
                    usage: parsed.usage,
                    finish_reason: None,
                })
            }
        }
    }
}
