//! Failure classification for completion requests.

/// Why a completion request produced no answer.
///
/// The `Display` form is what the user sees after the `"Model error: "`
/// prefix, so variants keep the upstream detail verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    /// The request never got a response (DNS, TLS, connect, timeout).
    #[error("request failed: {0}")]
    Transport(String),
    /// The endpoint answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// The endpoint answered 2xx but the payload carried an `error` object.
    #[error("API error: {0}")]
    Api(String),
    /// The payload was not a chat completion.
    #[error("failed to parse response: {0}")]
    Malformed(String),
    /// The completion had no message content.
    #[error("empty response from model")]
    Empty,
}

impl CompletionError {
    /// Credential rejected or not permitted for the model.
    pub fn is_auth(&self) -> bool {
        matches!(self, CompletionError::Http { status: 401 | 403, .. })
    }

    /// Remote rate limit or quota exhaustion.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, CompletionError::Http { status: 429, .. })
    }

    /// Short machine-friendly label, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            CompletionError::Transport(_) => "transport",
            CompletionError::Http { .. } if self.is_auth() => "auth",
            CompletionError::Http { .. } if self.is_rate_limited() => "rate_limit",
            CompletionError::Http { .. } => "http",
            CompletionError::Api(_) => "api",
            CompletionError::Malformed(_) => "malformed",
            CompletionError::Empty => "empty",
        }
    }
}
