//! The completion gateway and the backend seam behind it.
//!
//! [`CompletionGateway::complete`] never returns an `Err` to its caller.
//! Failures come back as [`GatewayReply::Failed`], which still has a
//! [`display_text`](GatewayReply::display_text) (`"Model error: ..."`) so the
//! interactive loop can show it in place of an answer.

use std::future::Future;
use std::pin::Pin;

use tracing::warn;

use crate::api::CompletionError;
use crate::{ChatRequest, CompletionClient, Message, TUTOR_TEMPERATURE};

/// Prefix for completion failures rendered as the assistant's answer.
pub const MODEL_ERROR_PREFIX: &str = "Model error: ";

/// Boxed future returned by [`CompletionBackend::complete`].
pub type CompletionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, CompletionError>> + Send + 'a>>;

/// Anything that can turn an ordered message list into answer text.
///
/// [`CompletionClient`] is the production implementation. Tests plug in
/// scripted backends.
///
/// # Example
///
/// ```
/// use hcai_tutor::Message;
/// use hcai_tutor::api::{CompletionBackend, CompletionFuture};
///
/// struct Echo;
///
/// impl CompletionBackend for Echo {
///     fn complete<'a>(
///         &'a self,
///         _model: &'a str,
///         messages: &'a [Message],
///         _temperature: f32,
///     ) -> CompletionFuture<'a> {
///         let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
///         Box::pin(async move { Ok(last) })
///     }
/// }
/// ```
pub trait CompletionBackend: Send + Sync {
    fn complete<'a>(
        &'a self,
        model: &'a str,
        messages: &'a [Message],
        temperature: f32,
    ) -> CompletionFuture<'a>;
}

impl CompletionBackend for CompletionClient {
    fn complete<'a>(
        &'a self,
        model: &'a str,
        messages: &'a [Message],
        temperature: f32,
    ) -> CompletionFuture<'a> {
        Box::pin(async move {
            let body = ChatRequest {
                model: model.to_string(),
                messages: messages.to_vec(),
                temperature,
                max_tokens: None,
            };
            let completion = self.chat(&body).await?;
            completion.content.ok_or(CompletionError::Empty)
        })
    }
}

/// Result of one gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayReply {
    /// The model's answer.
    Answer(String),
    /// The call failed; the error is surfaced, not raised.
    Failed(CompletionError),
}

impl GatewayReply {
    /// Text to show as the assistant's turn.
    pub fn display_text(&self) -> String {
        match self {
            GatewayReply::Answer(text) => text.clone(),
            GatewayReply::Failed(err) => format!("{MODEL_ERROR_PREFIX}{err}"),
        }
    }

    pub fn error(&self) -> Option<&CompletionError> {
        match self {
            GatewayReply::Answer(_) => None,
            GatewayReply::Failed(err) => Some(err),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error().is_some()
    }
}

/// Wraps a [`CompletionBackend`] with the tutor's fixed sampling settings.
pub struct CompletionGateway {
    backend: Box<dyn CompletionBackend>,
    temperature: f32,
}

impl CompletionGateway {
    pub fn new(backend: impl CompletionBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            temperature: TUTOR_TEMPERATURE,
        }
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Ask the backend for an answer to `messages`, in the given order.
    pub async fn complete(&self, model: &str, messages: &[Message]) -> GatewayReply {
        match self
            .backend
            .complete(model, messages, self.temperature)
            .await
        {
            Ok(text) => GatewayReply::Answer(text),
            Err(err) => {
                warn!(kind = err.kind(), "Completion failed: {err}");
                GatewayReply::Failed(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every call and replays a fixed result.
    struct Scripted {
        result: Result<String, CompletionError>,
        calls: Arc<Mutex<Vec<(String, Vec<Message>, f32)>>>,
    }

    impl CompletionBackend for Scripted {
        fn complete<'a>(
            &'a self,
            model: &'a str,
            messages: &'a [Message],
            temperature: f32,
        ) -> CompletionFuture<'a> {
            self.calls
                .lock()
                .unwrap()
                .push((model.to_string(), messages.to_vec(), temperature));
            let result = self.result.clone();
            Box::pin(async move { result })
        }
    }

    #[tokio::test]
    async fn passes_messages_through_with_fixed_temperature() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let gateway = CompletionGateway::new(Scripted {
            result: Ok("Fairness means...".into()),
            calls: calls.clone(),
        });
        let messages = vec![Message::system("SYS"), Message::user("fairness?")];

        let reply = gateway.complete("gpt-4o-mini", &messages).await;

        assert_eq!(reply, GatewayReply::Answer("Fairness means...".into()));
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "gpt-4o-mini");
        assert_eq!(calls[0].1, messages);
        assert!((calls[0].2 - 0.4).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn failure_becomes_model_error_text() {
        let gateway = CompletionGateway::new(Scripted {
            result: Err(CompletionError::Http {
                status: 401,
                body: "invalid api key".into(),
            }),
            calls: Arc::new(Mutex::new(Vec::new())),
        });

        let reply = gateway.complete("gpt-4o-mini", &[Message::user("hi")]).await;

        assert!(reply.is_failure());
        assert!(reply.error().unwrap().is_auth());
        assert_eq!(reply.display_text(), "Model error: HTTP 401: invalid api key");
    }

    #[test]
    fn answer_display_text_is_verbatim() {
        let reply = GatewayReply::Answer("plain answer".into());
        assert_eq!(reply.display_text(), "plain answer");
        assert!(reply.error().is_none());
    }
}
