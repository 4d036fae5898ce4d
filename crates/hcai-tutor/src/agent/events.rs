//! Events and observers for the [`TurnController`](super::controller::TurnController).
//!
//! The controller reports every pipeline step as a [`TurnEvent`]. Observers
//! never influence the turn; they exist for diagnostics, UI hints, and as the
//! side channel for session-log failures, which the pipeline itself treats as
//! non-fatal.
//!
//! | Handler | Use case |
//! |---------|----------|
//! | [`NoopHandler`] | Tests or silent runs |
//! | [`LoggingHandler`] | Structured logging via `tracing` |
//! | [`FnEventHandler`] | Quick closures |
//! | [`CompositeEventHandler`] | Several handlers in order |

use tracing::{debug, info, warn};

use crate::agent::controller::AnswerSource;
use crate::agent::session::TurnRole;
use crate::api::CompletionError;
use crate::event_log::EventLogError;

/// Pipeline steps of one turn, in the order they can occur.
#[derive(Debug)]
pub enum TurnEvent<'a> {
    /// The safety screen ran.
    Screened {
        allowed: bool,
        matched_rule: Option<&'a str>,
    },
    /// The input was refused; the turn ends here.
    Blocked { refusal: &'a str },
    /// A turn was appended to the session history.
    TurnRecorded { role: TurnRole, history_len: usize },
    /// No backend is configured; the demo notice stands in for the answer.
    DemoMode,
    /// A completion request is about to be sent.
    CompletionRequested { model: &'a str, message_count: usize },
    /// The completion failed and its error text becomes the answer.
    CompletionFailed { error: &'a CompletionError },
    /// Writing a session-log row failed. The turn continues.
    LogFailed {
        role: TurnRole,
        error: &'a EventLogError,
    },
    /// The turn finished with an answer.
    Answered { source: &'a AnswerSource },
}

/// Observer for turn events.
///
/// # Example
///
/// ```
/// use hcai_tutor::agent::{EventHandler, TurnEvent};
///
/// struct CountBlocked(std::sync::atomic::AtomicUsize);
///
/// impl EventHandler for CountBlocked {
///     fn on_event(&self, event: &TurnEvent<'_>) {
///         if let TurnEvent::Blocked { .. } = event {
///             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
///         }
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: &TurnEvent<'_>) {
        let _ = event;
    }
}

/// Ignores every event.
pub struct NoopHandler;
impl EventHandler for NoopHandler {}

/// An event handler backed by a closure.
pub struct FnEventHandler<F>(F)
where
    F: Fn(&TurnEvent<'_>) + Send + Sync;

impl<F> FnEventHandler<F>
where
    F: Fn(&TurnEvent<'_>) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> EventHandler for FnEventHandler<F>
where
    F: Fn(&TurnEvent<'_>) + Send + Sync,
{
    fn on_event(&self, event: &TurnEvent<'_>) {
        (self.0)(event)
    }
}

/// Dispatches each event to every inner handler, in registration order.
///
/// ```ignore
/// let handler = CompositeEventHandler::new()
///     .with(LoggingHandler)
///     .with_if(show_hints, HintHandler);
/// ```
pub struct CompositeEventHandler {
    handlers: Vec<Box<dyn EventHandler>>,
}

impl CompositeEventHandler {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn with(mut self, handler: impl EventHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Add `handler` only when `condition` holds, keeping the chain intact.
    pub fn with_if(self, condition: bool, handler: impl EventHandler + 'static) -> Self {
        if condition { self.with(handler) } else { self }
    }
}

impl Default for CompositeEventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler for CompositeEventHandler {
    fn on_event(&self, event: &TurnEvent<'_>) {
        for handler in &self.handlers {
            handler.on_event(event);
        }
    }
}

/// Maps turn events onto `tracing` records.
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn on_event(&self, event: &TurnEvent<'_>) {
        match event {
            TurnEvent::Screened {
                allowed,
                matched_rule,
            } => {
                debug!(allowed, rule = matched_rule.unwrap_or("-"), "Input screened");
            }
            TurnEvent::Blocked { .. } => {
                info!("Input blocked by safety screen");
            }
            TurnEvent::TurnRecorded { role, history_len } => {
                debug!("Recorded {role} turn (history={history_len})");
            }
            TurnEvent::DemoMode => {
                info!("No API key configured, answering in demo mode");
            }
            TurnEvent::CompletionRequested {
                model,
                message_count,
            } => {
                info!("Requesting completion: model={model}, messages={message_count}");
            }
            TurnEvent::CompletionFailed { error } => {
                warn!(kind = error.kind(), "Completion failed: {error}");
            }
            TurnEvent::LogFailed { role, error } => {
                warn!("Session log write failed for {role} turn: {error}");
            }
            TurnEvent::Answered { source } => {
                debug!("Turn answered ({})", source.label());
            }
        }
    }
}
