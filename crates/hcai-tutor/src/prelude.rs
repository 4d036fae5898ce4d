//! Convenience re-exports for front-ends.
//!
//! ```ignore
//! use hcai_tutor::prelude::*;
//! ```

// ── Core types ──────────────────────────────────────────────────────
pub use crate::{CompletionClient, Message, MessageRole};

// ── Turn pipeline ───────────────────────────────────────────────────
pub use crate::agent::{
    AnswerSource, CompositeEventHandler, EventHandler, FnEventHandler, LoggingHandler,
    NoopHandler, Session, Turn, TurnController, TurnEvent, TurnOptions, TurnOutcome, TurnRole,
};
pub use crate::api::{CompletionBackend, CompletionError, CompletionGateway, GatewayReply};
pub use crate::context::build_messages;
pub use crate::event_log::{EventLogError, EventLogger, LogRecord};
pub use crate::safety::{SafetyScreen, SafetyVerdict};

// ── Configuration and content ───────────────────────────────────────
pub use crate::config::{ConfigError, TutorConfig};
pub use crate::lessons::{LESSONS, Lesson, find_lesson};
pub use crate::prompt::tutor_system_prompt;
