//! Turn orchestration: the controller, the session it mutates, and the
//! events it reports.
//!
//! - [`controller`] : [`TurnController`] runs screen → record user → complete
//!   (or demo fallback) → record assistant for one input.
//! - [`session`] : [`Session`] and [`Turn`], the caller-owned history.
//! - [`events`] : [`TurnEvent`] and the [`EventHandler`] observers, including
//!   [`LoggingHandler`] for `tracing` output.

pub mod controller;
pub mod events;
pub mod session;

pub use controller::{AnswerSource, TurnController, TurnOptions, TurnOutcome};
pub use events::{
    CompositeEventHandler, EventHandler, FnEventHandler, LoggingHandler, NoopHandler, TurnEvent,
};
pub use session::{Session, Turn, TurnRole};
