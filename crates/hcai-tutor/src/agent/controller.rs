//! The per-turn pipeline.
//!
//! ```text
//! Idle ─► Screening ─┬─► Blocked ───────────────────────────────► Idle
//!                    └─► Building ─► Completing ─┬─► Fallback  ─┐
//!                                                └─► Completed ─┴─► Idle
//! ```
//!
//! A blocked input leaves no trace: no turn, no log row. An accepted input
//! always yields one user turn and one assistant turn, each logged. Session
//! log failures are reported through the [`EventHandler`] and never stop the
//! turn.

use tracing::info;

use crate::agent::events::{EventHandler, NoopHandler, TurnEvent};
use crate::agent::session::{Session, Turn};
use crate::api::{CompletionError, CompletionGateway, GatewayReply};
use crate::context::build_messages;
use crate::event_log::EventLogger;
use crate::prompt::{DEMO_MODE_NOTICE, TUTOR_PERSONA, system_prompt_for};
use crate::safety::SafetyScreen;

/// Per-turn settings chosen in the display surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnOptions {
    /// Explain steps toggle; adds a hint line to the system prompt.
    pub explain_mode: bool,
    /// Selected mini-lesson, recorded in the session log.
    pub topic: Option<String>,
}

/// Where an answer came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerSource {
    /// The model answered.
    Live,
    /// No API key; the fixed demo notice was used.
    Demo,
    /// The completion failed; the answer text is the error.
    ModelError(CompletionError),
}

impl AnswerSource {
    pub fn label(&self) -> &'static str {
        match self {
            AnswerSource::Live => "live",
            AnswerSource::Demo => "demo",
            AnswerSource::ModelError(_) => "model_error",
        }
    }
}

/// What the display surface should show for one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Refused by the safety screen. Shown as a notice, never stored.
    Blocked { refusal: String },
    /// An assistant turn was recorded with this text.
    Answered {
        text: String,
        source: AnswerSource,
        /// Session-log rows that could not be written this turn.
        log_failures: usize,
    },
}

impl TurnOutcome {
    /// The text to display as the assistant's reply or notice.
    pub fn text(&self) -> &str {
        match self {
            TurnOutcome::Blocked { refusal } => refusal,
            TurnOutcome::Answered { text, .. } => text,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, TurnOutcome::Blocked { .. })
    }
}

/// Runs one user input through screen, record, complete, record.
pub struct TurnController<'a> {
    screen: SafetyScreen,
    logger: EventLogger,
    gateway: Option<CompletionGateway>,
    model: String,
    persona: String,
    event_handler: &'a dyn EventHandler,
}

impl<'a> TurnController<'a> {
    /// A controller in demo mode. Attach a gateway with
    /// [`with_gateway`](Self::with_gateway) to go live.
    pub fn new(screen: SafetyScreen, logger: EventLogger, model: impl Into<String>) -> Self {
        Self {
            screen,
            logger,
            gateway: None,
            model: model.into(),
            persona: TUTOR_PERSONA.to_string(),
            event_handler: &NoopHandler,
        }
    }

    pub fn with_gateway(mut self, gateway: CompletionGateway) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Replace the tutor persona used as the system prompt.
    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    pub fn with_event_handler<'b>(self, handler: &'b dyn EventHandler) -> TurnController<'b> {
        TurnController {
            screen: self.screen,
            logger: self.logger,
            gateway: self.gateway,
            model: self.model,
            persona: self.persona,
            event_handler: handler,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn logger(&self) -> &EventLogger {
        &self.logger
    }

    pub fn screen(&self) -> &SafetyScreen {
        &self.screen
    }

    /// Whether answers come from the model rather than the demo notice.
    pub fn is_live(&self) -> bool {
        self.gateway.is_some()
    }

    /// Process one raw input against `session`.
    pub async fn handle_turn(
        &self,
        session: &mut Session,
        user_text: &str,
        options: &TurnOptions,
    ) -> TurnOutcome {
        // Screening
        let verdict = self.screen.screen(user_text);
        self.event_handler.on_event(&TurnEvent::Screened {
            allowed: verdict.allowed,
            matched_rule: verdict.matched_rule.as_deref(),
        });
        if !verdict.allowed {
            self.event_handler.on_event(&TurnEvent::Blocked {
                refusal: &verdict.refusal_message,
            });
            return TurnOutcome::Blocked {
                refusal: verdict.refusal_message,
            };
        }

        // Building
        let mut log_failures = 0;
        self.record(session, Turn::user(user_text), options, &mut log_failures);

        // Completing
        let (text, source) = match &self.gateway {
            None => {
                self.event_handler.on_event(&TurnEvent::DemoMode);
                (DEMO_MODE_NOTICE.to_string(), AnswerSource::Demo)
            }
            Some(gateway) => {
                let prior = session
                    .history()
                    .split_last()
                    .map_or(&[][..], |(_, before)| before);
                let system_prompt = system_prompt_for(&self.persona, options.explain_mode);
                let messages = build_messages(&system_prompt, prior, user_text);
                self.event_handler.on_event(&TurnEvent::CompletionRequested {
                    model: &self.model,
                    message_count: messages.len(),
                });

                let reply = gateway.complete(&self.model, &messages).await;
                let text = reply.display_text();
                match reply {
                    GatewayReply::Answer(_) => (text, AnswerSource::Live),
                    GatewayReply::Failed(error) => {
                        self.event_handler
                            .on_event(&TurnEvent::CompletionFailed { error: &error });
                        (text, AnswerSource::ModelError(error))
                    }
                }
            }
        };

        // Completed / Fallback
        self.record(session, Turn::assistant(text.clone()), options, &mut log_failures);
        self.event_handler
            .on_event(&TurnEvent::Answered { source: &source });
        info!(
            "Turn complete: source={}, history={}",
            source.label(),
            session.len()
        );

        TurnOutcome::Answered {
            text,
            source,
            log_failures,
        }
    }

    /// Append `turn` to the session and the log. Log failures are counted
    /// and reported, not returned.
    fn record(
        &self,
        session: &mut Session,
        turn: Turn,
        options: &TurnOptions,
        log_failures: &mut usize,
    ) {
        let role = turn.role();
        let logged = self.logger.log_event(
            role,
            turn.content(),
            options.explain_mode,
            options.topic.as_deref(),
        );
        session.push(turn);
        self.event_handler.on_event(&TurnEvent::TurnRecorded {
            role,
            history_len: session.len(),
        });
        if let Err(error) = logged {
            *log_failures += 1;
            self.event_handler
                .on_event(&TurnEvent::LogFailed { role, error: &error });
        }
    }
}
