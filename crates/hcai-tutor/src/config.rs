//! Tutor configuration resolved from environment-style lookups.
//!
//! [`TutorConfig::from_env`] reads the process environment;
//! [`TutorConfig::from_lookup`] takes any `name -> Option<String>` function,
//! which keeps tests free of global state. A missing API key is not an error:
//! it selects demo mode.
//!
//! | Key | Fallback key | Default |
//! |-----|--------------|---------|
//! | `API_KEY` | `OPENAI_API_KEY` | none (demo mode) |
//! | `MODEL_NAME` | `OPENAI_MODEL` | `gpt-4o-mini` |
//! | `API_URL` | | OpenAI chat completions |
//! | `LOG_PATH` | | `logs/sessions.csv` |
//! | `REQUEST_TIMEOUT_SECS` | | `120` |

use std::path::PathBuf;
use std::time::Duration;

use crate::agent::controller::TurnController;
use crate::api::{CompletionError, CompletionGateway};
use crate::event_log::{DEFAULT_LOG_PATH, EventLogger};
use crate::safety::SafetyScreen;
use crate::{CompletionClient, DEFAULT_API_URL, DEFAULT_MODEL, DEFAULT_REQUEST_TIMEOUT};

/// A configuration value that could not be used.
#[derive(Debug, thiserror::Error)]
#[error("invalid {key}={value:?}: {reason}")]
pub struct ConfigError {
    pub key: String,
    pub value: String,
    pub reason: String,
}

/// Look up `name`, treating unset and blank values alike, else `default`.
pub fn get_env(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    non_blank(lookup, name).unwrap_or_else(|| default.to_string())
}

fn non_blank(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Settings for one tutor session.
#[derive(Debug, Clone)]
pub struct TutorConfig {
    /// Credential for the completion endpoint. `None` means demo mode.
    pub api_key: Option<String>,
    /// Model identifier. Default: `"gpt-4o-mini"`.
    pub model: String,
    /// Chat completions endpoint.
    pub api_url: String,
    /// Session log location. Default: `logs/sessions.csv`.
    pub log_path: PathBuf,
    /// Per-request HTTP timeout. Default: 120 s.
    pub request_timeout: Duration,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl TutorConfig {
    /// Resolve from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve from an arbitrary lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_key = non_blank(&lookup, "API_KEY").or_else(|| non_blank(&lookup, "OPENAI_API_KEY"));
        let model = non_blank(&lookup, "MODEL_NAME")
            .unwrap_or_else(|| get_env(&lookup, "OPENAI_MODEL", &defaults.model));
        let api_url = get_env(&lookup, "API_URL", &defaults.api_url);
        let log_path = non_blank(&lookup, "LOG_PATH").map_or(defaults.log_path, PathBuf::from);

        let request_timeout = match non_blank(&lookup, "REQUEST_TIMEOUT_SECS") {
            None => defaults.request_timeout,
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => {
                    return Err(ConfigError {
                        key: "REQUEST_TIMEOUT_SECS".into(),
                        value: raw,
                        reason: "must be at least 1".into(),
                    });
                }
                Ok(secs) => Duration::from_secs(secs),
                Err(e) => {
                    return Err(ConfigError {
                        key: "REQUEST_TIMEOUT_SECS".into(),
                        value: raw,
                        reason: e.to_string(),
                    });
                }
            },
        };

        Ok(Self {
            api_key,
            model,
            api_url,
            log_path,
            request_timeout,
        })
    }

    /// Whether completions go to the live endpoint.
    pub fn is_live(&self) -> bool {
        self.api_key.is_some()
    }

    /// The gateway for the configured endpoint, or `None` in demo mode.
    pub fn build_gateway(&self) -> Result<Option<CompletionGateway>, CompletionError> {
        let Some(api_key) = &self.api_key else {
            return Ok(None);
        };
        let client =
            CompletionClient::with_endpoint(api_key.clone(), &self.api_url, self.request_timeout)?;
        Ok(Some(CompletionGateway::new(client)))
    }

    /// A controller with the default safety table, this config's log file,
    /// model, and (when a key is set) live gateway.
    pub fn build_controller(&self) -> Result<TurnController<'static>, CompletionError> {
        let controller = TurnController::new(
            SafetyScreen::default(),
            EventLogger::new(&self.log_path),
            self.model.clone(),
        );
        Ok(match self.build_gateway()? {
            Some(gateway) => controller.with_gateway(gateway),
            None => controller,
        })
    }
}
