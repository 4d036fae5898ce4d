//! Static pre-call content screen.
//!
//! The screen lower-cases the input and tests it against an ordered table of
//! regex rules. The first match blocks the turn with [`REFUSAL_MESSAGE`];
//! which rule matched is kept for diagnostics but never changes what the user
//! sees. The table is data: [`SafetyScreen::from_rules`] swaps it without
//! touching the pipeline.

use regex::Regex;

/// The single refusal shown for any blocked input.
pub const REFUSAL_MESSAGE: &str = "I can’t help with that request. Here’s a safer direction we could take instead: \
discuss the ethical impacts, risk mitigations, or high-level safety principles.";

/// Built-in rule table as `(id, pattern)` pairs, matched against lower-cased
/// input.
pub const DEFAULT_RULES: &[(&str, &str)] = &[
    ("weapon-making", r"\bmake\s+(a\s+)?weapon\b"),
    ("explosives", r"\bexplosive(s)?\b"),
    ("card-numbers", r"\bcredit\s*card\s*numbers?\b"),
    ("hate-speech", r"\bhate\s*speech\b"),
];

/// Human-readable summary of what the tutor will not help with.
pub const DISALLOWED_TOPICS: &[&str] = &[
    "instructions to create weapons, explosives, or malware",
    "direct medical or legal advice",
    "personal data exfiltration or deanonymization",
    "targeted harassment or hateful content",
];

/// A rule pattern that failed to compile.
#[derive(Debug, thiserror::Error)]
#[error("invalid safety pattern '{id}': {source}")]
pub struct SafetyConfigError {
    pub id: String,
    #[source]
    pub source: regex::Error,
}

/// One entry of the rule table.
#[derive(Debug, Clone)]
pub struct SafetyRule {
    id: String,
    pattern: Regex,
}

impl SafetyRule {
    pub fn new(id: impl Into<String>, pattern: &str) -> Result<Self, SafetyConfigError> {
        let id = id.into();
        match Regex::new(pattern) {
            Ok(pattern) => Ok(Self { id, pattern }),
            Err(source) => Err(SafetyConfigError { id, source }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Allow/block decision for one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyVerdict {
    pub allowed: bool,
    /// Empty when allowed.
    pub refusal_message: String,
    /// Id of the rule that blocked the input.
    pub matched_rule: Option<String>,
}

impl SafetyVerdict {
    fn allow() -> Self {
        Self {
            allowed: true,
            refusal_message: String::new(),
            matched_rule: None,
        }
    }

    fn block(rule: &SafetyRule) -> Self {
        Self {
            allowed: false,
            refusal_message: REFUSAL_MESSAGE.to_string(),
            matched_rule: Some(rule.id.clone()),
        }
    }
}

/// Ordered pattern table with first-match-wins evaluation.
#[derive(Debug, Clone)]
pub struct SafetyScreen {
    rules: Vec<SafetyRule>,
}

impl SafetyScreen {
    /// Compile a rule table from `(id, pattern)` pairs, keeping their order.
    pub fn from_rules(rules: &[(&str, &str)]) -> Result<Self, SafetyConfigError> {
        let rules = rules
            .iter()
            .map(|(id, pattern)| SafetyRule::new(*id, pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Compile bare patterns; ids are `rule-<index>`.
    pub fn from_patterns(patterns: &[&str]) -> Result<Self, SafetyConfigError> {
        let rules = patterns
            .iter()
            .enumerate()
            .map(|(i, pattern)| SafetyRule::new(format!("rule-{i}"), pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[SafetyRule] {
        &self.rules
    }

    /// Screen `text`. Pure: same input and table, same verdict.
    pub fn screen(&self, text: &str) -> SafetyVerdict {
        let lowered = text.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(&lowered))
            .map_or_else(SafetyVerdict::allow, SafetyVerdict::block)
    }
}

impl Default for SafetyScreen {
    fn default() -> Self {
        Self::from_rules(DEFAULT_RULES).expect("built-in safety patterns are valid")
    }
}
