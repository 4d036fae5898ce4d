//! Persona and study-aid text for the tutor.

/// Fixed tutor persona sent as the system message of every request.
pub const TUTOR_PERSONA: &str = "\
You are HCAI Tutor, a concise, student-friendly assistant
that teaches Human-Centred AI (HCAI). Prioritise clarity, humility, and practical
guidance. For each answer:
1) Give a crisp explanation.
2) When relevant, include a short ethical lens (fairness, accountability,
    transparency, privacy, human oversight).
3) If uncertain, say so and suggest a safe next step.

You must avoid unsafe, illegal, or harmful content. If a user asks for something
risky, gently refuse and give safer alternatives.

Tone: supportive, plain language, 2-6 sentence answers unless asked for more.";

/// Hint appended to the persona when Explain steps is on.
pub const EXPLAIN_ON_HINT: &str = "User enabled Explain steps.";

/// Hint appended to the persona when Explain steps is off.
pub const EXPLAIN_OFF_HINT: &str = "User disabled Explain steps.";

/// Answer used instead of a completion when no API key is configured.
pub const DEMO_MODE_NOTICE: &str = "Demo mode (no API key found). If this were live, I’d answer with \
a concise explanation plus an ethical lens. Add your key to `.env`.";

/// Starter scenarios students can explore.
pub const SCENARIOS: &[&str] = &[
    "Bias in loan approvals when training data under-represents certain groups.",
    "Face recognition at stadiums and proportionality/consent concerns.",
    "Chatbot giving medical or legal advice: safety and scope boundaries.",
    "Smart public transport predictions and rider privacy.",
];

/// Reusable reflection rubric.
pub const REFLECTION_PROMPT: &str = "\
Try a quick reflection:
• What decision or trade-off did you just consider?
• Which stakeholders are affected and how?
• What information would improve your decision?
• What would a transparent explanation to a lay user look like?";

/// `persona` followed by the one-line Explain steps hint.
pub fn system_prompt_for(persona: &str, explain_mode: bool) -> String {
    let hint = if explain_mode {
        EXPLAIN_ON_HINT
    } else {
        EXPLAIN_OFF_HINT
    };
    format!("{}\n{hint}", persona.trim_end())
}

/// The default persona with the Explain steps hint.
pub fn tutor_system_prompt(explain_mode: bool) -> String {
    system_prompt_for(TUTOR_PERSONA, explain_mode)
}
