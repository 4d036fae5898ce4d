//! Mini-lesson library.
//!
//! The selected lesson's name is what the session log records as `topic`.

/// A short study card on one HCAI theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lesson {
    pub name: &'static str,
    pub summary: &'static str,
    pub example: &'static str,
    pub reflection: &'static [&'static str],
}

impl Lesson {
    /// Plain-text rendering for terminal display.
    pub fn render(&self) -> String {
        let mut out = format!(
            "{}\n\nSummary: {}\nExample: {}\n\nReflect:",
            self.name, self.summary, self.example
        );
        for question in self.reflection {
            out.push_str("\n- ");
            out.push_str(question);
        }
        out
    }
}

pub const LESSONS: &[Lesson] = &[
    Lesson {
        name: "Fairness 101",
        summary: "Sources of bias (data, labels, deployment). Mitigations: re-sampling, re-weighting, audits.",
        example: "Loan approvals under-represent Group A. Try stratified sampling + threshold analysis.",
        reflection: &[
            "Whose error matters most?",
            "What metric is fair in this context?",
        ],
    },
    Lesson {
        name: "Transparency & Explainability",
        summary: "Explain the *what* and *why*, not internal weights. Prefer plain-language rationales.",
        example: "Show feature attributions at a high level; disclose uncertainty.",
        reflection: &["What would a layperson need to trust this?"],
    },
    Lesson {
        name: "Privacy & Data Minimisation",
        summary: "Collect the least data needed; prefer aggregation or differential privacy.",
        example: "Smart transport prediction with anonymised, aggregated tap-on data.",
        reflection: &["What happens if data leaks?"],
    },
];

/// Find a lesson by name, case-insensitively. An exact name wins; otherwise
/// a prefix that picks out exactly one lesson is accepted.
pub fn find_lesson(query: &str) -> Option<&'static Lesson> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }
    if let Some(lesson) = LESSONS.iter().find(|l| l.name.to_lowercase() == query) {
        return Some(lesson);
    }
    let mut matches = LESSONS
        .iter()
        .filter(|l| l.name.to_lowercase().starts_with(&query));
    match (matches.next(), matches.next()) {
        (Some(lesson), None) => Some(lesson),
        _ => None,
    }
}
