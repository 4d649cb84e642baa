//! Severity derivation.
//!
//! Severity starts from a category's confidence and adds fixed increments
//! for crisis/moderate keyword presence and critical-prone category
//! membership, then buckets the clipped score.

use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;

use faultline_core::{ErrorCategory, Severity};

const CRISIS_KEYWORDS: &[&str] = &[
    "fatal",
    "panic",
    "crash",
    "data loss",
    "corruption",
    "security breach",
    "out of memory",
    "heap overflow",
    "stack overflow",
    "segmentation fault",
];

const MODERATE_KEYWORDS: &[&str] = &[
    "error",
    "exception",
    "cannot",
    "unable",
    "failed to",
    "undefined",
    "null reference",
    "timeout",
    "connection refused",
];

const CRISIS_INCREMENT: f64 = 0.3;
const MODERATE_INCREMENT: f64 = 0.15;

static CRISIS: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(CRISIS_KEYWORDS)
        .expect("crisis keyword set is valid")
});

static MODERATE: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(MODERATE_KEYWORDS)
        .expect("moderate keyword set is valid")
});

/// Which keyword sets were observed in the input.
///
/// Kept as two booleans so the scanner can accumulate presence across
/// chunks without holding the whole input.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordPresence {
    pub crisis: bool,
    pub moderate: bool,
}

impl KeywordPresence {
    pub fn scan_text(text: &str) -> Self {
        Self {
            crisis: CRISIS.is_match(text),
            moderate: MODERATE.is_match(text),
        }
    }

    /// Accumulate presence from one more chunk of the input.
    pub fn observe(&mut self, text: &str) {
        if !self.crisis {
            self.crisis = CRISIS.is_match(text);
        }
        if !self.moderate {
            self.moderate = MODERATE.is_match(text);
        }
    }
}

/// Derive the bucketed severity for one category match.
pub fn severity_for(
    presence: KeywordPresence,
    category: ErrorCategory,
    confidence: f64,
) -> Severity {
    let mut score = confidence;
    if presence.crisis {
        score += CRISIS_INCREMENT;
    }
    if presence.moderate {
        score += MODERATE_INCREMENT;
    }
    score += category.severity_bump();
    Severity::from_score(score.min(1.0))
}
