//! Classification result types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::category::{ErrorCategory, Severity};

/// One raw regex hit inside the classified text.
///
/// `start`/`end` are byte offsets into the input (absolute file offsets
/// when produced by the scanner).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// A matched category with normalized confidence and extracted facts.
///
/// Produced fresh per classification call and never mutated afterwards.
/// `confidence` is the category's accumulated weighted score divided by
/// the total score across all categories for the same input, so values
/// for one input sum to 1.0 across disjoint categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMatch {
    pub category: ErrorCategory,
    pub confidence: f64,
    pub spans: Vec<MatchSpan>,
    /// Capture-name -> captured strings, in first-seen order per name.
    pub extracted: BTreeMap<String, Vec<String>>,
    pub severity: Severity,
}

impl ErrorMatch {
    /// First captured value for a capture name, if any.
    pub fn first(&self, capture: &str) -> Option<&str> {
        self.extracted
            .get(capture)
            .and_then(|v| v.first())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_capture() {
        let mut extracted = BTreeMap::new();
        extracted.insert("error_code".to_string(), vec!["2322".to_string()]);
        let m = ErrorMatch {
            category: ErrorCategory::TypeScript,
            confidence: 1.0,
            spans: Vec::new(),
            extracted,
            severity: Severity::High,
        };
        assert_eq!(m.first("error_code"), Some("2322"));
        assert_eq!(m.first("missing"), None);
    }
}
