//! Structured facts pulled out of error text.

use std::collections::BTreeMap;
use std::hash::Hash;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::language::Language;

/// One frame of a parsed stack trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    pub file: String,
    pub line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    pub function: String,
    /// Source line quoted in the trace, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// A structured stack trace with the raw text it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackTrace {
    pub language: Language,
    pub frames: Vec<StackFrame>,
    pub raw: String,
}

/// Runtime/OS hints found in the text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python_version: Option<String>,
    pub env_variables: Vec<String>,
}

impl EnvironmentInfo {
    pub fn is_empty(&self) -> bool {
        self.os.is_none()
            && self.node_version.is_none()
            && self.python_version.is_none()
            && self.env_variables.is_empty()
    }
}

/// Aggregate of every structural fact extracted from one input.
///
/// All list fields are de-duplicated preserving first-seen order.
/// Capture groups that do not map onto a typed field land in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedInfo {
    pub files: Vec<String>,
    pub line_numbers: Vec<u32>,
    pub functions: Vec<String>,
    pub variables: Vec<String>,
    pub urls: Vec<String>,
    pub error_codes: Vec<String>,
    pub timestamps: Vec<String>,
    pub stack_traces: Vec<StackTrace>,
    pub environment: EnvironmentInfo,
    pub suggestions: Vec<String>,
    pub extra: BTreeMap<String, Vec<String>>,
}

impl ExtractedInfo {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
            && self.line_numbers.is_empty()
            && self.functions.is_empty()
            && self.variables.is_empty()
            && self.urls.is_empty()
            && self.error_codes.is_empty()
            && self.timestamps.is_empty()
            && self.stack_traces.is_empty()
            && self.environment.is_empty()
            && self.suggestions.is_empty()
            && self.extra.is_empty()
    }

    /// Fold a capture-name -> values mapping from a classifier match into
    /// the typed fields, routing unknown names into `extra`.
    pub fn absorb(&mut self, capture: &str, values: &[String]) {
        match capture {
            "file" => self.files.extend(values.iter().cloned()),
            "line" => self.line_numbers.extend(
                values
                    .iter()
                    .filter_map(|v| v.parse::<u32>().ok())
                    .filter(|n| *n >= 1 && *n <= crate::constants::MAX_LINE_NUMBER),
            ),
            "function" => self.functions.extend(values.iter().cloned()),
            "url" => self.urls.extend(values.iter().cloned()),
            "error_code" | "error_type" | "exception_type" | "sql_state" => {
                self.error_codes.extend(values.iter().cloned())
            }
            other => self
                .extra
                .entry(other.to_string())
                .or_default()
                .extend(values.iter().cloned()),
        }
    }

    /// Apply first-seen-order dedup to every list field.
    pub fn dedup(&mut self) {
        dedup_preserving_order(&mut self.files);
        dedup_preserving_order(&mut self.line_numbers);
        dedup_preserving_order(&mut self.functions);
        dedup_preserving_order(&mut self.variables);
        dedup_preserving_order(&mut self.urls);
        dedup_preserving_order(&mut self.error_codes);
        dedup_preserving_order(&mut self.timestamps);
        dedup_preserving_order(&mut self.suggestions);
        dedup_preserving_order(&mut self.environment.env_variables);
        for values in self.extra.values_mut() {
            dedup_preserving_order(values);
        }
    }
}

/// Remove duplicates in place, keeping the first occurrence of each value.
pub fn dedup_preserving_order<T: Eq + Hash + Clone>(values: &mut Vec<T>) {
    let mut seen = FxHashSet::default();
    values.retain(|v| seen.insert(v.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_preserving_order() {
        let mut v = vec!["b", "a", "b", "c", "a"];
        dedup_preserving_order(&mut v);
        assert_eq!(v, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_absorb_routes_known_captures() {
        let mut info = ExtractedInfo::default();
        info.absorb("file", &["x.py".to_string()]);
        info.absorb("line", &["12".to_string(), "999999".to_string()]);
        info.absorb("error_code", &["2322".to_string()]);
        info.absorb("message", &["boom".to_string()]);

        assert_eq!(info.files, vec!["x.py"]);
        // 999999 exceeds the sane line-number bound
        assert_eq!(info.line_numbers, vec![12]);
        assert_eq!(info.error_codes, vec!["2322"]);
        assert_eq!(info.extra["message"], vec!["boom"]);
    }

    #[test]
    fn test_default_is_empty() {
        assert!(ExtractedInfo::default().is_empty());
    }
}
