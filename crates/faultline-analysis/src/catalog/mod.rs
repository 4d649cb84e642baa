//! Weighted pattern catalog.
//!
//! The catalog is immutable once constructed; a pattern that fails to
//! compile is fatal at construction since the builtin set is fixed at
//! build time. Users extend the catalog with data-only [`PatternSpec`]
//! entries, never with code.

mod builtin;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use smallvec::SmallVec;

use faultline_core::{ErrorCategory, PatternError};

/// Data-only description of a pattern, deserializable from user config.
#[derive(Debug, Clone, Deserialize)]
pub struct PatternSpec {
    pub pattern: String,
    pub category: ErrorCategory,
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Names for capture groups 1..=N. Empty means the pattern scores a
    /// single boolean hit instead of find-all semantics.
    #[serde(default)]
    pub capture_names: Vec<String>,
    /// When set, `.` also matches newlines.
    #[serde(default)]
    pub multiline: bool,
}

fn default_weight() -> f64 {
    1.0
}

/// A compiled pattern with its scoring metadata.
#[derive(Debug)]
pub struct ErrorPattern {
    regex: Regex,
    pub category: ErrorCategory,
    pub weight: f64,
    pub capture_names: Vec<String>,
    pub multiline: bool,
}

impl ErrorPattern {
    fn compile(spec: &PatternSpec) -> Result<Self, PatternError> {
        let regex = RegexBuilder::new(&spec.pattern)
            .case_insensitive(true)
            .multi_line(true)
            .dot_matches_new_line(spec.multiline)
            .build()
            .map_err(|e| PatternError::Compile {
                pattern: spec.pattern.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            regex,
            category: spec.category,
            weight: spec.weight,
            capture_names: spec.capture_names.clone(),
            multiline: spec.multiline,
        })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// One raw hit of one catalog pattern, with offsets relative to the
/// scanned input (absolute file offsets when produced by the scanner).
#[derive(Debug, Clone)]
pub struct RawHit {
    /// Index of the pattern in the catalog's declaration order.
    pub pattern: usize,
    pub start: usize,
    pub end: usize,
    pub text: String,
    /// (capture name, captured value) pairs, in declared order. Almost
    /// every pattern has two or fewer groups.
    pub captures: SmallVec<[(String, String); 2]>,
}

/// The immutable pattern set shared by classifier and scanner.
#[derive(Debug)]
pub struct PatternCatalog {
    patterns: Vec<ErrorPattern>,
}

impl PatternCatalog {
    /// Build the builtin catalog.
    pub fn builtin() -> Result<Self, PatternError> {
        Self::from_specs(&builtin::builtin_specs())
    }

    /// Build the builtin catalog extended with user-supplied specs.
    pub fn builtin_with(custom: &[PatternSpec]) -> Result<Self, PatternError> {
        let mut specs = builtin::builtin_specs();
        specs.extend(custom.iter().cloned());
        Self::from_specs(&specs)
    }

    pub fn from_specs(specs: &[PatternSpec]) -> Result<Self, PatternError> {
        let patterns = specs
            .iter()
            .map(ErrorPattern::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn patterns(&self) -> &[ErrorPattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Collect raw hits for every pattern over `text`.
    ///
    /// Patterns with capture names use find-all semantics: every
    /// non-overlapping match contributes one hit. Patterns without capture
    /// names contribute at most one hit (a boolean presence check).
    /// Offsets are shifted by `base` so scanner chunks report absolute
    /// positions.
    pub fn hits_in(&self, text: &str, base: usize, out: &mut Vec<RawHit>) {
        for (idx, pattern) in self.patterns.iter().enumerate() {
            if pattern.capture_names.is_empty() {
                if let Some(m) = pattern.regex.find(text) {
                    out.push(RawHit {
                        pattern: idx,
                        start: base + m.start(),
                        end: base + m.end(),
                        text: m.as_str().to_string(),
                        captures: SmallVec::new(),
                    });
                }
                continue;
            }

            for caps in pattern.regex.captures_iter(text) {
                // Group 0 is the whole match; named groups follow.
                let whole = match caps.get(0) {
                    Some(m) => m,
                    None => continue,
                };
                let captures = pattern
                    .capture_names
                    .iter()
                    .enumerate()
                    .filter_map(|(i, name)| {
                        caps.get(i + 1)
                            .map(|g| (name.clone(), g.as_str().to_string()))
                    })
                    .collect();
                out.push(RawHit {
                    pattern: idx,
                    start: base + whole.start(),
                    end: base + whole.end(),
                    text: whole.as_str().to_string(),
                    captures,
                });
            }
        }
    }
}
