//! Multi-label classifier.

pub mod severity;

use std::collections::BTreeMap;
use std::sync::Arc;

use moka::sync::Cache;
use rustc_hash::FxHashMap;
use tracing::debug;
use xxhash_rust::xxh3::Xxh3;

use faultline_core::{ErrorCategory, ErrorMatch, MatchSpan};

use crate::catalog::{PatternCatalog, RawHit};
use severity::KeywordPresence;

/// Scores raw hits into ordered [`ErrorMatch`] results.
///
/// Shared by `Classifier::classify` and the scanner so that a chunked scan
/// aggregates to exactly the same result as whole-input classification.
pub(crate) fn aggregate(
    catalog: &PatternCatalog,
    presence: KeywordPresence,
    hits: &[RawHit],
    threshold: f64,
) -> Vec<ErrorMatch> {
    struct Accum {
        score: f64,
        spans: Vec<MatchSpan>,
        extracted: BTreeMap<String, Vec<String>>,
    }

    let mut accums: FxHashMap<ErrorCategory, Accum> = FxHashMap::default();
    // Categories in first-contribution order, for stable tie-breaking.
    let mut order: Vec<ErrorCategory> = Vec::new();

    for hit in hits {
        let pattern = &catalog.patterns()[hit.pattern];
        let accum = accums.entry(pattern.category).or_insert_with(|| {
            order.push(pattern.category);
            Accum {
                score: 0.0,
                spans: Vec::new(),
                extracted: BTreeMap::new(),
            }
        });
        accum.score += pattern.weight;
        accum.spans.push(MatchSpan {
            start: hit.start,
            end: hit.end,
            text: hit.text.clone(),
        });
        for (name, value) in &hit.captures {
            accum
                .extracted
                .entry(name.clone())
                .or_default()
                .push(value.clone());
        }
    }

    let total: f64 = accums.values().map(|a| a.score).sum();
    if total <= 0.0 {
        return Vec::new();
    }

    let mut results: Vec<ErrorMatch> = order
        .into_iter()
        .filter_map(|category| {
            let accum = accums.remove(&category)?;
            let confidence = accum.score / total;
            if confidence < threshold {
                return None;
            }
            Some(ErrorMatch {
                category,
                confidence,
                spans: accum.spans,
                extracted: accum.extracted,
                severity: severity::severity_for(presence, category, confidence),
            })
        })
        .collect();

    // Stable sort: ties keep first-contribution order.
    results.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    results
}

/// The multi-label classifier.
///
/// Pure with respect to its input; repeated calls on identical
/// `(text, threshold)` pairs are served from a bounded result cache keyed
/// by an xxh3 hash.
pub struct Classifier {
    catalog: Arc<PatternCatalog>,
    cache: Cache<u64, Arc<Vec<ErrorMatch>>>,
}

impl Classifier {
    pub fn new(catalog: Arc<PatternCatalog>, cache_capacity: u64) -> Self {
        Self {
            catalog,
            cache: Cache::new(cache_capacity),
        }
    }

    pub fn catalog(&self) -> &Arc<PatternCatalog> {
        &self.catalog
    }

    /// Classify `text` into ordered category matches, highest confidence
    /// first; ties keep catalog declaration order.
    ///
    /// Confidence is each category's accumulated weighted score divided by
    /// the total across all categories. When many unrelated categories fire
    /// on noisy input this can understate single-category certainty; the
    /// normalization is kept as-is for reproducibility rather than
    /// intuitive calibration.
    ///
    /// Empty or whitespace-only input yields an empty list.
    pub fn classify(&self, text: &str, threshold: f64) -> Vec<ErrorMatch> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let key = cache_key(text, threshold);
        if let Some(cached) = self.cache.get(&key) {
            return (*cached).clone();
        }

        let mut hits = Vec::new();
        self.catalog.hits_in(text, 0, &mut hits);
        let presence = KeywordPresence::scan_text(text);
        let results = aggregate(&self.catalog, presence, &hits, threshold);

        debug!(
            categories = results.len(),
            raw_hits = hits.len(),
            "classified input"
        );

        self.cache.insert(key, Arc::new(results.clone()));
        results
    }
}

fn cache_key(text: &str, threshold: f64) -> u64 {
    let mut hasher = Xxh3::new();
    hasher.update(text.as_bytes());
    hasher.update(&threshold.to_bits().to_le_bytes());
    hasher.digest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultline_core::Severity;

    fn classifier() -> Classifier {
        Classifier::new(Arc::new(PatternCatalog::builtin().unwrap()), 16)
    }

    #[test]
    fn test_empty_input_returns_empty() {
        let c = classifier();
        assert!(c.classify("", 0.1).is_empty());
        assert!(c.classify("   \n\t  ", 0.1).is_empty());
    }

    #[test]
    fn test_typescript_error_code() {
        let c = classifier();
        let matches = c.classify(
            "TS2322: Type 'string' is not assignable to type 'number'.",
            0.1,
        );
        assert!(!matches.is_empty());
        let top = &matches[0];
        assert_eq!(top.category, ErrorCategory::TypeScript);
        assert_eq!(top.extracted["error_code"], vec!["2322"]);
        assert!(top.severity >= Severity::High);
    }

    #[test]
    fn test_confidences_normalized() {
        let c = classifier();
        let text = "TS2322: bad types\nTypeError: x is not a function\nECONNREFUSED";
        let matches = c.classify(text, 0.0);
        assert!(matches.len() >= 2);
        let sum: f64 = matches.iter().map(|m| m.confidence).sum();
        assert!((sum - 1.0).abs() < 1e-9, "confidences sum to {sum}");
        for m in &matches {
            assert!(m.confidence >= 0.0 && m.confidence <= 1.0);
        }
        // Highest confidence first
        for pair in matches.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
    }

    #[test]
    fn test_threshold_filters_categories() {
        let c = classifier();
        let text = "TS2322: bad types\nTS2339: missing prop\nfetch failed";
        let all = c.classify(text, 0.0);
        let filtered = c.classify(text, 0.5);
        assert!(filtered.len() < all.len());
        for m in &filtered {
            assert!(m.confidence >= 0.5);
        }
    }

    #[test]
    fn test_repeated_calls_hit_cache() {
        let c = classifier();
        let text = "ReferenceError: foo is not defined";
        let first = c.classify(text, 0.3);
        let second = c.classify(text, 0.3);
        assert_eq!(first.len(), second.len());
        assert_eq!(first[0].category, second[0].category);
        assert_eq!(first[0].confidence, second[0].confidence);
    }

    #[test]
    fn test_python_traceback_classified() {
        let c = classifier();
        let text = "Traceback (most recent call last):\n  File \"app.py\", line 3, in main\n    run()\nValueError: bad input";
        let matches = c.classify(text, 0.1);
        assert_eq!(matches[0].category, ErrorCategory::Python);
        assert!(matches[0].extracted["file"].contains(&"app.py".to_string()));
    }
}
