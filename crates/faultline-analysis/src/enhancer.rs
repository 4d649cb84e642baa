//! Post-classification enrichment seam.

use faultline_core::{ErrorMatch, ExtractedInfo};

/// Hook for enriching classifier output before reporting.
///
/// Implementations may reorder or annotate matches and add extracted
/// facts, but must not invent matches for categories the classifier did
/// not produce.
pub trait MatchEnhancer: Send + Sync {
    fn enhance(&self, text: &str, matches: &mut Vec<ErrorMatch>, info: &mut ExtractedInfo);
}

/// The default enhancer; leaves results untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEnhancer;

impl MatchEnhancer for NoopEnhancer {
    fn enhance(&self, _text: &str, _matches: &mut Vec<ErrorMatch>, _info: &mut ExtractedInfo) {}
}
