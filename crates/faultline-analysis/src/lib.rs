//! faultline-analysis: the detect half of the pipeline.
//!
//! - Catalog: immutable weighted regex patterns organized by category
//! - Classifier: multi-label scoring with normalized confidence, severity
//!   derivation, and a bounded result cache
//! - Extract: structural fact extraction independent of classification
//! - Scanner: chunked/parallel application of the catalog over large inputs
//! - Enhancer: optional post-classification refinement seam

pub mod catalog;
pub mod classify;
pub mod enhancer;
pub mod extract;
pub mod scanner;

pub use catalog::{ErrorPattern, PatternCatalog, PatternSpec};
pub use classify::Classifier;
pub use enhancer::{MatchEnhancer, NoopEnhancer};
pub use extract::{extract, extract_with_matches};
pub use scanner::{ScanCancellation, ScanOptions, ScanOutcome, Scanner};
