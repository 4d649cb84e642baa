//! Shared result and classification types.

mod category;
mod extracted;
mod language;
mod matches;

pub use category::{ErrorCategory, Severity};
pub use extracted::{
    dedup_preserving_order, EnvironmentInfo, ExtractedInfo, StackFrame, StackTrace,
};
pub use language::Language;
pub use matches::{ErrorMatch, MatchSpan};
