//! Pattern catalog errors.

use super::error_code::{codes, FaultlineErrorCode};

/// Errors raised while building the pattern catalog.
///
/// The catalog is fixed at engine construction, so a compile failure is
/// fatal at startup rather than recovered.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("failed to compile pattern `{pattern}`: {message}")]
    Compile { pattern: String, message: String },
}

impl FaultlineErrorCode for PatternError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Compile { .. } => codes::PATTERN_COMPILE,
        }
    }
}
