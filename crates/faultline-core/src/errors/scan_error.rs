//! Scanner errors.
//!
//! Chunks that fail to decode are skipped with a warning count rather than
//! surfaced here; only I/O failures and cancellation abort a scan.

use std::path::PathBuf;

use super::error_code::{codes, FaultlineErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("IO error scanning {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Scan cancelled")]
    Cancelled,
}

impl FaultlineErrorCode for ScanError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Cancelled => codes::CANCELLED,
            Self::Io { .. } => codes::SCAN_ERROR,
        }
    }
}
