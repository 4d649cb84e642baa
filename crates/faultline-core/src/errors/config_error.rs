//! Configuration loading errors.

use std::path::PathBuf;

use super::error_code::{codes, FaultlineErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

impl FaultlineErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        codes::CONFIG_ERROR
    }
}
