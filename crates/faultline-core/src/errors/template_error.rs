//! Template store and resolution errors.

use std::path::PathBuf;

use super::error_code::{codes, FaultlineErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template `{name}` not found")]
    NotFound { name: String },

    /// Recorded when a dependency cycle is broken during loading; resolution
    /// recovers by treating the template's dependencies as empty.
    #[error("dependency cycle involving template `{name}`")]
    Cycle { name: String },

    #[error("syntax error in template `{name}`: {message}")]
    Syntax { name: String, message: String },

    #[error("failed to parse template file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("IO error reading template {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl FaultlineErrorCode for TemplateError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => codes::TEMPLATE_NOT_FOUND,
            Self::Cycle { .. } => codes::TEMPLATE_CYCLE,
            Self::Syntax { .. } => codes::TEMPLATE_SYNTAX,
            Self::Parse { .. } => codes::TEMPLATE_PARSE,
            Self::Io { .. } => codes::TEMPLATE_IO,
        }
    }
}
