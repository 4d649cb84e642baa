//! Rendering errors surfaced to callers.

use super::error_code::{codes, FaultlineErrorCode};
use super::template_error::TemplateError;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("failed to render template `{name}`: {message}")]
    Render { name: String, message: String },
}

impl FaultlineErrorCode for RenderError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Template(inner) => inner.error_code(),
            Self::Render { .. } => codes::RENDER_ERROR,
        }
    }
}
