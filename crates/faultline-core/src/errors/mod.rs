//! Error taxonomy for the engine.
//!
//! Each domain gets its own thiserror enum; every enum carries a stable
//! error-code string through [`FaultlineErrorCode`] so callers can match
//! on codes without parsing messages.

mod config_error;
mod error_code;
mod pattern_error;
mod render_error;
mod scan_error;
mod template_error;

pub use config_error::ConfigError;
pub use error_code::{codes, FaultlineErrorCode};
pub use pattern_error::PatternError;
pub use render_error::RenderError;
pub use scan_error::ScanError;
pub use template_error::TemplateError;
