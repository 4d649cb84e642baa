//! faultline-core: shared foundation for the Faultline engine.
//!
//! - Types: closed category/severity/language enums, match and extraction
//!   result structs shared by the classifier and the report layer
//! - Errors: per-domain error enums with stable error-code strings
//! - Config: engine configuration with serde defaults and TOML loading
//! - Tracing: `FAULTLINE_LOG`-driven subscriber setup
//! - Constants: default thresholds, sizes, and TTLs

pub mod config;
pub mod constants;
pub mod errors;
pub mod tracing;
pub mod types;

pub use config::EngineConfig;
pub use errors::{
    ConfigError, FaultlineErrorCode, PatternError, RenderError, ScanError, TemplateError,
};
pub use types::{
    dedup_preserving_order, EnvironmentInfo, ErrorCategory, ErrorMatch, ExtractedInfo, Language,
    MatchSpan, Severity, StackFrame, StackTrace,
};
