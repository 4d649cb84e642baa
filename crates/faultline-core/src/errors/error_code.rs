//! FaultlineErrorCode trait and code constants.

/// Trait giving every error enum a stable, machine-matchable code string.
pub trait FaultlineErrorCode {
    /// Returns the error code string (e.g., "TEMPLATE_NOT_FOUND").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

/// Error code constants.
pub mod codes {
    pub const PATTERN_COMPILE: &str = "PATTERN_COMPILE";
    pub const SCAN_ERROR: &str = "SCAN_ERROR";
    pub const CANCELLED: &str = "CANCELLED";
    pub const TEMPLATE_NOT_FOUND: &str = "TEMPLATE_NOT_FOUND";
    pub const TEMPLATE_CYCLE: &str = "TEMPLATE_CYCLE";
    pub const TEMPLATE_SYNTAX: &str = "TEMPLATE_SYNTAX";
    pub const TEMPLATE_PARSE: &str = "TEMPLATE_PARSE";
    pub const TEMPLATE_IO: &str = "TEMPLATE_IO";
    pub const RENDER_ERROR: &str = "RENDER_ERROR";
    pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
}
