//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Initialize the Faultline tracing/logging system.
///
/// Reads the `FAULTLINE_LOG` environment variable for per-subsystem log
/// levels, e.g. `FAULTLINE_LOG=faultline_analysis=debug,faultline_report=info`.
/// Falls back to `faultline=info` when unset or invalid.
///
/// Idempotent; calling it multiple times is safe.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("FAULTLINE_LOG")
            .unwrap_or_else(|_| EnvFilter::new("faultline=info"));

        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true))
            .with(filter)
            .init();
    });
}
