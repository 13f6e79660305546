//! Logging infrastructure.
//!
//! Structured logging via `tracing`, controlled by environment variables:
//!
//! - `GANTRY_DEBUG=true|1|yes` - enable debug logging
//! - `GANTRY_LOG_LEVEL=trace|debug|info|warn|error` - set a specific level
//!
//! Initialization installs a `tracing-subscriber` and requires the
//! `tracing-subscriber` feature; the check helpers work without it.
//!
//! Within the engine, the standard tracing macros are used:
//!
//! ```rust,ignore
//! use tracing::debug;
//!
//! debug!(relation = %name, parents = n, "resolving relation level");
//! ```

use std::env;
#[cfg(feature = "tracing-subscriber")]
use std::sync::Once;

#[cfg(feature = "tracing-subscriber")]
static INIT: Once = Once::new();

/// Check if debug logging is enabled via `GANTRY_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("GANTRY_DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// Get the configured log level from `GANTRY_LOG_LEVEL`.
///
/// Defaults to "debug" if `GANTRY_DEBUG` is enabled, otherwise "warn".
pub fn get_log_level() -> &'static str {
    if let Ok(level) = env::var("GANTRY_LOG_LEVEL") {
        match level.to_lowercase().as_str() {
            "trace" => return "trace",
            "debug" => return "debug",
            "info" => return "info",
            "warn" => return "warn",
            "error" => return "error",
            _ => {}
        }
    }
    if is_debug_enabled() {
        "debug"
    } else {
        "warn"
    }
}

/// Initialize logging from the environment. Safe to call more than once;
/// only the first call installs a subscriber.
#[cfg(feature = "tracing-subscriber")]
pub fn init() {
    init_with_level(get_log_level());
}

/// Initialize logging with an explicit level.
#[cfg(feature = "tracing-subscriber")]
pub fn init_with_level(level: &str) {
    let level = level.to_string();
    INIT.call_once(move || {
        use tracing_subscriber::{fmt, EnvFilter};
        let filter = EnvFilter::try_new(format!("gantry_query={}", level))
            .unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = fmt().with_env_filter(filter).try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_default() {
        // Neither variable is set in the test environment.
        if env::var("GANTRY_DEBUG").is_err() && env::var("GANTRY_LOG_LEVEL").is_err() {
            assert_eq!(get_log_level(), "warn");
            assert!(!is_debug_enabled());
        }
    }
}
