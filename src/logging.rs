//! Logging configuration for athena-fetch.
//!
//! The library only emits `tracing` events; embedding applications call one
//! of these to get them printed to stderr.

use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initializes stderr logging, filtered by `RUST_LOG` (default `info`).
///
/// Panics if a global subscriber is already installed.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt().with_env_filter(env_filter()).init();
}

/// Test variant of [`init_stderr_logging`]: output goes through the test
/// harness capture, and a second call returns false instead of panicking.
pub fn try_init_stderr_logging() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_test_writer()
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_init_is_idempotent() {
        try_init_stderr_logging();
        assert!(!try_init_stderr_logging());
    }
}
