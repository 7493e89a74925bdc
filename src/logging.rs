//! Process-wide `tracing` subscriber setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Installs a fmt subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (usually [`ServiceConfig::log_level`]) when unset.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
///
/// [`ServiceConfig::log_level`]: crate::config::ServiceConfig::log_level
pub fn init_logging(default_directive: &str) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_fails() {
        let _ = init_logging("info");
        assert!(init_logging("debug").is_err());
    }
}
