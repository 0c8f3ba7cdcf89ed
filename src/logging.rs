//! tracing subscriber setup

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer};

/// Environment variable consulted when `RUST_LOG` is unset
pub const LOG_ENV: &str = "RSAPPLYZER_LOG";

/// Filter directive: `RUST_LOG`, then `RSAPPLYZER_LOG`, then the crate default
pub fn log_directive(verbose: bool) -> String {
    std::env::var("RUST_LOG")
        .or_else(|_| std::env::var(LOG_ENV))
        .unwrap_or_else(|_| default_directive(verbose))
}

fn default_directive(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "warn" };
    format!("{}={}", env!("CARGO_CRATE_NAME"), level)
}

/// Log to stderr so stdout stays reserved for scan output
pub fn initialize_logging(verbose: bool) -> Result<(), TryInitError> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(false)
        .with_filter(EnvFilter::new(log_directive(verbose)));

    tracing_subscriber::registry().with(stderr_layer).try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false), "rsapplyzer=warn");
        assert_eq!(default_directive(true), "rsapplyzer=debug");
    }
}
