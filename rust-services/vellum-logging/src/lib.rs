//! Structured logging setup for the Vellum record store
//!
//! Record operations log identifiers, versions and key ids as structured
//! fields; ciphertext, plaintext and canary tokens never reach the logs.

use std::str::FromStr;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event, for log shippers
    Json,
    /// Human-readable lines
    #[default]
    Console,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown log format '{0}', expected 'json' or 'console'")]
pub struct UnknownLogFormat(pub String);

impl FromStr for LogFormat {
    type Err = UnknownLogFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "console" | "" => Ok(Self::Console),
            other => Err(UnknownLogFormat(other.to_string())),
        }
    }
}

/// Build the level filter: `RUST_LOG` wins, then `default_level`
///
/// An unparsable `default_level` falls back to `info`.
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber for `service`
///
/// Returns `false` when a subscriber was already installed, in which case
/// nothing changes.
pub fn init_logging(service: &str, default_level: &str, format: LogFormat) -> bool {
    let registry = tracing_subscriber::registry().with(env_filter(default_level));
    let installed = match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(false)
                    .with_span_list(false),
            )
            .try_init(),
        LogFormat::Console => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init(),
    }
    .is_ok();

    if installed {
        tracing::info!(service = service, format = ?format, "Logging initialized");
    }
    installed
}
