//! Subscriber installation for hosts without their own tracing setup.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TracingFormat {
    /// Human readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Installs a global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Returns false when a
/// global subscriber was already installed, which leaves that one in place.
pub fn init_tracing(default_filter: &str, format: TracingFormat) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match format {
        TracingFormat::Pretty => builder.try_init().is_ok(),
        TracingFormat::Json => builder.json().try_init().is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent() {
        let _ = init_tracing("opflow=debug", TracingFormat::Pretty);
        assert!(!init_tracing("opflow=debug", TracingFormat::Json));
    }

    #[test]
    fn test_format_deserializes_snake_case() {
        let format: TracingFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(format, TracingFormat::Json);
    }
}
