//! Result processor trait and implementations.

use crate::errors::RequestError;
use tracing::{debug, error, info, trace, warn, Level};

/// Receives failure reports from the `report` terminal operator.
///
/// Processors are supplied by the host. They must not fail: `report`
/// guarantees the chain settles without raising, so whatever a processor
/// does with the message is its own business.
pub trait ResultProcessor: Send + Sync {
    /// Handles a report message and the request error that triggered it.
    fn process(&self, message: &str, error: Option<&RequestError>);
}

impl<F> ResultProcessor for F
where
    F: Fn(&str, Option<&RequestError>) + Send + Sync,
{
    fn process(&self, message: &str, error: Option<&RequestError>) {
        self(message, error);
    }
}

/// A processor that discards all reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProcessor;

impl ResultProcessor for NoOpProcessor {
    fn process(&self, _message: &str, _error: Option<&RequestError>) {}
}

/// A processor that logs reports using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingProcessor {
    level: Level,
}

impl Default for LoggingProcessor {
    fn default() -> Self {
        Self { level: Level::WARN }
    }
}

impl LoggingProcessor {
    /// Creates a logging processor with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates an error-level logging processor.
    #[must_use]
    pub fn error() -> Self {
        Self::new(Level::ERROR)
    }
}

impl ResultProcessor for LoggingProcessor {
    fn process(&self, message: &str, error: Option<&RequestError>) {
        let kind = error.map(|e| e.kind.to_string());
        let status = error.and_then(|e| e.status);
        let detail = error.map(|e| e.message.as_str());
        if self.level == Level::ERROR {
            error!(?kind, ?status, error = ?detail, "{}", message);
        } else if self.level == Level::WARN {
            warn!(?kind, ?status, error = ?detail, "{}", message);
        } else if self.level == Level::INFO {
            info!(?kind, ?status, error = ?detail, "{}", message);
        } else if self.level == Level::DEBUG {
            debug!(?kind, ?status, error = ?detail, "{}", message);
        } else {
            trace!(?kind, ?status, error = ?detail, "{}", message);
        }
    }
}
