//! Timing and outcome logging for one chain run.

use crate::errors::ChainError;
use std::time::Instant;
use tracing::{info, info_span, warn, Span};
use uuid::Uuid;

/// Times a chain from its terminal call until it settles.
///
/// The timer owns the `chain` span; [`ChainTimer::finish`] logs the outcome
/// inside it.
#[derive(Debug)]
pub struct ChainTimer {
    span: Span,
    terminal: String,
    start: Instant,
}

impl ChainTimer {
    /// Opens the chain span and starts the clock.
    #[must_use]
    pub fn start(chain_id: Uuid, terminal: impl Into<String>) -> Self {
        let terminal = terminal.into();
        Self {
            span: info_span!("chain", chain_id = %chain_id, terminal = %terminal),
            terminal,
            start: Instant::now(),
        }
    }

    /// The span the chain runs in.
    #[must_use]
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Name of the terminal operator that triggered the run.
    #[must_use]
    pub fn terminal(&self) -> &str {
        &self.terminal
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Logs how the chain settled and returns the duration in milliseconds.
    pub fn finish<T>(self, outcome: &Result<T, ChainError>) -> f64 {
        let duration_ms = self.elapsed_ms();
        let terminal = self.terminal.as_str();
        self.span.in_scope(|| match outcome {
            Ok(_) => info!(terminal, duration_ms, "Chain settled"),
            Err(error) => warn!(terminal, duration_ms, error = %error, "Chain failed"),
        });
        duration_ms
    }
}
