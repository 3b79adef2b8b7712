//! Operator kind and run condition enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The role an operator plays in a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorKind {
    /// Issues a request and opens a task (e.g., get, post).
    Begin,
    /// Transforms the chain value synchronously (e.g., pipe).
    Pipe,
    /// Finalizes the chain and triggers execution (e.g., unwrap, match).
    Terminal,
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Begin => write!(f, "begin"),
            Self::Pipe => write!(f, "pipe"),
            Self::Terminal => write!(f, "terminal"),
        }
    }
}

/// When a begin or pipe step runs, relative to the chain's error state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunCondition {
    /// Runs whether or not an error is recorded.
    Always,
    /// Skipped once an error is recorded.
    OnlyIfNoError,
    /// Runs only when an error is recorded.
    OnlyIfError,
}

impl Default for RunCondition {
    fn default() -> Self {
        Self::Always
    }
}

impl RunCondition {
    /// Returns true if a step with this condition runs given the error state.
    #[must_use]
    pub fn permits(self, has_error: bool) -> bool {
        match self {
            Self::Always => true,
            Self::OnlyIfNoError => !has_error,
            Self::OnlyIfError => has_error,
        }
    }
}

impl fmt::Display for RunCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => write!(f, "always"),
            Self::OnlyIfNoError => write!(f, "only_if_no_error"),
            Self::OnlyIfError => write!(f, "only_if_error"),
        }
    }
}
