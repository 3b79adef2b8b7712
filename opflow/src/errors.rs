//! Error types for the opflow engine.
//!
//! Errors fall into four groups:
//!
//! - structural errors ([`SequenceError`], [`ChainError::ChainAlreadyExecuted`],
//!   [`ChainError::KindMismatch`]) raised synchronously when a chain is malformed;
//! - registration errors ([`InvalidOperatorError`]) raised while operator tables
//!   are being assembled;
//! - request errors ([`RequestError`]) produced by the transport, stored in the
//!   execution record and surfaced by a terminal operator;
//! - callback errors ([`ChainError::Callback`]) raised by caller-supplied
//!   closures and propagated untouched.

use crate::core::OperatorKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// The main error type for chain construction and execution.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The chain grammar was violated.
    #[error("{0}")]
    Sequence(#[from] SequenceError),

    /// The chain's terminal operator already ran.
    #[error("Chain already executed: no further operators can be appended")]
    ChainAlreadyExecuted,

    /// An operator was dispatched through the accessor of another kind.
    #[error("Operator '{name}' is a {actual} operator, expected a {expected} operator")]
    KindMismatch {
        /// The operator name.
        name: String,
        /// The kinds the accessor accepts.
        expected: &'static str,
        /// The kind the operator was registered with.
        actual: OperatorKind,
    },

    /// An operator could not be resolved or registered.
    #[error("{0}")]
    InvalidOperator(#[from] InvalidOperatorError),

    /// A request failed; rethrown verbatim by `unwrap`.
    #[error("{0}")]
    Request(#[from] RequestError),

    /// A caller-supplied callback failed.
    #[error("Callback failed: {0}")]
    Callback(anyhow::Error),

    /// An operator received an argument it cannot use.
    #[error("Invalid argument {index} for operator '{operator}': expected {expected}")]
    InvalidArgument {
        /// The operator name.
        operator: String,
        /// Position of the argument.
        index: usize,
        /// Description of what was expected.
        expected: &'static str,
    },
}

impl ChainError {
    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(operator: impl Into<String>, index: usize, expected: &'static str) -> Self {
        Self::InvalidArgument {
            operator: operator.into(),
            index,
            expected,
        }
    }

    /// Returns the request error, if this is one.
    #[must_use]
    pub fn as_request(&self) -> Option<&RequestError> {
        match self {
            Self::Request(err) => Some(err),
            _ => None,
        }
    }

    /// Returns true for chain grammar and dispatch errors.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Sequence(_) | Self::ChainAlreadyExecuted | Self::KindMismatch { .. }
        )
    }
}

/// Violations of the chain grammar, raised at append time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// A pipe or terminal operator was appended before any begin operator.
    #[error("Begin operator required first: '{operator}' was invoked before any begin operator")]
    MissingBegin {
        /// The offending operator.
        operator: String,
    },

    /// A second terminal operator was appended to the chain.
    #[error("Duplicate terminal operator '{operator}': only one terminal operator is allowed per chain")]
    DuplicateTerminal {
        /// The offending operator.
        operator: String,
    },

    /// A begin or pipe operator was appended after the terminal was bound.
    #[error("Operator '{operator}' appended after the terminal operator was bound")]
    AfterTerminal {
        /// The offending operator.
        operator: String,
    },

    /// The stack was run without a terminal operator.
    #[error("Terminal operator required to run the chain")]
    MissingTerminal,
}

/// Errors raised while registering or resolving operators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidOperatorError {
    /// No descriptor is registered under the name.
    #[error("Invalid operator '{name}': no operator has been registered under this name")]
    Unregistered {
        /// The operator name.
        name: String,
    },

    /// The operator was registered without a name.
    #[error("Invalid operator: operator names must not be empty")]
    EmptyName,

    /// The name is already taken within the same registry.
    #[error("Invalid operator '{name}': an operator with this name is already registered")]
    DuplicateName {
        /// The operator name.
        name: String,
    },

    /// A user operator collides with a built-in and collisions are rejected.
    #[error("Invalid operator '{name}': name collides with a built-in operator")]
    NameCollision {
        /// The operator name.
        name: String,
    },

    /// A user operator would replace a built-in with a different kind.
    #[error("Invalid operator '{name}': cannot replace a built-in {builtin} operator with a {custom} operator")]
    KindConflict {
        /// The operator name.
        name: String,
        /// The built-in's kind.
        builtin: OperatorKind,
        /// The user operator's kind.
        custom: OperatorKind,
    },
}

impl InvalidOperatorError {
    /// Creates an unregistered operator error.
    #[must_use]
    pub fn unregistered(name: impl Into<String>) -> Self {
        Self::Unregistered { name: name.into() }
    }
}

/// Classification of request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestErrorKind {
    /// The request never produced a response.
    Network,
    /// The server answered with a failure status.
    Status,
    /// The transport gave up waiting.
    Timeout,
    /// The response could not be decoded.
    Decode,
    /// Anything else.
    Other,
}

impl fmt::Display for RequestErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Status => write!(f, "status"),
            Self::Timeout => write!(f, "timeout"),
            Self::Decode => write!(f, "decode"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// A failure reported by the transport for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("Request failed ({kind}): {message}")]
pub struct RequestError {
    /// The failure class.
    pub kind: RequestErrorKind,
    /// Human readable description.
    pub message: String,
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    /// Response body, when a response was received.
    pub body: Option<serde_json::Value>,
}

impl RequestError {
    /// Creates a request error of the given kind.
    #[must_use]
    pub fn new(kind: RequestErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            body: None,
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(RequestErrorKind::Network, message)
    }

    /// Creates a status error.
    #[must_use]
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            ..Self::new(RequestErrorKind::Status, message)
        }
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(RequestErrorKind::Timeout, message)
    }

    /// Sets the response body.
    #[must_use]
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("kind".to_string(), serde_json::json!(self.kind));
        map.insert("message".to_string(), serde_json::json!(self.message));
        if let Some(status) = self.status {
            map.insert("status".to_string(), serde_json::json!(status));
        }
        if let Some(ref body) = self.body {
            map.insert("body".to_string(), body.clone());
        }
        map
    }
}
