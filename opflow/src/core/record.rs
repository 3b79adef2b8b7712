//! The execution record threaded through one chain.

use crate::errors::RequestError;
use serde_json::Value;

/// The mutable `{value, error}` cell of a single chain.
///
/// A record is created with its chain and handed to the terminal step when
/// the chain settles. Only the exec stack mutates it: begin steps set the
/// value or the error, pipe steps may replace the value, and terminal steps
/// may consume the error.
#[derive(Debug, Default)]
pub struct ExecutionRecord {
    value: Option<Value>,
    error: Option<RequestError>,
}

impl ExecutionRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current value.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Returns the recorded request error.
    #[must_use]
    pub fn error(&self) -> Option<&RequestError> {
        self.error.as_ref()
    }

    /// Returns true if a request error is recorded.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Returns a read-only view for pipe steps.
    #[must_use]
    pub fn view(&self) -> RecordView<'_> {
        RecordView {
            value: self.value.as_ref(),
            error: self.error.as_ref(),
        }
    }

    /// Consumes the recorded error.
    pub fn take_error(&mut self) -> Option<RequestError> {
        self.error.take()
    }

    /// Consumes the record, returning its value.
    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        self.value
    }

    /// Stores a begin step's result.
    pub(crate) fn set_value(&mut self, value: Value) {
        self.value = Some(value);
    }

    /// Stores a begin step's failure. The value is left untouched.
    pub(crate) fn set_error(&mut self, error: RequestError) {
        self.error = Some(error);
    }

    /// Applies a step's return: `Some` replaces the value, `None` keeps it.
    ///
    /// Falsy payloads (`0`, `""`, `false`, `null`) are replacements.
    pub(crate) fn apply(&mut self, replacement: Option<Value>) -> bool {
        match replacement {
            Some(value) => {
                self.value = Some(value);
                true
            }
            None => false,
        }
    }
}

/// A borrowed `{value, error}` view handed to pipe operators.
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    /// The current value.
    pub value: Option<&'a Value>,
    /// The recorded request error.
    pub error: Option<&'a RequestError>,
}

impl RecordView<'_> {
    /// Returns true if a request error is recorded.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}
