//! Test assertions for settled chains.

use serde_json::Value;

use crate::errors::{ChainError, RequestErrorKind, SequenceError};

/// Asserts that the chain settled on the expected value.
pub fn assert_settled(result: &Result<Option<Value>, ChainError>, expected: &Value) {
    match result {
        Ok(settled) => assert_eq!(
            settled.as_ref(),
            Some(expected),
            "Expected chain to settle on {expected}, got {settled:?}"
        ),
        Err(err) => panic!("Expected chain to settle on {expected}, got error: {err}"),
    }
}

/// Asserts that the chain settled without a value.
pub fn assert_settled_empty(result: &Result<Option<Value>, ChainError>) {
    assert!(
        matches!(result, Ok(None)),
        "Expected chain to settle without a value, got {result:?}"
    );
}

/// Asserts that the chain failed with a request error of the given kind.
pub fn assert_request_failed(result: &Result<Option<Value>, ChainError>, kind: RequestErrorKind) {
    let actual = result.as_ref().err().and_then(ChainError::as_request).map(|e| e.kind);
    assert_eq!(
        actual,
        Some(kind),
        "Expected request failure of kind {kind}, got {result:?}"
    );
}

/// Asserts that the error is a chain grammar violation.
pub fn assert_sequence_error(err: &ChainError, expected: &SequenceError) {
    match err {
        ChainError::Sequence(actual) => assert_eq!(actual, expected),
        other => panic!("Expected sequence error {expected:?}, got {other:?}"),
    }
}

/// Asserts that the error came from a caller-supplied callback.
pub fn assert_callback_error(err: &ChainError) {
    assert!(
        matches!(err, ChainError::Callback(_)),
        "Expected callback error, got {err:?}"
    );
}
