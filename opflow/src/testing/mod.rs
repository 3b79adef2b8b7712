//! Testing utilities for opflow chains.
//!
//! This module provides:
//! - A recording transport and a collecting result processor
//! - Assertions for settled chains
//! - A harness wiring both doubles to an operator service

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{
    assert_callback_error, assert_request_failed, assert_sequence_error, assert_settled,
    assert_settled_empty,
};
pub use fixtures::TestHarness;
pub use mocks::{CollectingProcessor, RecordingTransport};
