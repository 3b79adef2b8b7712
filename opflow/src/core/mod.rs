//! Core domain model types for opflow.
//!
//! This module contains the fundamental types used throughout the engine:
//! - Operator kind and run condition enums
//! - The execution record threaded through a chain
//! - Call-time operator arguments

mod args;
mod kind;
mod record;

pub use args::{ComputeFn, ErrorHandlerFn, MessageFn, OperatorArg, OperatorArgs, TransformFn};
pub use kind::{OperatorKind, RunCondition};
pub use record::{ExecutionRecord, RecordView};
