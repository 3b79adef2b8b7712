//! Operator traits, registry and built-ins.
//!
//! An operator is one of three kinds:
//!
//! - a [`BeginOperator`] issues a request and opens a task;
//! - a [`PipeOperator`] transforms the chain value synchronously;
//! - a [`TerminalOperator`] finalizes the chain once every task has run.
//!
//! Implementations are registered in an [`OperatorRegistry`] under a unique
//! name; the registration entry point decides the kind.

pub mod builtin;
mod registry;

pub use registry::{Executable, OperatorConfig, OperatorDescriptor, OperatorRegistry};

use crate::core::{ExecutionRecord, OperatorArgs, RecordView};
use crate::errors::ChainError;
use crate::processor::ResultProcessor;
use crate::transport::Transport;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// What a begin operator sees when its request runs.
#[derive(Clone)]
pub struct BeginContext {
    /// The chain value at execution time.
    pub value: Option<Value>,
    /// The transport to issue the request through.
    pub transport: Arc<dyn Transport>,
}

/// What a terminal operator sees when the chain settles.
pub struct TerminalContext {
    /// The chain's record; the terminal may consume its error.
    pub record: ExecutionRecord,
    /// The host's result processor.
    pub processor: Arc<dyn ResultProcessor>,
}

/// Issues the request that starts a task.
#[async_trait]
pub trait BeginOperator: Send + Sync {
    /// Runs the request.
    ///
    /// A [`ChainError::Request`] is the request's own failure and is recorded
    /// on the chain. Any other error aborts the chain and reaches the caller.
    async fn exec(&self, ctx: BeginContext, args: &OperatorArgs) -> Result<Value, ChainError>;
}

/// Transforms the chain value.
pub trait PipeOperator: Send + Sync {
    /// Returns a replacement value, or `None` to keep the current one.
    fn exec(&self, view: RecordView<'_>, args: &OperatorArgs) -> Result<Option<Value>, ChainError>;
}

/// Finalizes a chain.
#[async_trait]
pub trait TerminalOperator: Send + Sync {
    /// Returns the settled result, or `None` to settle on the record's value.
    async fn exec(&self, ctx: &mut TerminalContext, args: &OperatorArgs) -> Result<Option<Value>, ChainError>;
}
