//! Per-chain operator dispatch.

use super::stack::{ExecStack, PendingStep};
use crate::core::{ExecutionRecord, OperatorArg, OperatorArgs, OperatorKind, RecordView};
use crate::errors::{ChainError, RequestError};
use crate::observability::ChainTimer;
use crate::operators::builtin::names;
use crate::operators::{BeginContext, Executable, OperatorRegistry, TerminalContext};
use crate::processor::ResultProcessor;
use crate::transport::{RequestOptions, Transport};
use futures::FutureExt;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// The operator surface of one chain.
///
/// Begin and pipe operators are appended with [`OperatorSet::call`] or the
/// typed wrappers and return the set for further chaining. Awaiting a
/// terminal operator runs the whole chain and yields its settled result.
/// A set is single-use: once its terminal has run, every append fails with
/// [`ChainError::ChainAlreadyExecuted`].
pub struct OperatorSet {
    chain_id: Uuid,
    operators: Arc<OperatorRegistry>,
    transport: Arc<dyn Transport>,
    processor: Arc<dyn ResultProcessor>,
    stack: ExecStack,
    executed: bool,
}

impl OperatorSet {
    /// Creates a fresh chain over the operator table.
    #[must_use]
    pub fn new(
        operators: Arc<OperatorRegistry>,
        transport: Arc<dyn Transport>,
        processor: Arc<dyn ResultProcessor>,
    ) -> Self {
        Self {
            chain_id: Uuid::new_v4(),
            operators,
            transport,
            processor,
            stack: ExecStack::new(),
            executed: false,
        }
    }

    /// Returns the chain id carried on its tracing span.
    #[must_use]
    pub fn chain_id(&self) -> Uuid {
        self.chain_id
    }

    /// Returns true once the terminal operator has run.
    #[must_use]
    pub fn is_executed(&self) -> bool {
        self.executed
    }

    /// Lists the names this set dispatches, in registration order.
    #[must_use]
    pub fn operator_names(&self) -> Vec<&str> {
        self.operators.names()
    }

    /// Returns the number of tasks appended so far.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.stack.task_count()
    }

    fn ensure_open(&self) -> Result<(), ChainError> {
        if self.executed {
            return Err(ChainError::ChainAlreadyExecuted);
        }
        Ok(())
    }

    /// Appends a begin or pipe operator by name.
    pub fn call(&mut self, name: &str, args: Vec<OperatorArg>) -> Result<&mut Self, ChainError> {
        self.ensure_open()?;
        let descriptor = self.operators.lookup(name)?;
        let run_condition = descriptor.run_condition().unwrap_or_default();
        let args = OperatorArgs::new(name, args);

        let step = match descriptor.executable() {
            Executable::Begin(operator) => {
                let operator = Arc::clone(operator);
                let transport = Arc::clone(&self.transport);
                PendingStep::begin(
                    name,
                    run_condition,
                    Box::new(move |value: Option<Value>| {
                        async move { operator.exec(BeginContext { value, transport }, &args).await }.boxed()
                    }),
                )
            }
            Executable::Pipe(operator) => {
                let operator = Arc::clone(operator);
                PendingStep::pipe(
                    name,
                    run_condition,
                    Box::new(move |view: RecordView<'_>| operator.exec(view, &args)),
                )
            }
            Executable::Terminal(_) => {
                return Err(ChainError::KindMismatch {
                    name: name.to_string(),
                    expected: "begin or pipe",
                    actual: OperatorKind::Terminal,
                });
            }
        };

        self.stack.append(step)?;
        Ok(self)
    }

    /// Appends a terminal operator by name and runs the chain.
    pub async fn finish(&mut self, name: &str, args: Vec<OperatorArg>) -> Result<Option<Value>, ChainError> {
        self.ensure_open()?;
        let descriptor = self.operators.lookup(name)?;
        let Executable::Terminal(operator) = descriptor.executable() else {
            return Err(ChainError::KindMismatch {
                name: name.to_string(),
                expected: "terminal",
                actual: descriptor.kind(),
            });
        };

        let operator = Arc::clone(operator);
        let processor = Arc::clone(&self.processor);
        let args = OperatorArgs::new(name, args);
        self.stack.append(PendingStep::terminal(
            name,
            Box::new(move |record: ExecutionRecord| {
                async move {
                    let mut ctx = TerminalContext { record, processor };
                    let settled = operator.exec(&mut ctx, &args).await?;
                    Ok::<_, ChainError>(settled.or_else(|| ctx.record.into_value()))
                }
                .boxed()
            }),
        ))?;

        let timer = ChainTimer::start(self.chain_id, name);
        let outcome = self.stack.run().instrument(timer.span().clone()).await;
        self.executed = true;
        timer.finish(&outcome);
        outcome
    }

    /// Appends a GET request.
    pub fn get(&mut self, url: impl Into<OperatorArg>) -> Result<&mut Self, ChainError> {
        self.call(names::GET, vec![url.into()])
    }

    /// Appends a GET request with query params and options.
    pub fn get_with(
        &mut self,
        url: impl Into<OperatorArg>,
        params: impl Into<OperatorArg>,
        options: RequestOptions,
    ) -> Result<&mut Self, ChainError> {
        self.call(names::GET, vec![url.into(), params.into(), options.into()])
    }

    /// Appends a POST request.
    pub fn post(&mut self, url: impl Into<OperatorArg>) -> Result<&mut Self, ChainError> {
        self.call(names::POST, vec![url.into()])
    }

    /// Appends a POST request with a body and options.
    pub fn post_with(
        &mut self,
        url: impl Into<OperatorArg>,
        body: impl Into<OperatorArg>,
        options: RequestOptions,
    ) -> Result<&mut Self, ChainError> {
        self.call(names::POST, vec![url.into(), body.into(), options.into()])
    }

    /// Appends a PUT request.
    pub fn put(&mut self, url: impl Into<OperatorArg>) -> Result<&mut Self, ChainError> {
        self.call(names::PUT, vec![url.into()])
    }

    /// Appends a PUT request with a body and options.
    pub fn put_with(
        &mut self,
        url: impl Into<OperatorArg>,
        body: impl Into<OperatorArg>,
        options: RequestOptions,
    ) -> Result<&mut Self, ChainError> {
        self.call(names::PUT, vec![url.into(), body.into(), options.into()])
    }

    /// Appends a DELETE request.
    pub fn delete(&mut self, url: impl Into<OperatorArg>) -> Result<&mut Self, ChainError> {
        self.call(names::DELETE, vec![url.into()])
    }

    /// Appends a DELETE request with a body and options.
    pub fn delete_with(
        &mut self,
        url: impl Into<OperatorArg>,
        body: impl Into<OperatorArg>,
        options: RequestOptions,
    ) -> Result<&mut Self, ChainError> {
        self.call(names::DELETE, vec![url.into(), body.into(), options.into()])
    }

    /// Appends a transform of the chain value; returning `None` keeps it.
    pub fn pipe<F>(&mut self, transform: F) -> Result<&mut Self, ChainError>
    where
        F: Fn(Option<&Value>) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
    {
        self.call(names::PIPE, vec![OperatorArg::transform(transform)])
    }

    /// Runs the chain, reporting a failure through the result processor.
    ///
    /// Never fails because of a request error: the error is consumed and the
    /// chain settles on its last value.
    pub async fn report<F>(&mut self, message: F) -> Result<Option<Value>, ChainError>
    where
        F: Fn(Option<&Value>) -> String + Send + Sync + 'static,
    {
        self.finish(names::REPORT, vec![OperatorArg::message(message)]).await
    }

    /// Runs the chain, returning the value or the request error verbatim.
    pub async fn unwrap(&mut self) -> Result<Option<Value>, ChainError> {
        self.finish(names::UNWRAP, Vec::new()).await
    }

    /// Runs the chain, settling on whichever callback matches the outcome.
    pub async fn match_with<S, E>(&mut self, on_success: S, on_error: E) -> Result<Option<Value>, ChainError>
    where
        S: Fn(Option<&Value>) -> anyhow::Result<Value> + Send + Sync + 'static,
        E: Fn(&RequestError) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.finish(
            names::MATCH,
            vec![OperatorArg::compute(on_success), OperatorArg::on_error(on_error)],
        )
        .await
    }
}

impl fmt::Debug for OperatorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorSet")
            .field("chain_id", &self.chain_id)
            .field("operators", &self.operators.names())
            .field("stack", &self.stack)
            .field("executed", &self.executed)
            .finish()
    }
}
