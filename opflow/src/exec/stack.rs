//! Task builder and runner for one chain.
//!
//! Appended steps are grouped into tasks: each begin step opens a task and
//! the pipe steps that follow belong to it. Nothing runs until the terminal
//! step is bound and [`ExecStack::run`] is awaited.

use crate::core::{ExecutionRecord, OperatorKind, RecordView, RunCondition};
use crate::errors::{ChainError, SequenceError};
use futures::future::BoxFuture;
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

/// Issues a task's request, given the chain value at execution time.
pub type BeginThunk = Box<dyn FnOnce(Option<Value>) -> BoxFuture<'static, Result<Value, ChainError>> + Send>;

/// Runs a pipe step against the record.
pub type PipeThunk = Box<dyn FnOnce(RecordView<'_>) -> Result<Option<Value>, ChainError> + Send>;

/// Settles the chain, given the final record.
pub type TerminalThunk =
    Box<dyn FnOnce(ExecutionRecord) -> BoxFuture<'static, Result<Option<Value>, ChainError>> + Send>;

/// The deferred work of a pending step.
pub enum StepAction {
    /// A request.
    Begin(BeginThunk),
    /// A transform.
    Pipe(PipeThunk),
    /// The chain's finalizer.
    Terminal(TerminalThunk),
}

/// An operator call with its arguments bound, waiting to run.
pub struct PendingStep {
    operator: String,
    run_condition: RunCondition,
    action: StepAction,
}

impl PendingStep {
    /// Creates a begin step.
    pub fn begin(operator: impl Into<String>, run_condition: RunCondition, thunk: BeginThunk) -> Self {
        Self {
            operator: operator.into(),
            run_condition,
            action: StepAction::Begin(thunk),
        }
    }

    /// Creates a pipe step.
    pub fn pipe(operator: impl Into<String>, run_condition: RunCondition, thunk: PipeThunk) -> Self {
        Self {
            operator: operator.into(),
            run_condition,
            action: StepAction::Pipe(thunk),
        }
    }

    /// Creates a terminal step.
    pub fn terminal(operator: impl Into<String>, thunk: TerminalThunk) -> Self {
        Self {
            operator: operator.into(),
            run_condition: RunCondition::Always,
            action: StepAction::Terminal(thunk),
        }
    }

    /// Returns the operator name.
    #[must_use]
    pub fn operator(&self) -> &str {
        &self.operator
    }

    /// Returns the step kind.
    #[must_use]
    pub fn kind(&self) -> OperatorKind {
        match self.action {
            StepAction::Begin(_) => OperatorKind::Begin,
            StepAction::Pipe(_) => OperatorKind::Pipe,
            StepAction::Terminal(_) => OperatorKind::Terminal,
        }
    }
}

impl fmt::Debug for PendingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingStep")
            .field("operator", &self.operator)
            .field("kind", &self.kind())
            .field("run_condition", &self.run_condition)
            .finish()
    }
}

struct PipeStep {
    operator: String,
    run_condition: RunCondition,
    thunk: PipeThunk,
}

/// One request/transform cycle: a begin step and its pipe steps.
struct Task {
    operator: String,
    run_condition: RunCondition,
    request: BeginThunk,
    steps: Vec<PipeStep>,
}

struct TerminalStep {
    operator: String,
    thunk: TerminalThunk,
}

/// Accumulates a chain's steps and runs them in append order.
#[derive(Default)]
pub struct ExecStack {
    /// Closed tasks.
    tasks: Vec<Task>,
    /// The task receiving pipe steps.
    open_task: Option<Task>,
    /// The bound terminal, until the stack runs.
    terminal: Option<TerminalStep>,
    /// Stays set once a terminal has been appended.
    terminal_bound: bool,
    /// The chain's record.
    record: ExecutionRecord,
}

impl ExecStack {
    /// Creates an empty stack with a fresh record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step, enforcing the chain grammar.
    pub fn append(&mut self, step: PendingStep) -> Result<(), SequenceError> {
        let PendingStep {
            operator,
            run_condition,
            action,
        } = step;

        match action {
            StepAction::Begin(request) => {
                if self.terminal_bound {
                    return Err(SequenceError::AfterTerminal { operator });
                }
                // A second begin closes the current task: sequential requests.
                if let Some(task) = self.open_task.take() {
                    self.tasks.push(task);
                }
                self.open_task = Some(Task {
                    operator,
                    run_condition,
                    request,
                    steps: Vec::new(),
                });
            }
            StepAction::Pipe(thunk) => {
                if self.terminal_bound {
                    return Err(SequenceError::AfterTerminal { operator });
                }
                let Some(task) = self.open_task.as_mut() else {
                    return Err(SequenceError::MissingBegin { operator });
                };
                task.steps.push(PipeStep {
                    operator,
                    run_condition,
                    thunk,
                });
            }
            StepAction::Terminal(thunk) => {
                if self.terminal_bound {
                    return Err(SequenceError::DuplicateTerminal { operator });
                }
                if self.open_task.is_none() && self.tasks.is_empty() {
                    return Err(SequenceError::MissingBegin { operator });
                }
                self.terminal = Some(TerminalStep { operator, thunk });
                self.terminal_bound = true;
            }
        }

        Ok(())
    }

    /// Returns the number of tasks, counting the open one.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.tasks.len() + usize::from(self.open_task.is_some())
    }

    /// Returns true once a terminal step has been appended.
    #[must_use]
    pub fn is_terminal_bound(&self) -> bool {
        self.terminal_bound
    }

    /// Returns the chain's record.
    #[must_use]
    pub fn record(&self) -> &ExecutionRecord {
        &self.record
    }

    /// Runs every task in append order, then the terminal step.
    ///
    /// Once a request fails, the remaining tasks are skipped and the terminal
    /// observes that failure. Errors other than request failures abort the
    /// run immediately.
    pub async fn run(&mut self) -> Result<Option<Value>, ChainError> {
        let Some(terminal) = self.terminal.take() else {
            return Err(SequenceError::MissingTerminal.into());
        };

        if let Some(task) = self.open_task.take() {
            self.tasks.push(task);
        }
        let tasks = std::mem::take(&mut self.tasks);
        let total = tasks.len();

        for (index, task) in tasks.into_iter().enumerate() {
            if self.record.has_error() {
                debug!(skipped = total - index, "Prior request failed, skipping remaining tasks");
                break;
            }
            self.run_task(index, task).await?;
        }

        let record = std::mem::take(&mut self.record);
        debug!(
            operator = %terminal.operator,
            has_error = record.has_error(),
            "Running terminal operator"
        );
        (terminal.thunk)(record).await
    }

    async fn run_task(&mut self, index: usize, task: Task) -> Result<(), ChainError> {
        let Task {
            operator,
            run_condition,
            request,
            steps,
        } = task;

        if run_condition.permits(self.record.has_error()) {
            debug!(task = index, operator = %operator, "Running request");
            match request(self.record.value().cloned()).await {
                Ok(value) => self.record.set_value(value),
                Err(ChainError::Request(error)) => {
                    warn!(task = index, operator = %operator, error = %error, "Request failed");
                    self.record.set_error(error);
                }
                Err(other) => return Err(other),
            }
        } else {
            debug!(task = index, operator = %operator, condition = %run_condition, "Request skipped");
        }

        for step in steps {
            if !step.run_condition.permits(self.record.has_error()) {
                debug!(
                    task = index,
                    operator = %step.operator,
                    condition = %step.run_condition,
                    "Step skipped"
                );
                continue;
            }
            let replacement = (step.thunk)(self.record.view())?;
            self.record.apply(replacement);
        }

        Ok(())
    }
}

impl fmt::Debug for ExecStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecStack")
            .field("tasks", &self.task_count())
            .field("terminal_bound", &self.terminal_bound)
            .field("record", &self.record)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RequestError;
    use futures::FutureExt;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    type Log = Arc<Mutex<Vec<String>>>;

    fn begin(log: &Log, name: &str, outcome: Result<Value, RequestError>) -> PendingStep {
        let log = log.clone();
        let label = name.to_string();
        PendingStep::begin(
            name,
            RunCondition::Always,
            Box::new(move |_value: Option<Value>| {
                async move {
                    log.lock().push(label);
                    outcome.map_err(ChainError::Request)
                }
                .boxed()
            }),
        )
    }

    fn pipe<F>(log: &Log, name: &str, condition: RunCondition, f: F) -> PendingStep
    where
        F: FnOnce(Option<&Value>) -> Option<Value> + Send + 'static,
    {
        let log = log.clone();
        let label = name.to_string();
        PendingStep::pipe(
            name,
            condition,
            Box::new(move |view: RecordView<'_>| {
                log.lock().push(label);
                Ok(f(view.value))
            }),
        )
    }

    /// A terminal that reports `{value, error}` as the settled result.
    fn observe(log: &Log) -> PendingStep {
        let log = log.clone();
        PendingStep::terminal(
            "observe",
            Box::new(move |mut record: ExecutionRecord| {
                async move {
                    log.lock().push("observe".to_string());
                    let error = record.take_error().map(|e| e.message);
                    Ok(Some(json!({"value": record.into_value(), "error": error})))
                }
                .boxed()
            }),
        )
    }

    fn new_log() -> Log {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[tokio::test]
    async fn test_single_begin_then_terminal() {
        let log = new_log();
        let mut stack = ExecStack::new();
        stack.append(begin(&log, "get", Ok(json!(1)))).unwrap();
        stack.append(observe(&log)).unwrap();

        let settled = stack.run().await.unwrap();

        assert_eq!(*log.lock(), vec!["get", "observe"]);
        assert_eq!(settled, Some(json!({"value": 1, "error": null})));
    }

    #[test]
    fn test_pipe_before_begin_fails() {
        let log = new_log();
        let mut stack = ExecStack::new();

        let err = stack
            .append(pipe(&log, "pipe", RunCondition::Always, |_| None))
            .unwrap_err();
        assert_eq!(
            err,
            SequenceError::MissingBegin {
                operator: "pipe".to_string()
            }
        );
    }

    #[test]
    fn test_terminal_before_begin_fails() {
        let log = new_log();
        let mut stack = ExecStack::new();

        let err = stack.append(observe(&log)).unwrap_err();
        assert!(matches!(err, SequenceError::MissingBegin { .. }));
        assert!(!stack.is_terminal_bound());
    }

    #[test]
    fn test_duplicate_terminal_fails() {
        let log = new_log();
        let mut stack = ExecStack::new();
        stack.append(begin(&log, "get", Ok(json!(1)))).unwrap();
        stack.append(observe(&log)).unwrap();

        let err = stack.append(observe(&log)).unwrap_err();
        assert_eq!(
            err,
            SequenceError::DuplicateTerminal {
                operator: "observe".to_string()
            }
        );
    }

    #[test]
    fn test_append_after_terminal_fails() {
        let log = new_log();
        let mut stack = ExecStack::new();
        stack.append(begin(&log, "get", Ok(json!(1)))).unwrap();
        stack.append(observe(&log)).unwrap();

        let err = stack.append(begin(&log, "post", Ok(json!(2)))).unwrap_err();
        assert!(matches!(err, SequenceError::AfterTerminal { .. }));
    }

    #[test]
    fn test_second_begin_opens_new_task() {
        let log = new_log();
        let mut stack = ExecStack::new();
        stack.append(begin(&log, "get", Ok(json!(1)))).unwrap();
        stack.append(pipe(&log, "pipe", RunCondition::Always, |_| None)).unwrap();
        assert_eq!(stack.task_count(), 1);

        stack.append(begin(&log, "post", Ok(json!(2)))).unwrap();
        assert_eq!(stack.task_count(), 2);
    }

    #[tokio::test]
    async fn test_run_without_terminal_fails() {
        let log = new_log();
        let mut stack = ExecStack::new();
        stack.append(begin(&log, "get", Ok(json!(1)))).unwrap();

        let err = stack.run().await.unwrap_err();
        assert!(matches!(err, ChainError::Sequence(SequenceError::MissingTerminal)));
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_steps_run_in_append_order_across_tasks() {
        let log = new_log();
        let mut stack = ExecStack::new();
        stack.append(begin(&log, "get", Ok(json!(1)))).unwrap();
        stack
            .append(pipe(&log, "double", RunCondition::Always, |v| {
                v.and_then(Value::as_i64).map(|n| json!(n * 2))
            }))
            .unwrap();
        stack.append(begin(&log, "post", Ok(json!(10)))).unwrap();
        stack
            .append(pipe(&log, "inc", RunCondition::Always, |v| {
                v.and_then(Value::as_i64).map(|n| json!(n + 1))
            }))
            .unwrap();
        stack.append(observe(&log)).unwrap();

        let settled = stack.run().await.unwrap();

        assert_eq!(*log.lock(), vec!["get", "double", "post", "inc", "observe"]);
        assert_eq!(settled.unwrap()["value"], json!(11));
    }

    #[tokio::test]
    async fn test_failed_request_skips_remaining_tasks() {
        let log = new_log();
        let mut stack = ExecStack::new();
        stack.append(begin(&log, "first", Ok(json!(1)))).unwrap();
        stack
            .append(begin(&log, "second", Err(RequestError::network("NetworkError"))))
            .unwrap();
        stack.append(begin(&log, "third", Ok(json!(3)))).unwrap();
        stack.append(begin(&log, "fourth", Ok(json!(4)))).unwrap();
        stack.append(observe(&log)).unwrap();

        let settled = stack.run().await.unwrap().unwrap();

        assert_eq!(*log.lock(), vec!["first", "second", "observe"]);
        assert_eq!(settled["error"], json!("NetworkError"));
        // The failed request leaves the previous value in place.
        assert_eq!(settled["value"], json!(1));
    }

    #[tokio::test]
    async fn test_run_conditions_gate_pipes() {
        let log = new_log();
        let mut stack = ExecStack::new();
        stack
            .append(begin(&log, "get", Err(RequestError::timeout("slow"))))
            .unwrap();
        stack
            .append(pipe(&log, "always", RunCondition::Always, |_| None))
            .unwrap();
        stack
            .append(pipe(&log, "no_error", RunCondition::OnlyIfNoError, |_| Some(json!("x"))))
            .unwrap();
        stack
            .append(pipe(&log, "on_error", RunCondition::OnlyIfError, |_| Some(json!("recovered"))))
            .unwrap();
        stack.append(observe(&log)).unwrap();

        let settled = stack.run().await.unwrap().unwrap();

        assert_eq!(*log.lock(), vec!["get", "always", "on_error", "observe"]);
        assert_eq!(settled["value"], json!("recovered"));
        // Pipes cannot clear the error.
        assert_eq!(settled["error"], json!("slow"));
    }

    #[tokio::test]
    async fn test_only_if_error_pipe_skipped_on_success() {
        let log = new_log();
        let mut stack = ExecStack::new();
        stack.append(begin(&log, "get", Ok(json!("ok")))).unwrap();
        stack
            .append(pipe(&log, "on_error", RunCondition::OnlyIfError, |_| Some(json!("fallback"))))
            .unwrap();
        stack.append(observe(&log)).unwrap();

        let settled = stack.run().await.unwrap().unwrap();
        assert_eq!(settled["value"], json!("ok"));
        assert_eq!(*log.lock(), vec!["get", "observe"]);
    }

    #[tokio::test]
    async fn test_begin_run_condition_gates_request() {
        let log = new_log();
        let mut stack = ExecStack::new();
        let gated_log = log.clone();
        stack
            .append(PendingStep::begin(
                "recover",
                RunCondition::OnlyIfError,
                Box::new(move |_value: Option<Value>| {
                    async move {
                        gated_log.lock().push("recover".to_string());
                        Ok(json!("unexpected"))
                    }
                    .boxed()
                }),
            ))
            .unwrap();
        stack.append(observe(&log)).unwrap();

        let settled = stack.run().await.unwrap().unwrap();
        assert_eq!(*log.lock(), vec!["observe"]);
        assert_eq!(settled["value"], Value::Null);
    }

    #[tokio::test]
    async fn test_pipe_error_propagates() {
        let log = new_log();
        let mut stack = ExecStack::new();
        stack.append(begin(&log, "get", Ok(json!(1)))).unwrap();
        stack
            .append(PendingStep::pipe(
                "explode",
                RunCondition::Always,
                Box::new(|_view: RecordView<'_>| -> Result<Option<Value>, ChainError> {
                    Err(ChainError::Callback(anyhow::anyhow!("boom")))
                }),
            ))
            .unwrap();
        stack.append(observe(&log)).unwrap();

        let err = stack.run().await.unwrap_err();
        assert!(matches!(err, ChainError::Callback(_)));
        assert_eq!(*log.lock(), vec!["get"]);
    }

    #[tokio::test]
    async fn test_falsy_replacements_are_kept() {
        for payload in [json!(0), json!(""), json!(false)] {
            let log = new_log();
            let mut stack = ExecStack::new();
            stack.append(begin(&log, "get", Ok(json!("original")))).unwrap();
            let replacement = payload.clone();
            stack
                .append(pipe(&log, "falsy", RunCondition::Always, move |_| Some(replacement)))
                .unwrap();
            stack.append(observe(&log)).unwrap();

            let settled = stack.run().await.unwrap().unwrap();
            assert_eq!(settled["value"], payload);
        }
    }
}
