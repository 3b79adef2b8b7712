//! Built-in operators.
//!
//! | name | kind | arguments |
//! |---|---|---|
//! | `get`, `post`, `put`, `delete` | begin | `(url_or_fn, body_or_fn, options)` |
//! | `pipe` | pipe | `(transform)` |
//! | `report` | terminal | `(message_fn)` |
//! | `unwrap` | terminal | `()` |
//! | `match` | terminal | `(on_success, on_error)` |

use super::{
    BeginContext, BeginOperator, Executable, OperatorConfig, OperatorRegistry, PipeOperator,
    TerminalContext, TerminalOperator,
};
use crate::core::{OperatorArgs, RecordView, RunCondition};
use crate::errors::{ChainError, InvalidOperatorError};
use crate::transport::{HttpMethod, HttpRequest};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Names of the built-in operators.
pub mod names {
    /// GET request.
    pub const GET: &str = "get";
    /// POST request.
    pub const POST: &str = "post";
    /// PUT request.
    pub const PUT: &str = "put";
    /// DELETE request.
    pub const DELETE: &str = "delete";
    /// Generic transform.
    pub const PIPE: &str = "pipe";
    /// Report failures through the result processor.
    pub const REPORT: &str = "report";
    /// Rethrow the request error or return the value.
    pub const UNWRAP: &str = "unwrap";
    /// Branch on the presence of an error.
    pub const MATCH: &str = "match";
}

const DEFAULT_REPORT_MESSAGE: &str = "Request failed";

/// Issues one HTTP verb through the chain's transport.
#[derive(Debug, Clone, Copy)]
pub struct RequestOperator {
    method: HttpMethod,
}

impl RequestOperator {
    /// Creates a request operator for the verb.
    #[must_use]
    pub fn new(method: HttpMethod) -> Self {
        Self { method }
    }

    /// Returns the verb.
    #[must_use]
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    fn build_request(&self, value: Option<&Value>, args: &OperatorArgs) -> Result<HttpRequest, ChainError> {
        let path = match args.resolve(0, value)? {
            Some(Value::String(path)) => path,
            _ => return Err(ChainError::invalid_argument(args.operator(), 0, "a string path")),
        };

        let mut request = HttpRequest::new(self.method, path).with_options(args.options(2)?);
        match args.resolve(1, value)? {
            None | Some(Value::Null) => {}
            Some(payload) => request = request.with_payload(payload),
        }
        Ok(request)
    }
}

#[async_trait]
impl BeginOperator for RequestOperator {
    async fn exec(&self, ctx: BeginContext, args: &OperatorArgs) -> Result<Value, ChainError> {
        let request = self.build_request(ctx.value.as_ref(), args)?;
        debug!(method = %request.method, path = %request.path, "Sending request");
        ctx.transport.send(request).await.map_err(ChainError::Request)
    }
}

/// Applies a caller transform to the chain value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pipe;

impl PipeOperator for Pipe {
    fn exec(&self, view: RecordView<'_>, args: &OperatorArgs) -> Result<Option<Value>, ChainError> {
        let transform = args.transform(0)?;
        transform(view.value).map_err(ChainError::Callback)
    }
}

/// Reports a failure through the result processor; never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Report;

#[async_trait]
impl TerminalOperator for Report {
    async fn exec(&self, ctx: &mut TerminalContext, args: &OperatorArgs) -> Result<Option<Value>, ChainError> {
        if let Some(error) = ctx.record.take_error() {
            let message = args
                .message(0)
                .map_or_else(|| DEFAULT_REPORT_MESSAGE.to_string(), |f| f(ctx.record.value()));
            ctx.processor.process(&message, Some(&error));
        }
        Ok(None)
    }
}

/// Rethrows the request error verbatim, or settles on the value unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unwrap;

#[async_trait]
impl TerminalOperator for Unwrap {
    async fn exec(&self, ctx: &mut TerminalContext, _args: &OperatorArgs) -> Result<Option<Value>, ChainError> {
        match ctx.record.take_error() {
            Some(error) => Err(ChainError::Request(error)),
            None => Ok(None),
        }
    }
}

/// Routes to the success or the error callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct Match;

#[async_trait]
impl TerminalOperator for Match {
    async fn exec(&self, ctx: &mut TerminalContext, args: &OperatorArgs) -> Result<Option<Value>, ChainError> {
        let on_success = args.compute(0)?;
        let on_error = args.on_error(1)?;

        let settled = match ctx.record.take_error() {
            Some(error) => on_error(&error),
            None => on_success(ctx.record.value()),
        };
        settled.map(Some).map_err(ChainError::Callback)
    }
}

/// Builds the registry of built-in operators, in their canonical order.
pub fn builtin_registry() -> Result<OperatorRegistry, InvalidOperatorError> {
    let mut registry = OperatorRegistry::new();

    let verbs = [
        (names::GET, HttpMethod::Get),
        (names::POST, HttpMethod::Post),
        (names::PUT, HttpMethod::Put),
        (names::DELETE, HttpMethod::Delete),
    ];
    for (name, method) in verbs {
        registry.register_begin(
            RequestOperator::new(method),
            OperatorConfig::new(name).with_run_condition(RunCondition::Always),
        )?;
    }

    registry.register_pipe(
        Pipe,
        OperatorConfig::new(names::PIPE).with_run_condition(RunCondition::Always),
    )?;

    let terminals: [(&str, Executable); 3] = [
        (names::REPORT, Executable::Terminal(Arc::new(Report))),
        (names::UNWRAP, Executable::Terminal(Arc::new(Unwrap))),
        (names::MATCH, Executable::Terminal(Arc::new(Match))),
    ];
    for (name, executable) in terminals {
        registry.register(executable, OperatorConfig::new(name))?;
    }

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ExecutionRecord, OperatorArg, OperatorKind};
    use crate::errors::RequestError;
    use crate::processor::NoOpProcessor;
    use crate::testing::{CollectingProcessor, RecordingTransport};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn terminal_ctx(record: ExecutionRecord, processor: Arc<dyn crate::processor::ResultProcessor>) -> TerminalContext {
        TerminalContext { record, processor }
    }

    fn failed_record(error: RequestError) -> ExecutionRecord {
        let mut record = ExecutionRecord::new();
        record.set_error(error);
        record
    }

    #[test]
    fn test_builtin_registry_surface() {
        let registry = builtin_registry().unwrap();
        assert_eq!(
            registry.names(),
            vec!["get", "post", "put", "delete", "pipe", "report", "unwrap", "match"]
        );
        assert_eq!(registry.get("get").unwrap().kind(), OperatorKind::Begin);
        assert_eq!(registry.get("pipe").unwrap().kind(), OperatorKind::Pipe);
        assert_eq!(
            registry.get("pipe").unwrap().run_condition(),
            Some(RunCondition::Always)
        );
        assert_eq!(registry.get("match").unwrap().kind(), OperatorKind::Terminal);
        assert_eq!(registry.get("match").unwrap().run_condition(), None);
    }

    #[tokio::test]
    async fn test_request_operator_resolves_computed_arguments() {
        let transport = Arc::new(RecordingTransport::new().respond("/users/7", json!({"ok": true})));
        let operator = RequestOperator::new(HttpMethod::Put);
        let args = OperatorArgs::new(
            "put",
            vec![
                OperatorArg::compute(|v| Ok(json!(format!("/users/{}", v.unwrap()["id"])))),
                OperatorArg::compute(|v| Ok(json!({"name": v.unwrap()["name"]}))),
            ],
        );

        let ctx = BeginContext {
            value: Some(json!({"id": 7, "name": "ada"})),
            transport: transport.clone(),
        };
        let response = operator.exec(ctx, &args).await.unwrap();

        assert_eq!(response, json!({"ok": true}));
        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, HttpMethod::Put);
        assert_eq!(sent[0].body, Some(json!({"name": "ada"})));
    }

    #[tokio::test]
    async fn test_get_payload_travels_as_query_params() {
        let transport = Arc::new(RecordingTransport::new().respond("/search", json!([])));
        let args = OperatorArgs::new(
            "get",
            vec![json!("/search").into(), json!({"q": "rust"}).into()],
        );
        let ctx = BeginContext {
            value: None,
            transport: transport.clone(),
        };

        RequestOperator::new(HttpMethod::Get).exec(ctx, &args).await.unwrap();

        let sent = transport.requests();
        assert_eq!(sent[0].params, Some(json!({"q": "rust"})));
        assert_eq!(sent[0].body, None);
    }

    #[tokio::test]
    async fn test_request_operator_rejects_non_string_path() {
        let transport = Arc::new(RecordingTransport::new());
        let args = OperatorArgs::new("get", vec![json!(42).into()]);
        let ctx = BeginContext {
            value: None,
            transport: transport.clone(),
        };

        let err = RequestOperator::new(HttpMethod::Get).exec(ctx, &args).await.unwrap_err();
        assert!(matches!(err, ChainError::InvalidArgument { index: 0, .. }));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_pipe_applies_transform() {
        let args = OperatorArgs::new(
            "pipe",
            vec![OperatorArg::transform(|v| Ok(v.and_then(|d| d.get("name")).cloned()))],
        );
        let value = json!({"name": "ada"});
        let view = RecordView {
            value: Some(&value),
            error: None,
        };

        assert_eq!(Pipe.exec(view, &args).unwrap(), Some(json!("ada")));
    }

    #[tokio::test]
    async fn test_report_is_silent_on_success() {
        let processor = Arc::new(CollectingProcessor::new());
        let mut record = ExecutionRecord::new();
        record.set_value(json!("ada"));
        let mut ctx = terminal_ctx(record, processor.clone());
        let args = OperatorArgs::new("report", vec![OperatorArg::message(|_| "fetch failed".to_string())]);

        assert_eq!(Report.exec(&mut ctx, &args).await.unwrap(), None);
        assert!(processor.is_empty());
    }

    #[tokio::test]
    async fn test_report_consumes_error() {
        let processor = Arc::new(CollectingProcessor::new());
        let mut ctx = terminal_ctx(failed_record(RequestError::network("down")), processor.clone());

        let args = OperatorArgs::new("report", vec![]);
        assert!(Report.exec(&mut ctx, &args).await.is_ok());

        let reports = processor.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].0, DEFAULT_REPORT_MESSAGE);
        assert_eq!(reports[0].1.as_ref().unwrap().message, "down");
        assert!(!ctx.record.has_error());
    }

    #[tokio::test]
    async fn test_unwrap_rethrows_verbatim() {
        let error = RequestError::status(503, "unavailable");
        let mut ctx = terminal_ctx(failed_record(error.clone()), Arc::new(NoOpProcessor));

        let err = Unwrap.exec(&mut ctx, &OperatorArgs::new("unwrap", vec![])).await.unwrap_err();
        assert_eq!(err.as_request(), Some(&error));
    }

    #[tokio::test]
    async fn test_match_routes_by_error_presence() {
        let args = OperatorArgs::new(
            "match",
            vec![
                OperatorArg::compute(|v| Ok(json!({"ok": v.cloned()}))),
                OperatorArg::on_error(|e| Ok(json!({"failed": e.message}))),
            ],
        );

        let mut record = ExecutionRecord::new();
        record.set_value(json!(1));
        let mut ctx = terminal_ctx(record, Arc::new(NoOpProcessor));
        assert_eq!(Match.exec(&mut ctx, &args).await.unwrap(), Some(json!({"ok": 1})));

        let mut ctx = terminal_ctx(failed_record(RequestError::network("down")), Arc::new(NoOpProcessor));
        assert_eq!(
            Match.exec(&mut ctx, &args).await.unwrap(),
            Some(json!({"failed": "down"}))
        );
    }

    #[tokio::test]
    async fn test_match_leaves_callback_errors_unguarded() {
        let args = OperatorArgs::new(
            "match",
            vec![
                OperatorArg::compute(|_| anyhow::bail!("bad payload")),
                OperatorArg::on_error(|_| Ok(Value::Null)),
            ],
        );
        let mut ctx = terminal_ctx(ExecutionRecord::new(), Arc::new(NoOpProcessor));

        let err = Match.exec(&mut ctx, &args).await.unwrap_err();
        assert!(matches!(err, ChainError::Callback(_)));
    }
}
