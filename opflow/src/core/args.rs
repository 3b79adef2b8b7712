//! Call-time operator arguments.
//!
//! Arguments are captured when an operator is appended to a chain and
//! evaluated when the step runs, so computed arguments see the chain value
//! as it is at execution time.

use crate::errors::{ChainError, RequestError};
use crate::transport::RequestOptions;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Computes a value from the current chain value.
pub type ComputeFn = Arc<dyn Fn(Option<&Value>) -> anyhow::Result<Value> + Send + Sync>;

/// Transforms the current chain value; `None` keeps it unchanged.
pub type TransformFn = Arc<dyn Fn(Option<&Value>) -> anyhow::Result<Option<Value>> + Send + Sync>;

/// Produces a value from a request error.
pub type ErrorHandlerFn = Arc<dyn Fn(&RequestError) -> anyhow::Result<Value> + Send + Sync>;

/// Produces a report message from the current chain value.
pub type MessageFn = Arc<dyn Fn(Option<&Value>) -> String + Send + Sync>;

/// A single argument passed to an operator.
#[derive(Clone)]
pub enum OperatorArg {
    /// A literal value.
    Value(Value),
    /// A value computed from the chain value.
    Compute(ComputeFn),
    /// A transform of the chain value.
    Transform(TransformFn),
    /// A handler for the request error.
    OnError(ErrorHandlerFn),
    /// A report message builder.
    Message(MessageFn),
    /// Request options.
    Options(RequestOptions),
}

impl OperatorArg {
    /// Wraps a closure computing a value from the chain value.
    pub fn compute<F>(f: F) -> Self
    where
        F: Fn(Option<&Value>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::Compute(Arc::new(f))
    }

    /// Wraps a transform closure.
    pub fn transform<F>(f: F) -> Self
    where
        F: Fn(Option<&Value>) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
    {
        Self::Transform(Arc::new(f))
    }

    /// Wraps an error handler closure.
    pub fn on_error<F>(f: F) -> Self
    where
        F: Fn(&RequestError) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::OnError(Arc::new(f))
    }

    /// Wraps a message closure.
    pub fn message<F>(f: F) -> Self
    where
        F: Fn(Option<&Value>) -> String + Send + Sync + 'static,
    {
        Self::Message(Arc::new(f))
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Self::Value(_) => "Value",
            Self::Compute(_) => "Compute",
            Self::Transform(_) => "Transform",
            Self::OnError(_) => "OnError",
            Self::Message(_) => "Message",
            Self::Options(_) => "Options",
        }
    }
}

impl fmt::Debug for OperatorArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Options(options) => f.debug_tuple("Options").field(options).finish(),
            other => write!(f, "{}(<fn>)", other.variant_name()),
        }
    }
}

impl From<Value> for OperatorArg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for OperatorArg {
    fn from(value: &str) -> Self {
        Self::Value(Value::String(value.to_string()))
    }
}

impl From<String> for OperatorArg {
    fn from(value: String) -> Self {
        Self::Value(Value::String(value))
    }
}

impl From<RequestOptions> for OperatorArg {
    fn from(options: RequestOptions) -> Self {
        Self::Options(options)
    }
}

/// The arguments bound to one operator invocation.
#[derive(Debug, Clone)]
pub struct OperatorArgs {
    operator: String,
    args: Vec<OperatorArg>,
}

impl OperatorArgs {
    /// Creates the argument list for an operator.
    #[must_use]
    pub fn new(operator: impl Into<String>, args: Vec<OperatorArg>) -> Self {
        Self {
            operator: operator.into(),
            args,
        }
    }

    /// Returns the operator name the arguments were bound for.
    #[must_use]
    pub fn operator(&self) -> &str {
        &self.operator
    }

    /// Returns the argument at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&OperatorArg> {
        self.args.get(index)
    }

    /// Returns the number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Returns true if no arguments were passed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Resolves a literal-or-computed argument against the chain value.
    ///
    /// Returns `Ok(None)` when the argument is missing.
    pub fn resolve(&self, index: usize, current: Option<&Value>) -> Result<Option<Value>, ChainError> {
        match self.args.get(index) {
            None => Ok(None),
            Some(OperatorArg::Value(value)) => Ok(Some(value.clone())),
            Some(OperatorArg::Compute(f)) => f(current).map(Some).map_err(ChainError::Callback),
            Some(_) => Err(self.invalid(index, "a value or a function of the chain value")),
        }
    }

    /// Returns the transform at `index`.
    pub fn transform(&self, index: usize) -> Result<&TransformFn, ChainError> {
        match self.args.get(index) {
            Some(OperatorArg::Transform(f)) => Ok(f),
            _ => Err(self.invalid(index, "a transform function")),
        }
    }

    /// Returns the compute function at `index`.
    pub fn compute(&self, index: usize) -> Result<&ComputeFn, ChainError> {
        match self.args.get(index) {
            Some(OperatorArg::Compute(f)) => Ok(f),
            _ => Err(self.invalid(index, "a function of the chain value")),
        }
    }

    /// Returns the error handler at `index`.
    pub fn on_error(&self, index: usize) -> Result<&ErrorHandlerFn, ChainError> {
        match self.args.get(index) {
            Some(OperatorArg::OnError(f)) => Ok(f),
            _ => Err(self.invalid(index, "an error handler")),
        }
    }

    /// Returns the message builder at `index`, if one was passed.
    #[must_use]
    pub fn message(&self, index: usize) -> Option<&MessageFn> {
        match self.args.get(index) {
            Some(OperatorArg::Message(f)) => Some(f),
            _ => None,
        }
    }

    /// Returns the request options at `index`, or defaults when missing.
    pub fn options(&self, index: usize) -> Result<RequestOptions, ChainError> {
        match self.args.get(index) {
            None => Ok(RequestOptions::default()),
            Some(OperatorArg::Options(options)) => Ok(options.clone()),
            Some(_) => Err(self.invalid(index, "request options")),
        }
    }

    fn invalid(&self, index: usize, expected: &'static str) -> ChainError {
        ChainError::invalid_argument(&self.operator, index, expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_literal_and_computed() {
        let args = OperatorArgs::new(
            "get",
            vec![
                "/users/1".into(),
                OperatorArg::compute(|v| Ok(json!({"id": v.and_then(|v| v.get("id")).cloned()}))),
            ],
        );

        let current = json!({"id": 7});
        assert_eq!(args.resolve(0, Some(&current)).unwrap(), Some(json!("/users/1")));
        assert_eq!(args.resolve(1, Some(&current)).unwrap(), Some(json!({"id": 7})));
        assert_eq!(args.resolve(2, Some(&current)).unwrap(), None);
    }

    #[test]
    fn test_resolve_propagates_callback_failure() {
        let args = OperatorArgs::new("get", vec![OperatorArg::compute(|_| anyhow::bail!("no path"))]);

        let err = args.resolve(0, None).unwrap_err();
        assert!(matches!(err, ChainError::Callback(_)));
    }

    #[test]
    fn test_typed_accessors_reject_wrong_variant() {
        let args = OperatorArgs::new("pipe", vec![json!(1).into()]);

        match args.transform(0) {
            Err(ChainError::InvalidArgument { operator, index, .. }) => {
                assert_eq!(operator, "pipe");
                assert_eq!(index, 0);
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected an invalid argument error"),
        }
        assert!(args.message(0).is_none());
    }

    #[test]
    fn test_options_default_when_missing() {
        let args = OperatorArgs::new("post", vec!["/y".into()]);
        let options = args.options(2).unwrap();
        assert!(options.headers.is_empty());
    }

    #[test]
    fn test_debug_hides_closures() {
        let arg = OperatorArg::transform(|_| Ok(None));
        assert_eq!(format!("{arg:?}"), "Transform(<fn>)");
    }
}
