//! Transport seam consumed by begin operators.
//!
//! The engine never performs network I/O itself. Begin operators describe a
//! request as an [`HttpRequest`] and hand it to a [`Transport`] supplied by
//! the host.

use crate::errors::RequestError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The request verbs issued by the built-in begin operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// Returns the verb as an uppercase string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Returns true for verbs whose body travels as query parameters.
    #[must_use]
    pub fn sends_params(&self) -> bool {
        matches!(self, Self::Get)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request options accepted by the verb operators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Extra headers.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Whether transport-level hooks should run for this request.
    #[serde(default)]
    pub use_hooks: bool,
}

impl RequestOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Enables transport hooks.
    #[must_use]
    pub fn with_hooks(mut self) -> Self {
        self.use_hooks = true;
        self
    }
}

/// A request described by a begin operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpRequest {
    /// The verb.
    pub method: HttpMethod,
    /// The path, relative to the transport's base address or absolute.
    pub path: String,
    /// Body.
    pub body: Option<serde_json::Value>,
    /// Query parameters.
    #[serde(default)]
    pub params: Option<serde_json::Value>,
    /// Headers.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Whether transport-level hooks should run.
    #[serde(default)]
    pub use_hooks: bool,
}

impl HttpRequest {
    /// Creates a request without body or headers.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            params: None,
            headers: HashMap::new(),
            use_hooks: false,
        }
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the query parameters.
    #[must_use]
    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.params = Some(params);
        self
    }

    /// Attaches a payload as query parameters or body, depending on the verb.
    #[must_use]
    pub fn with_payload(self, payload: serde_json::Value) -> Self {
        if self.method.sends_params() {
            self.with_params(payload)
        } else {
            self.with_body(payload)
        }
    }

    /// Applies request options.
    #[must_use]
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.headers.extend(options.headers);
        self.use_hooks = options.use_hooks;
        self
    }
}

/// Sends requests on behalf of begin operators.
///
/// Implementations own every transport concern: base addresses, retries,
/// timeouts, pooling. A failure is reported as a [`RequestError`], which the
/// engine records rather than raising.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and returns the decoded response payload.
    async fn send(&self, request: HttpRequest) -> Result<serde_json::Value, RequestError>;
}
