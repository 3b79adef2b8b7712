//! Test doubles for transports and result processors.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::ServerConfig;
use crate::errors::RequestError;
use crate::processor::ResultProcessor;
use crate::transport::{HttpRequest, Transport};

/// A transport that answers from a table of canned responses and records
/// every request it receives.
///
/// Paths without a canned response fail with a 404 status error.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    server: Option<ServerConfig>,
    responses: Mutex<HashMap<String, Result<Value, RequestError>>>,
    requests: Mutex<Vec<HttpRequest>>,
    delay: Option<Duration>,
}

impl RecordingTransport {
    /// Creates a transport with no canned responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport that resolves paths against a server address.
    #[must_use]
    pub fn for_server(server: ServerConfig) -> Self {
        Self {
            server: Some(server),
            ..Self::default()
        }
    }

    /// Answers requests to `path` with `value`.
    #[must_use]
    pub fn respond(self, path: impl Into<String>, value: Value) -> Self {
        self.responses.lock().insert(path.into(), Ok(value));
        self
    }

    /// Fails requests to `path` with `error`.
    #[must_use]
    pub fn fail(self, path: impl Into<String>, error: RequestError) -> Self {
        self.responses.lock().insert(path.into(), Err(error));
        self
    }

    /// Sleeps before answering each request.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns every request received, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Returns the paths of every request received, in order.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.requests.lock().iter().map(|r| r.path.clone()).collect()
    }

    /// Returns the resolved URL of every request received, in order.
    #[must_use]
    pub fn urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|r| match &self.server {
                Some(server) => server.join(&r.path),
                None => r.path.clone(),
            })
            .collect()
    }

    /// Returns the number of requests received.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Returns true if a request was sent to `path`.
    #[must_use]
    pub fn was_called(&self, path: &str) -> bool {
        self.requests.lock().iter().any(|r| r.path == path)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: HttpRequest) -> Result<Value, RequestError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let response = self.responses.lock().get(&request.path).cloned();
        let path = request.path.clone();
        self.requests.lock().push(request);

        response.unwrap_or_else(|| Err(RequestError::status(404, format!("No response for '{path}'"))))
    }
}

/// A result processor that keeps every report it receives.
#[derive(Debug, Default)]
pub struct CollectingProcessor {
    reports: Mutex<Vec<(String, Option<RequestError>)>>,
}

impl CollectingProcessor {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all reports, in order.
    #[must_use]
    pub fn reports(&self) -> Vec<(String, Option<RequestError>)> {
        self.reports.lock().clone()
    }

    /// Returns the report messages, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.reports.lock().iter().map(|(m, _)| m.clone()).collect()
    }

    /// Returns the number of reports.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reports.lock().len()
    }

    /// Returns true if nothing was reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reports.lock().is_empty()
    }

    /// Clears collected reports.
    pub fn clear(&self) {
        self.reports.lock().clear();
    }
}

impl ResultProcessor for CollectingProcessor {
    fn process(&self, message: &str, error: Option<&RequestError>) {
        self.reports.lock().push((message.to_string(), error.cloned()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HttpMethod;
    use serde_json::json;

    #[tokio::test]
    async fn test_recording_transport() {
        let transport = RecordingTransport::for_server(ServerConfig::new("localhost").with_port(80))
            .respond("/a", json!(1))
            .fail("/b", RequestError::network("down"));

        assert_eq!(transport.send(HttpRequest::new(HttpMethod::Get, "/a")).await.unwrap(), json!(1));
        assert_eq!(
            transport.send(HttpRequest::new(HttpMethod::Post, "/b")).await.unwrap_err().message,
            "down"
        );
        let missing = transport.send(HttpRequest::new(HttpMethod::Get, "/c")).await.unwrap_err();
        assert_eq!(missing.status, Some(404));

        assert_eq!(transport.call_count(), 3);
        assert_eq!(transport.paths(), vec!["/a", "/b", "/c"]);
        assert_eq!(transport.urls()[0], "http://localhost:80/a");
        assert!(transport.was_called("/b"));
        assert!(!transport.was_called("/d"));
    }

    #[test]
    fn test_collecting_processor() {
        let processor = CollectingProcessor::new();
        assert!(processor.is_empty());

        processor.process("first", None);
        processor.process("second", Some(&RequestError::timeout("slow")));

        assert_eq!(processor.len(), 2);
        assert_eq!(processor.messages(), vec!["first", "second"]);
        assert_eq!(processor.reports()[1].1.as_ref().unwrap().message, "slow");

        processor.clear();
        assert!(processor.is_empty());
    }
}
