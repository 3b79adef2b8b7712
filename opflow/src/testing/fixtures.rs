//! Test fixtures for chain testing.

use std::sync::Arc;

use super::mocks::{CollectingProcessor, RecordingTransport};
use crate::config::ModuleConfig;
use crate::errors::InvalidOperatorError;
use crate::exec::OperatorSet;
use crate::operators::OperatorRegistry;
use crate::service::OperatorService;

/// Wires a service to a recording transport and a collecting processor.
///
/// The harness keeps handles on both doubles so tests can inspect what a
/// chain sent and reported after it settles.
#[derive(Debug)]
pub struct TestHarness {
    service: OperatorService,
    transport: Arc<RecordingTransport>,
    processor: Arc<CollectingProcessor>,
}

impl TestHarness {
    /// Creates a harness exposing only the built-in operators.
    pub fn new(transport: RecordingTransport) -> Result<Self, InvalidOperatorError> {
        Ok(Self::with_service(OperatorService::builtin()?, transport))
    }

    /// Creates a harness over user operators merged per `config`.
    pub fn with_operators(
        custom: &OperatorRegistry,
        config: &ModuleConfig,
        transport: RecordingTransport,
    ) -> Result<Self, InvalidOperatorError> {
        Ok(Self::with_service(OperatorService::new(custom, config)?, transport))
    }

    /// Creates a harness over an existing service.
    #[must_use]
    pub fn with_service(service: OperatorService, transport: RecordingTransport) -> Self {
        Self {
            service,
            transport: Arc::new(transport),
            processor: Arc::new(CollectingProcessor::new()),
        }
    }

    /// Starts a new chain.
    #[must_use]
    pub fn chain(&self) -> OperatorSet {
        self.service
            .operator_set(self.transport.clone(), self.processor.clone())
    }

    /// Returns the transport.
    #[must_use]
    pub fn transport(&self) -> &RecordingTransport {
        &self.transport
    }

    /// Returns the processor.
    #[must_use]
    pub fn processor(&self) -> &CollectingProcessor {
        &self.processor
    }

    /// Returns the service.
    #[must_use]
    pub fn service(&self) -> &OperatorService {
        &self.service
    }
}
