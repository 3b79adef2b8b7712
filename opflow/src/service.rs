//! Operator service and client.
//!
//! The service merges user operators with the built-ins once, then hands out
//! a fresh [`OperatorSet`] for every chain. The client bundles a service with
//! the transport and processor a host wires in, so starting a chain is a
//! single call.

use crate::config::{CollisionPolicy, ModuleConfig, ServerConfig};
use crate::errors::InvalidOperatorError;
use crate::exec::OperatorSet;
use crate::operators::builtin::builtin_registry;
use crate::operators::{OperatorDescriptor, OperatorRegistry};
use crate::processor::ResultProcessor;
use crate::transport::Transport;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The merged operator table shared by every chain of a module.
#[derive(Debug, Clone)]
pub struct OperatorService {
    operators: Arc<OperatorRegistry>,
}

impl OperatorService {
    /// Merges the declared user operators with the built-ins.
    ///
    /// Each name in `config.custom_operators` must be registered in `custom`;
    /// an empty list exposes every operator registered there. Collisions with
    /// built-in names are resolved by `config.collision_policy`, and a user
    /// operator may only replace a built-in of the same kind.
    pub fn new(custom: &OperatorRegistry, config: &ModuleConfig) -> Result<Self, InvalidOperatorError> {
        let declared: Vec<&OperatorDescriptor> = if config.custom_operators.is_empty() {
            custom.iter().collect()
        } else {
            config
                .custom_operators
                .iter()
                .map(|name| custom.lookup(name))
                .collect::<Result<_, _>>()?
        };

        let mut merged = builtin_registry()?;
        let mut seen = HashSet::new();

        for descriptor in declared {
            let name = descriptor.name();
            if !seen.insert(name) {
                return Err(InvalidOperatorError::DuplicateName {
                    name: name.to_string(),
                });
            }

            let Some(builtin_kind) = merged.get(name).map(OperatorDescriptor::kind) else {
                debug!(operator = name, kind = %descriptor.kind(), "Registered user operator");
                merged.insert(descriptor.clone())?;
                continue;
            };

            match config.collision_policy {
                CollisionPolicy::Reject => {
                    return Err(InvalidOperatorError::NameCollision {
                        name: name.to_string(),
                    });
                }
                CollisionPolicy::BuiltinWins => {
                    warn!(operator = name, "User operator shadowed by built-in, ignoring");
                }
                CollisionPolicy::UserWins => {
                    if builtin_kind != descriptor.kind() {
                        return Err(InvalidOperatorError::KindConflict {
                            name: name.to_string(),
                            builtin: builtin_kind,
                            custom: descriptor.kind(),
                        });
                    }
                    warn!(operator = name, "User operator replaces built-in");
                    merged.replace(descriptor.clone());
                }
            }
        }

        info!(operators = merged.len(), "Operator service ready");
        Ok(Self::from_registry(Arc::new(merged)))
    }

    /// Wraps an already merged table.
    #[must_use]
    pub fn from_registry(operators: Arc<OperatorRegistry>) -> Self {
        Self { operators }
    }

    /// Creates a service exposing only the built-ins.
    pub fn builtin() -> Result<Self, InvalidOperatorError> {
        Ok(Self::from_registry(Arc::new(builtin_registry()?)))
    }

    /// Returns the merged table.
    #[must_use]
    pub fn operators(&self) -> &Arc<OperatorRegistry> {
        &self.operators
    }

    /// Creates a fresh chain.
    #[must_use]
    pub fn operator_set(
        &self,
        transport: Arc<dyn Transport>,
        processor: Arc<dyn ResultProcessor>,
    ) -> OperatorSet {
        OperatorSet::new(Arc::clone(&self.operators), transport, processor)
    }
}

/// A service bound to its transport and result processor.
#[derive(Clone)]
pub struct OperatorClient {
    service: OperatorService,
    server: ServerConfig,
    transport: Arc<dyn Transport>,
    processor: Arc<dyn ResultProcessor>,
}

impl OperatorClient {
    /// Creates a client from its parts.
    #[must_use]
    pub fn new(
        service: OperatorService,
        server: ServerConfig,
        transport: Arc<dyn Transport>,
        processor: Arc<dyn ResultProcessor>,
    ) -> Self {
        Self {
            service,
            server,
            transport,
            processor,
        }
    }

    /// Builds the service from user operators and module config.
    pub fn from_config(
        custom: &OperatorRegistry,
        config: &ModuleConfig,
        transport: Arc<dyn Transport>,
        processor: Arc<dyn ResultProcessor>,
    ) -> Result<Self, InvalidOperatorError> {
        let service = OperatorService::new(custom, config)?;
        info!(address = %config.server.abs_path(), "Operator client configured");
        Ok(Self::new(service, config.server.clone(), transport, processor))
    }

    /// Starts a new chain.
    #[must_use]
    pub fn chain(&self) -> OperatorSet {
        self.service
            .operator_set(Arc::clone(&self.transport), Arc::clone(&self.processor))
    }

    /// Returns the service.
    #[must_use]
    pub fn service(&self) -> &OperatorService {
        &self.service
    }

    /// Returns the server the transport talks to.
    #[must_use]
    pub fn server(&self) -> &ServerConfig {
        &self.server
    }
}

impl fmt::Debug for OperatorClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorClient")
            .field("service", &self.service)
            .field("server", &self.server)
            .finish()
    }
}
