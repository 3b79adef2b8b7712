//! Operator registry for named operator descriptors.

use super::{BeginOperator, PipeOperator, TerminalOperator};
use crate::core::{OperatorKind, RunCondition};
use crate::errors::InvalidOperatorError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Registration settings for one operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// The name the operator is invoked by.
    pub name: String,
    /// Run condition for begin and pipe operators; ignored for terminals.
    #[serde(default)]
    pub run_condition: Option<RunCondition>,
}

impl OperatorConfig {
    /// Creates a config with the registry's default run condition.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            run_condition: None,
        }
    }

    /// Sets an explicit run condition.
    #[must_use]
    pub fn with_run_condition(mut self, condition: RunCondition) -> Self {
        self.run_condition = Some(condition);
        self
    }
}

/// The implementation behind a descriptor.
#[derive(Clone)]
pub enum Executable {
    /// A begin operator.
    Begin(Arc<dyn BeginOperator>),
    /// A pipe operator.
    Pipe(Arc<dyn PipeOperator>),
    /// A terminal operator.
    Terminal(Arc<dyn TerminalOperator>),
}

impl Executable {
    /// Returns the operator kind.
    #[must_use]
    pub fn kind(&self) -> OperatorKind {
        match self {
            Self::Begin(_) => OperatorKind::Begin,
            Self::Pipe(_) => OperatorKind::Pipe,
            Self::Terminal(_) => OperatorKind::Terminal,
        }
    }
}

/// An immutable, registered operator.
#[derive(Clone)]
pub struct OperatorDescriptor {
    name: String,
    run_condition: Option<RunCondition>,
    executable: Executable,
}

impl OperatorDescriptor {
    /// Returns the operator name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the operator kind.
    #[must_use]
    pub fn kind(&self) -> OperatorKind {
        self.executable.kind()
    }

    /// Returns the run condition; `None` for terminal operators.
    #[must_use]
    pub fn run_condition(&self) -> Option<RunCondition> {
        self.run_condition
    }

    /// Returns the implementation.
    #[must_use]
    pub fn executable(&self) -> &Executable {
        &self.executable
    }
}

impl fmt::Debug for OperatorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("run_condition", &self.run_condition)
            .finish()
    }
}

/// An ordered table of operator descriptors keyed by name.
#[derive(Clone, Default)]
pub struct OperatorRegistry {
    /// Registered descriptors.
    descriptors: HashMap<String, OperatorDescriptor>,
    /// Registration order.
    order: Vec<String>,
    /// Applied to begin/pipe registrations that state no condition.
    default_run_condition: RunCondition,
}

impl OperatorRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the run condition given to registrations that state none.
    ///
    /// Defaults to [`RunCondition::Always`]. Hosts relying on the legacy
    /// behaviour, where unconditioned steps stop running after a failure,
    /// pass [`RunCondition::OnlyIfNoError`].
    #[must_use]
    pub fn with_default_run_condition(mut self, condition: RunCondition) -> Self {
        self.default_run_condition = condition;
        self
    }

    /// Returns the default run condition.
    #[must_use]
    pub fn default_run_condition(&self) -> RunCondition {
        self.default_run_condition
    }

    /// Registers a begin operator.
    pub fn register_begin<O>(
        &mut self,
        operator: O,
        config: OperatorConfig,
    ) -> Result<OperatorDescriptor, InvalidOperatorError>
    where
        O: BeginOperator + 'static,
    {
        self.register(Executable::Begin(Arc::new(operator)), config)
    }

    /// Registers a pipe operator.
    pub fn register_pipe<O>(
        &mut self,
        operator: O,
        config: OperatorConfig,
    ) -> Result<OperatorDescriptor, InvalidOperatorError>
    where
        O: PipeOperator + 'static,
    {
        self.register(Executable::Pipe(Arc::new(operator)), config)
    }

    /// Registers a terminal operator.
    pub fn register_terminal<O>(
        &mut self,
        operator: O,
        config: OperatorConfig,
    ) -> Result<OperatorDescriptor, InvalidOperatorError>
    where
        O: TerminalOperator + 'static,
    {
        self.register(Executable::Terminal(Arc::new(operator)), config)
    }

    /// Registers an implementation; its variant decides the kind.
    pub fn register(
        &mut self,
        executable: Executable,
        config: OperatorConfig,
    ) -> Result<OperatorDescriptor, InvalidOperatorError> {
        if config.name.is_empty() {
            return Err(InvalidOperatorError::EmptyName);
        }

        let run_condition = match executable.kind() {
            OperatorKind::Terminal => None,
            OperatorKind::Begin | OperatorKind::Pipe => {
                Some(config.run_condition.unwrap_or(self.default_run_condition))
            }
        };

        let descriptor = OperatorDescriptor {
            name: config.name,
            run_condition,
            executable,
        };
        self.insert(descriptor.clone())?;
        Ok(descriptor)
    }

    /// Adds an already built descriptor.
    pub fn insert(&mut self, descriptor: OperatorDescriptor) -> Result<(), InvalidOperatorError> {
        if self.descriptors.contains_key(descriptor.name()) {
            return Err(InvalidOperatorError::DuplicateName {
                name: descriptor.name.clone(),
            });
        }

        self.order.push(descriptor.name.clone());
        self.descriptors.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Swaps the descriptor registered under the same name, keeping its position.
    pub(crate) fn replace(&mut self, descriptor: OperatorDescriptor) -> Option<OperatorDescriptor> {
        if !self.descriptors.contains_key(descriptor.name()) {
            self.order.push(descriptor.name.clone());
        }
        self.descriptors.insert(descriptor.name.clone(), descriptor)
    }

    /// Resolves a name to its descriptor.
    pub fn lookup(&self, name: &str) -> Result<&OperatorDescriptor, InvalidOperatorError> {
        self.descriptors
            .get(name)
            .ok_or_else(|| InvalidOperatorError::unregistered(name))
    }

    /// Returns the descriptor registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&OperatorDescriptor> {
        self.descriptors.get(name)
    }

    /// Checks whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    /// Lists operator names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// Iterates over descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &OperatorDescriptor> {
        self.order.iter().filter_map(|name| self.descriptors.get(name))
    }

    /// Returns the number of registered operators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorRegistry")
            .field("operators", &self.order)
            .field("default_run_condition", &self.default_run_condition)
            .finish()
    }
}
