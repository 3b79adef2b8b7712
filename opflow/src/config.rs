//! Configuration for operator services and the server they talk to.

use crate::core::RunCondition;
use crate::operators::OperatorRegistry;
use serde::{Deserialize, Serialize};

/// Location of the remote server requests are sent to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host name, without protocol or port.
    pub base_url: String,
    /// URL scheme.
    #[serde(default = "default_protocol")]
    pub protocol: String,
    /// Port, omitted from URLs when unset.
    #[serde(default)]
    pub port: Option<u16>,
    /// Path prefix prepended to every request path.
    #[serde(default)]
    pub prefix: String,
}

fn default_protocol() -> String {
    "http".to_string()
}

impl ServerConfig {
    /// Creates a config for the host with the default protocol.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            protocol: default_protocol(),
            port: None,
            prefix: String::new(),
        }
    }

    /// Sets the protocol.
    #[must_use]
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// Sets the port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the path prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Returns `host[:port]prefix/`.
    #[must_use]
    pub fn base_url(&self) -> String {
        let port = self.port.map(|p| format!(":{p}")).unwrap_or_default();
        format!("{}{}{}/", self.base_url, port, self.prefix)
    }

    /// Returns the absolute address, `protocol://host[:port]prefix/`.
    #[must_use]
    pub fn abs_path(&self) -> String {
        format!("{}://{}", self.protocol, self.base_url())
    }

    /// Resolves a request path against the absolute address.
    ///
    /// Paths that already start with `http` are returned unchanged.
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        if path.starts_with("http") {
            return path.to_string();
        }
        let relative = path.strip_prefix('/').unwrap_or(path);
        format!("{}{}", self.abs_path(), relative)
    }
}

/// What happens when a user operator shares a built-in's name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// The user operator replaces the built-in, keeping its position.
    #[default]
    UserWins,
    /// The built-in is kept and the user operator is ignored.
    BuiltinWins,
    /// The collision is a registration error.
    Reject,
}

/// Module-level settings for an operator service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// The server requests are sent to.
    pub server: ServerConfig,
    /// Names of the user operators to expose; empty exposes all of them.
    #[serde(default)]
    pub custom_operators: Vec<String>,
    /// Resolution of name collisions with built-ins.
    #[serde(default)]
    pub collision_policy: CollisionPolicy,
    /// Run condition for user operators that declare none.
    #[serde(default)]
    pub default_run_condition: RunCondition,
}

impl ModuleConfig {
    /// Creates a config with default settings for the server.
    #[must_use]
    pub fn new(server: ServerConfig) -> Self {
        Self {
            server,
            custom_operators: Vec::new(),
            collision_policy: CollisionPolicy::default(),
            default_run_condition: RunCondition::default(),
        }
    }

    /// Parses a config from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Declares a user operator to expose.
    #[must_use]
    pub fn with_custom_operator(mut self, name: impl Into<String>) -> Self {
        self.custom_operators.push(name.into());
        self
    }

    /// Sets the collision policy.
    #[must_use]
    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Sets the default run condition for user operators.
    #[must_use]
    pub fn with_default_run_condition(mut self, condition: RunCondition) -> Self {
        self.default_run_condition = condition;
        self
    }

    /// Creates an empty registry for user operators using this config's
    /// default run condition.
    #[must_use]
    pub fn custom_registry(&self) -> OperatorRegistry {
        OperatorRegistry::new().with_default_run_condition(self.default_run_condition)
    }
}
