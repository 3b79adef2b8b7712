//! # Opflow
//!
//! Deferred request-pipeline composition with pluggable operators.
//!
//! A chain is built by appending operators to an [`exec::OperatorSet`]:
//!
//! - **Begin** operators issue a request (`get`, `post`, `put`, `delete`);
//! - **Pipe** operators transform the value synchronously (`pipe`);
//! - **Terminal** operators finalize the chain (`report`, `unwrap`, `match`).
//!
//! Nothing runs until the terminal operator is awaited. Steps then execute in
//! append order; once a request fails, the remaining requests are skipped and
//! the terminal decides what the failure means to the caller.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use opflow::prelude::*;
//!
//! let client = OperatorClient::from_config(&custom, &config, transport, processor)?;
//!
//! let name = client
//!     .chain()
//!     .get("/users/1")?
//!     .pipe(|user| Ok(user.and_then(|u| u.get("name")).cloned()))?
//!     .report(|_| "fetch failed".to_string())
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod core;
pub mod errors;
pub mod exec;
pub mod observability;
pub mod operators;
pub mod processor;
pub mod service;
pub mod testing;
pub mod transport;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{CollisionPolicy, ModuleConfig, ServerConfig};
    pub use crate::core::{
        ExecutionRecord, OperatorArg, OperatorArgs, OperatorKind, RecordView, RunCondition,
    };
    pub use crate::errors::{
        ChainError, InvalidOperatorError, RequestError, RequestErrorKind, SequenceError,
    };
    pub use crate::exec::OperatorSet;
    pub use crate::observability::{init_tracing, TracingFormat};
    pub use crate::operators::{
        BeginContext, BeginOperator, OperatorConfig, OperatorDescriptor, OperatorRegistry,
        PipeOperator, TerminalContext, TerminalOperator,
    };
    pub use crate::processor::{LoggingProcessor, NoOpProcessor, ResultProcessor};
    pub use crate::service::{OperatorClient, OperatorService};
    pub use crate::transport::{HttpMethod, HttpRequest, RequestOptions, Transport};
}
