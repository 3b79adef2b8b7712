//! Observability utilities.
//!
//! Chains log through the `tracing` macros; hosts that do not install their
//! own subscriber can call [`init_tracing`].

mod subscriber;
mod timer;

pub use subscriber::{init_tracing, TracingFormat};
pub use timer::ChainTimer;
