//! Chain execution.
//!
//! [`OperatorSet`] is the per-chain surface callers append operators to;
//! [`ExecStack`] groups the appended steps into tasks and runs them once a
//! terminal operator is bound.

mod operator_set;
mod stack;

pub use operator_set::OperatorSet;
pub use stack::{BeginThunk, ExecStack, PendingStep, PipeThunk, StepAction, TerminalThunk};
