//! Operator traits.
//!
//! The executor calls `apply(...)` when a stage runs on its own (eager
//! segment, non-sequence input, or fusion disabled) and `evaluator()` when
//! the stage sits inside a fused run.

use seqfuse_core::lazy::Evaluator;
use seqfuse_core::prelude::{Result, Value};

/// Trait that all stages implement.
///
/// Invariants:
/// - `apply` is deterministic given the same input.
/// - `apply` consumes its input and returns a fully materialized value.
pub trait Operator: Send + Sync + 'static {
    /// Human-readable operator name (stable; shows up in errors and plans).
    fn name(&self) -> &'static str;

    /// Eager, fully-materializing application.
    fn apply(&self, input: Value) -> Result<Value>;
}

/// An operator that can also run item-at-a-time inside a fused run.
///
/// Invariants:
/// - `evaluator()` is side-effect-free and returns fresh state on every call.
/// - Feeding every item of a list to one evaluator (honoring `done` and
///   `Many`) yields exactly what `apply` returns for that list.
pub trait LazyOperator: Operator {
    /// Build the per-run evaluator.
    fn evaluator(&self) -> Box<dyn Evaluator + '_>;

    /// Whether the evaluator reads `Cursor::seen`.
    fn indexed(&self) -> bool {
        false
    }

    /// Whether the stage yields at most one value for the whole run.
    fn single(&self) -> bool {
        false
    }
}
