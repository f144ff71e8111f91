//! The `Stage` tagged variant the executor dispatches on.

use std::fmt;

use seqfuse_core::prelude::{Result, Value};

use crate::traits::{LazyOperator, Operator};

/// One link in a pipeline chain.
pub enum Stage {
    /// Opaque sequence -> value function; never fused.
    Eager(Box<dyn Operator>),
    /// Fusable stage carrying its eager form and evaluator factory.
    Lazy(Box<dyn LazyOperator>),
}

impl Stage {
    pub fn eager<O: Operator>(op: O) -> Self {
        Stage::Eager(Box::new(op))
    }

    pub fn lazy<O: LazyOperator>(op: O) -> Self {
        Stage::Lazy(Box::new(op))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Eager(op) => op.name(),
            Stage::Lazy(op) => op.name(),
        }
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self, Stage::Lazy(_))
    }

    pub fn is_single(&self) -> bool {
        match self {
            Stage::Eager(_) => false,
            Stage::Lazy(op) => op.single(),
        }
    }

    pub fn as_lazy(&self) -> Option<&dyn LazyOperator> {
        match self {
            Stage::Eager(_) => None,
            Stage::Lazy(op) => Some(op.as_ref()),
        }
    }

    /// Run this stage on its own over a materialized value.
    pub fn apply(&self, input: Value) -> Result<Value> {
        match self {
            Stage::Eager(op) => op.apply(input),
            Stage::Lazy(op) => op.apply(input),
        }
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Eager(op) => f.debug_tuple("Eager").field(&op.name()).finish(),
            Stage::Lazy(op) => f
                .debug_struct("Lazy")
                .field("name", &op.name())
                .field("indexed", &op.indexed())
                .field("single", &op.single())
                .finish(),
        }
    }
}
