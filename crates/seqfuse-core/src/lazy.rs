//! The lazy evaluation contract.
//!
//! A stage that wants to take part in single-pass fusion hands the executor
//! an [`Evaluator`]: a per-run object that is fed one item at a time and
//! answers with a [`LazyResult`]. Evaluators own whatever state they need
//! across calls (seen sets, counters); a fresh one is built for every run.

use crate::error::Result;
use crate::value::Value;

/// Outcome of evaluating one item.
///
/// `done: true` tells the driver to stop pulling source items once the
/// current one has been fully propagated.
#[derive(Debug, Clone, PartialEq)]
pub enum LazyResult {
    /// No output for this item.
    Empty { done: bool },
    /// Exactly one output, handed to the next stage.
    Single { next: Value, done: bool },
    /// Ordered expansion; each item runs through the remaining stages
    /// before the next one is considered.
    Many { items: Vec<Value>, done: bool },
}

impl LazyResult {
    pub fn skip() -> Self {
        LazyResult::Empty { done: false }
    }

    pub fn next(value: Value) -> Self {
        LazyResult::Single {
            next: value,
            done: false,
        }
    }

    pub fn many(items: Vec<Value>) -> Self {
        LazyResult::Many { items, done: false }
    }

    /// Nothing more will ever come out of this stage.
    pub fn exhausted() -> Self {
        LazyResult::Empty { done: true }
    }

    /// Mark this result as the stage's last.
    pub fn finish(self) -> Self {
        self.with_done(true)
    }

    pub fn with_done(self, done: bool) -> Self {
        match self {
            LazyResult::Empty { .. } => LazyResult::Empty { done },
            LazyResult::Single { next, .. } => LazyResult::Single { next, done },
            LazyResult::Many { items, .. } => LazyResult::Many { items, done },
        }
    }

    pub fn is_done(&self) -> bool {
        match self {
            LazyResult::Empty { done }
            | LazyResult::Single { done, .. }
            | LazyResult::Many { done, .. } => *done,
        }
    }

    /// Keep the item if `keep`, otherwise drop it.
    pub fn keep_if(keep: bool, item: Value) -> Self {
        if keep {
            LazyResult::next(item)
        } else {
            LazyResult::skip()
        }
    }
}

/// Per-item context handed to an evaluator.
///
/// `index` is the zero-based position of the current item among the items
/// fed to this evaluator. `seen` holds those items, the current one last;
/// it is only populated for evaluators whose operator is `indexed`.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    pub index: usize,
    pub seen: &'a [Value],
}

impl<'a> Cursor<'a> {
    pub fn new(index: usize, seen: &'a [Value]) -> Self {
        Self { index, seen }
    }

    /// Cursor without the seen-so-far buffer.
    pub fn unindexed(index: usize) -> Self {
        Self { index, seen: &[] }
    }
}

/// One stage's runtime unit inside a fused run.
///
/// Implementations must be total over well-typed input. Errors returned from
/// `eval` abort the whole run.
pub trait Evaluator {
    fn eval(&mut self, item: Value, cursor: &Cursor<'_>) -> Result<LazyResult>;
}
