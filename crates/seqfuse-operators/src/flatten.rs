//! Expansion stages: `flatten`, `flatten_deep`, `flat_map`.
//!
//! These are the stages that answer with `LazyResult::Many`; the driver runs
//! each produced item through the rest of the fused run before the next one.

use std::sync::Arc;

use seqfuse_core::lazy::{Cursor, Evaluator, LazyResult};
use seqfuse_core::prelude::{Result, Value};

use crate::callback::KeyFn;
use crate::stage::Stage;
use crate::traits::{LazyOperator, Operator};

enum Expansion {
    OneLevel,
    Deep,
    Mapped(KeyFn),
}

pub struct Expand {
    name: &'static str,
    expansion: Expansion,
}

impl Expand {
    fn expand(&self, item: Value) -> LazyResult {
        let item = match &self.expansion {
            Expansion::Mapped(f) => f(&item),
            _ => item,
        };
        match (item, &self.expansion) {
            (Value::List(items), Expansion::Deep) => {
                let mut leaves = Vec::new();
                collect_leaves(items, &mut leaves);
                LazyResult::many(leaves)
            }
            (Value::List(items), _) => LazyResult::many(items),
            (other, _) => LazyResult::next(other),
        }
    }
}

fn collect_leaves(items: Vec<Value>, out: &mut Vec<Value>) {
    for item in items {
        match item {
            Value::List(inner) => collect_leaves(inner, out),
            leaf => out.push(leaf),
        }
    }
}

impl Operator for Expand {
    fn name(&self) -> &'static str {
        self.name
    }

    fn apply(&self, input: Value) -> Result<Value> {
        let items = input.into_sequence(self.name)?;
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            match self.expand(item) {
                LazyResult::Single { next, .. } => out.push(next),
                LazyResult::Many { items, .. } => out.extend(items),
                LazyResult::Empty { .. } => {}
            }
        }
        Ok(Value::List(out))
    }
}

impl LazyOperator for Expand {
    fn evaluator(&self) -> Box<dyn Evaluator + '_> {
        Box::new(ExpandEval { op: self })
    }
}

struct ExpandEval<'a> {
    op: &'a Expand,
}

impl Evaluator for ExpandEval<'_> {
    fn eval(&mut self, item: Value, _cursor: &Cursor<'_>) -> Result<LazyResult> {
        Ok(self.op.expand(item))
    }
}

/// Splice nested lists one level; non-list items pass through.
pub fn flatten() -> Stage {
    Stage::lazy(Expand {
        name: "flatten",
        expansion: Expansion::OneLevel,
    })
}

/// Splice nested lists at every depth.
pub fn flatten_deep() -> Stage {
    Stage::lazy(Expand {
        name: "flatten_deep",
        expansion: Expansion::Deep,
    })
}

/// Map, then splice the result one level if it is a list.
pub fn flat_map<F>(f: F) -> Stage
where
    F: Fn(&Value) -> Value + Send + Sync + 'static,
{
    Stage::lazy(Expand {
        name: "flat_map",
        expansion: Expansion::Mapped(Arc::new(f)),
    })
}
