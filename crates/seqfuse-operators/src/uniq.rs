//! Deduplication stages: `uniq`, `uniq_by`, `uniq_with`.
//!
//! `uniq` and `uniq_by` keep a hash set of what they have let through;
//! `uniq_with` only has a custom equality to go on and scans linearly.

use std::collections::HashSet;
use std::sync::Arc;

use seqfuse_core::lazy::{Cursor, Evaluator, LazyResult};
use seqfuse_core::prelude::{Result, Value};

use crate::callback::{EqFn, KeyFn};
use crate::stage::Stage;
use crate::traits::{LazyOperator, Operator};

/// How two items are judged duplicates.
enum Identity {
    Value,
    Key(KeyFn),
    Eq(EqFn),
}

pub struct Uniq {
    name: &'static str,
    identity: Identity,
}

/// Per-run dedup state; the eager path and the evaluator both drive it.
struct UniqState<'a> {
    identity: &'a Identity,
    seen: HashSet<Value>,
    kept: Vec<Value>,
}

impl<'a> UniqState<'a> {
    fn new(identity: &'a Identity) -> Self {
        Self {
            identity,
            seen: HashSet::new(),
            kept: Vec::new(),
        }
    }

    /// True the first time an item (or its key) shows up.
    fn admit(&mut self, item: &Value) -> bool {
        match self.identity {
            Identity::Value => self.seen.insert(item.clone()),
            Identity::Key(key) => self.seen.insert(key(item)),
            Identity::Eq(eq) => {
                if self.kept.iter().any(|k| eq(item, k)) {
                    false
                } else {
                    self.kept.push(item.clone());
                    true
                }
            }
        }
    }
}

impl Evaluator for UniqState<'_> {
    fn eval(&mut self, item: Value, _cursor: &Cursor<'_>) -> Result<LazyResult> {
        let keep = self.admit(&item);
        Ok(LazyResult::keep_if(keep, item))
    }
}

impl Operator for Uniq {
    fn name(&self) -> &'static str {
        self.name
    }

    fn apply(&self, input: Value) -> Result<Value> {
        let items = input.into_sequence(self.name)?;
        let mut state = UniqState::new(&self.identity);
        Ok(Value::List(
            items.into_iter().filter(|v| state.admit(v)).collect(),
        ))
    }
}

impl LazyOperator for Uniq {
    fn evaluator(&self) -> Box<dyn Evaluator + '_> {
        Box::new(UniqState::new(&self.identity))
    }
}

/// Drop repeated values, keeping first occurrences.
pub fn uniq() -> Stage {
    Stage::lazy(Uniq {
        name: "uniq",
        identity: Identity::Value,
    })
}

/// Drop items whose derived key was already seen.
pub fn uniq_by<F>(key: F) -> Stage
where
    F: Fn(&Value) -> Value + Send + Sync + 'static,
{
    Stage::lazy(Uniq {
        name: "uniq_by",
        identity: Identity::Key(Arc::new(key)),
    })
}

/// Drop items equal (per `eq`) to an earlier kept item. Quadratic.
pub fn uniq_with<F>(eq: F) -> Stage
where
    F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
{
    Stage::lazy(Uniq {
        name: "uniq_with",
        identity: Identity::Eq(Arc::new(eq)),
    })
}
