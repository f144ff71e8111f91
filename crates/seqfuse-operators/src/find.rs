//! Search stages: `find`, `find_index`, `first`.
//!
//! All three are `single`: they close their fused run and the executor
//! unwraps the run's output to one value, `Null` when nothing matched.

use std::sync::Arc;

use seqfuse_core::lazy::{Cursor, Evaluator, LazyResult};
use seqfuse_core::prelude::{Result, Value};

use crate::callback::PredFn;
use crate::stage::Stage;
use crate::traits::{LazyOperator, Operator};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Report {
    Item,
    Index,
}

pub struct Find {
    name: &'static str,
    pred: Option<PredFn>,
    report: Report,
}

impl Find {
    /// The stage's answer if `item` (at `index`) is the one sought.
    fn probe(&self, item: Value, index: usize) -> Option<Value> {
        if let Some(pred) = &self.pred {
            if !pred(&item) {
                return None;
            }
        }
        Some(match self.report {
            Report::Item => item,
            Report::Index => Value::from(index),
        })
    }
}

impl Operator for Find {
    fn name(&self) -> &'static str {
        self.name
    }

    fn apply(&self, input: Value) -> Result<Value> {
        let items = input.into_sequence(self.name)?;
        Ok(items
            .into_iter()
            .enumerate()
            .find_map(|(i, item)| self.probe(item, i))
            .unwrap_or(Value::Null))
    }
}

impl LazyOperator for Find {
    fn evaluator(&self) -> Box<dyn Evaluator + '_> {
        Box::new(FindEval { op: self })
    }

    fn single(&self) -> bool {
        true
    }
}

struct FindEval<'a> {
    op: &'a Find,
}

impl Evaluator for FindEval<'_> {
    fn eval(&mut self, item: Value, cursor: &Cursor<'_>) -> Result<LazyResult> {
        Ok(match self.op.probe(item, cursor.index) {
            Some(hit) => LazyResult::next(hit).finish(),
            None => LazyResult::skip(),
        })
    }
}

/// First item matching `pred`.
pub fn find<F>(pred: F) -> Stage
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Stage::lazy(Find {
        name: "find",
        pred: Some(Arc::new(pred)),
        report: Report::Item,
    })
}

/// Position of the first item matching `pred`, as `Int`.
pub fn find_index<F>(pred: F) -> Stage
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Stage::lazy(Find {
        name: "find_index",
        pred: Some(Arc::new(pred)),
        report: Report::Index,
    })
}

pub fn first() -> Stage {
    Stage::lazy(Find {
        name: "first",
        pred: None,
        report: Report::Item,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(v: &[i64]) -> Value {
        Value::list(v.to_vec())
    }

    fn gt(n: i64) -> impl Fn(&Value) -> bool + Send + Sync + 'static {
        move |v: &Value| v.as_i64().map(|i| i > n).unwrap_or(false)
    }

    #[test]
    fn eager_search() {
        let src = ints(&[4, 9, 2, 11]);
        assert_eq!(find(gt(5)).apply(src.clone()).unwrap(), Value::Int(9));
        assert_eq!(find_index(gt(5)).apply(src.clone()).unwrap(), Value::Int(1));
        assert_eq!(first().apply(src.clone()).unwrap(), Value::Int(4));
        assert_eq!(find(gt(50)).apply(src).unwrap(), Value::Null);
        assert_eq!(first().apply(ints(&[])).unwrap(), Value::Null);
    }

    #[test]
    fn evaluator_finishes_on_hit() {
        let stage = find_index(gt(5));
        assert!(stage.is_single());
        let mut ev = stage.as_lazy().unwrap().evaluator();
        assert_eq!(
            ev.eval(Value::Int(1), &Cursor::unindexed(0)).unwrap(),
            LazyResult::skip()
        );
        assert_eq!(
            ev.eval(Value::Int(7), &Cursor::unindexed(1)).unwrap(),
            LazyResult::next(Value::Int(1)).finish()
        );
    }
}
