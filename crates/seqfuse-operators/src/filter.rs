//! Selection stages: `filter`, `try_filter`, `filter_indexed`, `reject`,
//! `compact`.

use std::fmt::Display;

use seqfuse_core::lazy::{Cursor, Evaluator, LazyResult};
use seqfuse_core::prelude::{Result, Value};

use crate::callback::{eager_cursor, Callback};
use crate::stage::Stage;
use crate::traits::{LazyOperator, Operator};

pub struct Filter {
    name: &'static str,
    pred: Callback<bool>,
    /// Keep items the predicate rejects (`reject`).
    invert: bool,
}

impl Filter {
    fn keep(&self, item: &Value, cursor: &Cursor<'_>) -> Result<bool> {
        Ok(self.pred.call(item, cursor)? != self.invert)
    }
}

impl Operator for Filter {
    fn name(&self) -> &'static str {
        self.name
    }

    fn apply(&self, input: Value) -> Result<Value> {
        let items = input.into_sequence(self.name)?;
        let indexed = self.pred.is_indexed();

        let mut keep = Vec::with_capacity(items.len());
        for i in 0..items.len() {
            keep.push(self.keep(&items[i], &eager_cursor(&items, i, indexed))?);
        }

        Ok(Value::List(
            items
                .into_iter()
                .zip(keep)
                .filter_map(|(item, k)| k.then_some(item))
                .collect(),
        ))
    }
}

impl LazyOperator for Filter {
    fn evaluator(&self) -> Box<dyn Evaluator + '_> {
        Box::new(FilterEval { op: self })
    }

    fn indexed(&self) -> bool {
        self.pred.is_indexed()
    }
}

struct FilterEval<'a> {
    op: &'a Filter,
}

impl Evaluator for FilterEval<'_> {
    fn eval(&mut self, item: Value, cursor: &Cursor<'_>) -> Result<LazyResult> {
        let keep = self.op.keep(&item, cursor)?;
        Ok(LazyResult::keep_if(keep, item))
    }
}

pub fn filter<F>(pred: F) -> Stage
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Stage::lazy(Filter {
        name: "filter",
        pred: Callback::plain(pred),
        invert: false,
    })
}

/// Selection whose predicate can fail; the first error aborts the run.
pub fn try_filter<F, E>(pred: F) -> Stage
where
    F: Fn(&Value) -> std::result::Result<bool, E> + Send + Sync + 'static,
    E: Display + 'static,
{
    Stage::lazy(Filter {
        name: "try_filter",
        pred: Callback::fallible("try_filter", pred),
        invert: false,
    })
}

/// Selection receiving `(item, index, items_so_far)`.
pub fn filter_indexed<F>(pred: F) -> Stage
where
    F: Fn(&Value, usize, &[Value]) -> bool + Send + Sync + 'static,
{
    Stage::lazy(Filter {
        name: "filter_indexed",
        pred: Callback::indexed(pred),
        invert: false,
    })
}

/// Drop the items matching `pred`.
pub fn reject<F>(pred: F) -> Stage
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Stage::lazy(Filter {
        name: "reject",
        pred: Callback::plain(pred),
        invert: true,
    })
}

/// Drop falsy items (`null`, `false`, `0`, `0.0`, `NaN`, `""`).
pub fn compact() -> Stage {
    Stage::lazy(Filter {
        name: "compact",
        pred: Callback::plain(Value::is_truthy),
        invert: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(v: &[i64]) -> Value {
        Value::list(v.to_vec())
    }

    fn is_even(v: &Value) -> bool {
        v.as_i64().map(|i| i % 2 == 0).unwrap_or(false)
    }

    #[test]
    fn filter_and_reject_partition() {
        let src = ints(&[1, 2, 3, 4, 5]);
        assert_eq!(filter(is_even).apply(src.clone()).unwrap(), ints(&[2, 4]));
        assert_eq!(reject(is_even).apply(src).unwrap(), ints(&[1, 3, 5]));
    }

    #[test]
    fn compact_drops_falsy_values() {
        let src = Value::list(vec![
            Value::Int(0),
            Value::Int(1),
            Value::Null,
            Value::from(""),
            Value::from("a"),
            Value::Bool(false),
        ]);
        assert_eq!(
            compact().apply(src).unwrap(),
            Value::list(vec![Value::Int(1), Value::from("a")])
        );
    }

    #[test]
    fn indexed_filter_uses_positions() {
        let stage = filter_indexed(|_, i, _| i % 2 == 1);
        assert_eq!(stage.apply(ints(&[10, 11, 12, 13])).unwrap(), ints(&[11, 13]));
    }

    #[test]
    fn try_filter_reports_errors() {
        let stage = try_filter(|v: &Value| v.as_i64().map(|i| i > 1).ok_or("bad item"));
        assert_eq!(stage.apply(ints(&[1, 2])).unwrap(), ints(&[2]));
        assert!(stage.apply(Value::list(vec![Value::from("x")])).is_err());
    }

    #[test]
    fn evaluator_skips_rejected_items() {
        let stage = filter(is_even);
        let mut ev = stage.as_lazy().unwrap().evaluator();
        let c = Cursor::unindexed(0);
        assert_eq!(ev.eval(Value::Int(1), &c).unwrap(), LazyResult::skip());
        assert_eq!(
            ev.eval(Value::Int(2), &c).unwrap(),
            LazyResult::next(Value::Int(2))
        );
    }
}
