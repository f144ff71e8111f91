//! Truncation stages: `take`, `skip`, `take_while`, `skip_while`.
//!
//! `take` and `take_while` report `done` as soon as they can emit nothing
//! more, which is what lets a fused run stop pulling its source early.

use std::sync::Arc;

use seqfuse_core::lazy::{Cursor, Evaluator, LazyResult};
use seqfuse_core::prelude::{Result, Value};

use crate::callback::PredFn;
use crate::stage::Stage;
use crate::traits::{LazyOperator, Operator};

pub struct Take {
    n: usize,
}

/// Remaining-count state shared by the eager path and the evaluator.
struct TakeState {
    remaining: usize,
}

impl TakeState {
    fn step(&mut self, item: Value) -> LazyResult {
        if self.remaining == 0 {
            return LazyResult::exhausted();
        }
        self.remaining -= 1;
        LazyResult::next(item).with_done(self.remaining == 0)
    }
}

impl Evaluator for TakeState {
    fn eval(&mut self, item: Value, _cursor: &Cursor<'_>) -> Result<LazyResult> {
        Ok(self.step(item))
    }
}

impl Operator for Take {
    fn name(&self) -> &'static str {
        "take"
    }

    fn apply(&self, input: Value) -> Result<Value> {
        let items = input.into_sequence(self.name())?;
        Ok(Value::List(items.into_iter().take(self.n).collect()))
    }
}

impl LazyOperator for Take {
    fn evaluator(&self) -> Box<dyn Evaluator + '_> {
        Box::new(TakeState { remaining: self.n })
    }
}

pub struct Skip {
    n: usize,
}

struct SkipState {
    left: usize,
}

impl Evaluator for SkipState {
    fn eval(&mut self, item: Value, _cursor: &Cursor<'_>) -> Result<LazyResult> {
        if self.left > 0 {
            self.left -= 1;
            return Ok(LazyResult::skip());
        }
        Ok(LazyResult::next(item))
    }
}

impl Operator for Skip {
    fn name(&self) -> &'static str {
        "skip"
    }

    fn apply(&self, input: Value) -> Result<Value> {
        let items = input.into_sequence(self.name())?;
        Ok(Value::List(items.into_iter().skip(self.n).collect()))
    }
}

impl LazyOperator for Skip {
    fn evaluator(&self) -> Box<dyn Evaluator + '_> {
        Box::new(SkipState { left: self.n })
    }
}

pub struct TakeWhile {
    pred: PredFn,
}

struct TakeWhileEval<'a> {
    pred: &'a PredFn,
}

impl Evaluator for TakeWhileEval<'_> {
    fn eval(&mut self, item: Value, _cursor: &Cursor<'_>) -> Result<LazyResult> {
        if (self.pred)(&item) {
            Ok(LazyResult::next(item))
        } else {
            Ok(LazyResult::exhausted())
        }
    }
}

impl Operator for TakeWhile {
    fn name(&self) -> &'static str {
        "take_while"
    }

    fn apply(&self, input: Value) -> Result<Value> {
        let items = input.into_sequence(self.name())?;
        Ok(Value::List(
            items.into_iter().take_while(|v| (self.pred)(v)).collect(),
        ))
    }
}

impl LazyOperator for TakeWhile {
    fn evaluator(&self) -> Box<dyn Evaluator + '_> {
        Box::new(TakeWhileEval { pred: &self.pred })
    }
}

pub struct SkipWhile {
    pred: PredFn,
}

struct SkipWhileEval<'a> {
    pred: &'a PredFn,
    skipping: bool,
}

impl Evaluator for SkipWhileEval<'_> {
    fn eval(&mut self, item: Value, _cursor: &Cursor<'_>) -> Result<LazyResult> {
        if self.skipping && (self.pred)(&item) {
            return Ok(LazyResult::skip());
        }
        self.skipping = false;
        Ok(LazyResult::next(item))
    }
}

impl Operator for SkipWhile {
    fn name(&self) -> &'static str {
        "skip_while"
    }

    fn apply(&self, input: Value) -> Result<Value> {
        let items = input.into_sequence(self.name())?;
        Ok(Value::List(
            items.into_iter().skip_while(|v| (self.pred)(v)).collect(),
        ))
    }
}

impl LazyOperator for SkipWhile {
    fn evaluator(&self) -> Box<dyn Evaluator + '_> {
        Box::new(SkipWhileEval {
            pred: &self.pred,
            skipping: true,
        })
    }
}

/// First `n` items. Reports `done` with the n-th.
pub fn take(n: usize) -> Stage {
    Stage::lazy(Take { n })
}

/// Everything after the first `n` items.
pub fn skip(n: usize) -> Stage {
    Stage::lazy(Skip { n })
}

/// Leading items while `pred` holds. Reports `done` at the first miss.
pub fn take_while<F>(pred: F) -> Stage
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Stage::lazy(TakeWhile {
        pred: Arc::new(pred),
    })
}

/// Everything from the first item where `pred` fails.
pub fn skip_while<F>(pred: F) -> Stage
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Stage::lazy(SkipWhile {
        pred: Arc::new(pred),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(v: &[i64]) -> Value {
        Value::list(v.to_vec())
    }

    fn below(n: i64) -> impl Fn(&Value) -> bool + Send + Sync + 'static {
        move |v: &Value| v.as_i64().map(|i| i < n).unwrap_or(false)
    }

    #[test]
    fn eager_truncation() {
        let src = ints(&[1, 2, 3, 4, 5]);
        assert_eq!(take(2).apply(src.clone()).unwrap(), ints(&[1, 2]));
        assert_eq!(take(10).apply(src.clone()).unwrap(), src);
        assert_eq!(skip(3).apply(src.clone()).unwrap(), ints(&[4, 5]));
        assert_eq!(take_while(below(3)).apply(src.clone()).unwrap(), ints(&[1, 2]));
        assert_eq!(skip_while(below(3)).apply(src).unwrap(), ints(&[3, 4, 5]));
    }

    #[test]
    fn take_reports_done_on_last_item() {
        let stage = take(2);
        let mut ev = stage.as_lazy().unwrap().evaluator();
        let c = Cursor::unindexed(0);
        assert!(!ev.eval(Value::Int(1), &c).unwrap().is_done());
        assert_eq!(
            ev.eval(Value::Int(2), &c).unwrap(),
            LazyResult::next(Value::Int(2)).finish()
        );
        assert_eq!(ev.eval(Value::Int(3), &c).unwrap(), LazyResult::exhausted());
    }

    #[test]
    fn take_zero_is_exhausted_immediately() {
        let stage = take(0);
        let mut ev = stage.as_lazy().unwrap().evaluator();
        assert_eq!(
            ev.eval(Value::Int(1), &Cursor::unindexed(0)).unwrap(),
            LazyResult::exhausted()
        );
    }

    #[test]
    fn skip_while_stops_skipping_once() {
        let stage = skip_while(below(3));
        let mut ev = stage.as_lazy().unwrap().evaluator();
        let c = Cursor::unindexed(0);
        assert_eq!(ev.eval(Value::Int(1), &c).unwrap(), LazyResult::skip());
        assert_eq!(ev.eval(Value::Int(5), &c).unwrap(), LazyResult::next(Value::Int(5)));
        assert_eq!(ev.eval(Value::Int(1), &c).unwrap(), LazyResult::next(Value::Int(1)));
    }

    #[test]
    fn evaluators_are_fresh_per_call() {
        let stage = take(1);
        let op = stage.as_lazy().unwrap();
        let c = Cursor::unindexed(0);
        assert!(op.evaluator().eval(Value::Int(1), &c).unwrap().is_done());
        assert_eq!(
            op.evaluator().eval(Value::Int(9), &c).unwrap(),
            LazyResult::next(Value::Int(9)).finish()
        );
    }
}
