//! Set stages against a reference sequence bound at construction:
//! `difference`, `difference_by`, `difference_with`, `intersection`,
//! `intersection_by`, `intersection_with`.
//!
//! The plain and `_by` forms have multiset semantics: each reference element
//! cancels (difference) or matches (intersection) at most one item. Counts
//! live in a hash map built once per evaluator. The `_with` forms only have a
//! custom equality, so they use set semantics and a linear scan.

use std::collections::HashMap;
use std::sync::Arc;

use seqfuse_core::lazy::{Cursor, Evaluator, LazyResult};
use seqfuse_core::prelude::{Result, Value};

use crate::callback::{EqFn, KeyFn};
use crate::stage::Stage;
use crate::traits::{LazyOperator, Operator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetKind {
    Difference,
    Intersection,
}

enum Matching {
    /// Multiset of reference keys; `key = None` compares items directly.
    Counted {
        key: Option<KeyFn>,
        other_keys: Vec<Value>,
    },
    Scan {
        other: Vec<Value>,
        eq: EqFn,
    },
}

pub struct SetOp {
    name: &'static str,
    kind: SetKind,
    matching: Matching,
}

struct Multiset {
    counts: HashMap<Value, usize>,
    remaining: usize,
}

impl Multiset {
    fn new(keys: &[Value]) -> Self {
        let mut counts = HashMap::with_capacity(keys.len());
        for k in keys {
            *counts.entry(k.clone()).or_insert(0) += 1;
        }
        Self {
            counts,
            remaining: keys.len(),
        }
    }

    /// Consume one occurrence of `key` if any is left.
    fn take_one(&mut self, key: &Value) -> bool {
        match self.counts.get_mut(key) {
            Some(n) if *n > 0 => {
                *n -= 1;
                self.remaining -= 1;
                true
            }
            _ => false,
        }
    }

    fn is_empty(&self) -> bool {
        self.remaining == 0
    }
}

enum SetState<'a> {
    Counted {
        kind: SetKind,
        key: Option<&'a KeyFn>,
        counts: Multiset,
    },
    Scan {
        kind: SetKind,
        other: &'a [Value],
        eq: &'a EqFn,
    },
}

impl<'a> SetState<'a> {
    fn new(op: &'a SetOp) -> Self {
        match &op.matching {
            Matching::Counted { key, other_keys } => SetState::Counted {
                kind: op.kind,
                key: key.as_ref(),
                counts: Multiset::new(other_keys),
            },
            Matching::Scan { other, eq } => SetState::Scan {
                kind: op.kind,
                other,
                eq,
            },
        }
    }

    fn step(&mut self, item: Value) -> LazyResult {
        match self {
            SetState::Counted { kind, key, counts } => {
                if *kind == SetKind::Intersection && counts.is_empty() {
                    return LazyResult::exhausted();
                }
                let k = match key {
                    Some(f) => f(&item),
                    None => item.clone(),
                };
                let matched = counts.take_one(&k);
                match kind {
                    SetKind::Difference => LazyResult::keep_if(!matched, item),
                    SetKind::Intersection => LazyResult::keep_if(matched, item)
                        .with_done(counts.is_empty()),
                }
            }
            SetState::Scan { kind, other, eq } => {
                if *kind == SetKind::Intersection && other.is_empty() {
                    return LazyResult::exhausted();
                }
                let found = other.iter().any(|o| eq(&item, o));
                LazyResult::keep_if(found == (*kind == SetKind::Intersection), item)
            }
        }
    }
}

impl Evaluator for SetState<'_> {
    fn eval(&mut self, item: Value, _cursor: &Cursor<'_>) -> Result<LazyResult> {
        Ok(self.step(item))
    }
}

impl Operator for SetOp {
    fn name(&self) -> &'static str {
        self.name
    }

    fn apply(&self, input: Value) -> Result<Value> {
        let items = input.into_sequence(self.name)?;
        let mut state = SetState::new(self);
        let mut out = Vec::new();
        for item in items {
            let result = state.step(item);
            let done = result.is_done();
            if let LazyResult::Single { next, .. } = result {
                out.push(next);
            }
            if done {
                break;
            }
        }
        Ok(Value::List(out))
    }
}

impl LazyOperator for SetOp {
    fn evaluator(&self) -> Box<dyn Evaluator + '_> {
        Box::new(SetState::new(self))
    }
}

fn collect<V, I>(other: I) -> Vec<Value>
where
    V: Into<Value>,
    I: IntoIterator<Item = V>,
{
    other.into_iter().map(Into::into).collect()
}

fn counted(name: &'static str, kind: SetKind, other: Vec<Value>, key: Option<KeyFn>) -> Stage {
    let other_keys = match &key {
        Some(f) => other.iter().map(|o| f(o)).collect(),
        None => other,
    };
    Stage::lazy(SetOp {
        name,
        kind,
        matching: Matching::Counted { key, other_keys },
    })
}

fn scan(name: &'static str, kind: SetKind, other: Vec<Value>, eq: EqFn) -> Stage {
    Stage::lazy(SetOp {
        name,
        kind,
        matching: Matching::Scan { other, eq },
    })
}

/// Items not cancelled by an equal element of `other` (multiset).
pub fn difference<V, I>(other: I) -> Stage
where
    V: Into<Value>,
    I: IntoIterator<Item = V>,
{
    counted("difference", SetKind::Difference, collect(other), None)
}

/// Like [`difference`], comparing `key(item)` with `key(reference)`.
pub fn difference_by<V, I, F>(other: I, key: F) -> Stage
where
    V: Into<Value>,
    I: IntoIterator<Item = V>,
    F: Fn(&Value) -> Value + Send + Sync + 'static,
{
    counted(
        "difference_by",
        SetKind::Difference,
        collect(other),
        Some(Arc::new(key)),
    )
}

/// Items with no `eq`-equal element in `other` (set semantics).
pub fn difference_with<V, I, F>(other: I, eq: F) -> Stage
where
    V: Into<Value>,
    I: IntoIterator<Item = V>,
    F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
{
    scan(
        "difference_with",
        SetKind::Difference,
        collect(other),
        Arc::new(eq),
    )
}

/// Items matched by an unused equal element of `other` (multiset).
/// Reports `done` once every reference element has been matched.
pub fn intersection<V, I>(other: I) -> Stage
where
    V: Into<Value>,
    I: IntoIterator<Item = V>,
{
    counted("intersection", SetKind::Intersection, collect(other), None)
}

/// Like [`intersection`], comparing `key(item)` with `key(reference)`.
pub fn intersection_by<V, I, F>(other: I, key: F) -> Stage
where
    V: Into<Value>,
    I: IntoIterator<Item = V>,
    F: Fn(&Value) -> Value + Send + Sync + 'static,
{
    counted(
        "intersection_by",
        SetKind::Intersection,
        collect(other),
        Some(Arc::new(key)),
    )
}

/// Items with some `eq`-equal element in `other` (set semantics).
pub fn intersection_with<V, I, F>(other: I, eq: F) -> Stage
where
    V: Into<Value>,
    I: IntoIterator<Item = V>,
    F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
{
    scan(
        "intersection_with",
        SetKind::Intersection,
        collect(other),
        Arc::new(eq),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(v: &[i64]) -> Value {
        Value::list(v.to_vec())
    }

    fn by_a(v: &Value) -> Value {
        v.get("a").cloned().unwrap_or(Value::Null)
    }

    fn row(a: i64) -> Value {
        Value::record([("a", a)])
    }

    #[test]
    fn difference_cancels_one_occurrence_per_element() {
        let out = difference(vec![1, 2]).apply(ints(&[1, 1, 2, 2, 3])).unwrap();
        assert_eq!(out, ints(&[1, 2, 3]));
    }

    #[test]
    fn difference_by_compares_keys() {
        let stage = difference_by(vec![row(2), row(3)], by_a);
        let src = Value::list(vec![row(1), row(2), row(3), row(4)]);
        assert_eq!(
            stage.apply(src).unwrap(),
            Value::list(vec![row(1), row(4)])
        );
    }

    #[test]
    fn intersection_is_multiset_and_finishes_early() {
        let stage = intersection(vec![2, 2, 5]);
        assert_eq!(
            stage.apply(ints(&[1, 2, 2, 2, 5, 5])).unwrap(),
            ints(&[2, 2, 5])
        );

        let mut ev = stage.as_lazy().unwrap().evaluator();
        let c = Cursor::unindexed(0);
        assert_eq!(ev.eval(Value::Int(2), &c).unwrap(), LazyResult::next(Value::Int(2)));
        assert_eq!(ev.eval(Value::Int(2), &c).unwrap(), LazyResult::next(Value::Int(2)));
        assert_eq!(
            ev.eval(Value::Int(5), &c).unwrap(),
            LazyResult::next(Value::Int(5)).finish()
        );
    }

    #[test]
    fn intersection_with_empty_reference_is_exhausted() {
        let stage = intersection(Vec::<Value>::new());
        let mut ev = stage.as_lazy().unwrap().evaluator();
        assert_eq!(
            ev.eval(Value::Int(1), &Cursor::unindexed(0)).unwrap(),
            LazyResult::exhausted()
        );
        assert_eq!(stage.apply(ints(&[1, 2])).unwrap(), ints(&[]));
    }

    #[test]
    fn with_variants_use_set_semantics() {
        let same_parity = |a: &Value, b: &Value| match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => x % 2 == y % 2,
            _ => false,
        };
        let src = ints(&[1, 2, 3, 4]);
        assert_eq!(
            difference_with(vec![2], same_parity).apply(src.clone()).unwrap(),
            ints(&[1, 3])
        );
        assert_eq!(
            intersection_with(vec![2], same_parity).apply(src).unwrap(),
            ints(&[2, 4])
        );
    }

    #[test]
    fn intersection_by_uses_keys() {
        let stage = intersection_by(vec![row(3)], by_a);
        let src = Value::list(vec![row(1), row(3), row(3)]);
        assert_eq!(stage.apply(src).unwrap(), Value::list(vec![row(3)]));
    }
}
