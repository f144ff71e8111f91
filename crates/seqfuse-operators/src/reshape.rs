//! Eager-only stages. These need the whole sequence before they can emit
//! anything, so they never join a fused run.

use std::collections::BTreeMap;
use std::sync::Arc;

use seqfuse_core::prelude::{Error, Result, Value};

use crate::callback::KeyFn;
use crate::stage::Stage;
use crate::traits::Operator;

pub struct SortBy {
    key: KeyFn,
}

impl Operator for SortBy {
    fn name(&self) -> &'static str {
        "sort_by"
    }

    fn apply(&self, input: Value) -> Result<Value> {
        let items = input.into_sequence(self.name())?;
        let mut keyed: Vec<(Value, Value)> =
            items.into_iter().map(|v| ((self.key)(&v), v)).collect();
        // stable: equal keys keep input order
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(Value::List(keyed.into_iter().map(|(_, v)| v).collect()))
    }
}

pub struct Reverse;

impl Operator for Reverse {
    fn name(&self) -> &'static str {
        "reverse"
    }

    fn apply(&self, input: Value) -> Result<Value> {
        let mut items = input.into_sequence(self.name())?;
        items.reverse();
        Ok(Value::List(items))
    }
}

pub struct GroupBy {
    key: KeyFn,
}

impl Operator for GroupBy {
    fn name(&self) -> &'static str {
        "group_by"
    }

    fn apply(&self, input: Value) -> Result<Value> {
        let items = input.into_sequence(self.name())?;
        let mut groups: BTreeMap<String, Vec<Value>> = BTreeMap::new();
        for item in items {
            let key = (self.key)(&item).key_string();
            groups.entry(key).or_default().push(item);
        }
        Ok(Value::Record(
            groups
                .into_iter()
                .map(|(k, members)| (k, Value::List(members)))
                .collect(),
        ))
    }
}

pub struct Chunk {
    size: usize,
}

impl Operator for Chunk {
    fn name(&self) -> &'static str {
        "chunk"
    }

    fn apply(&self, input: Value) -> Result<Value> {
        let items = input.into_sequence(self.name())?;
        Ok(Value::List(
            items
                .chunks(self.size)
                .map(|c| Value::List(c.to_vec()))
                .collect(),
        ))
    }
}

type EagerFn = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;

/// Caller-supplied whole-value function.
pub struct Custom {
    name: &'static str,
    f: EagerFn,
}

impl Operator for Custom {
    fn name(&self) -> &'static str {
        self.name
    }

    fn apply(&self, input: Value) -> Result<Value> {
        (self.f)(input)
    }
}

/// Stable sort by a derived key (total order over `Value`).
pub fn sort_by<F>(key: F) -> Stage
where
    F: Fn(&Value) -> Value + Send + Sync + 'static,
{
    Stage::eager(SortBy { key: Arc::new(key) })
}

pub fn reverse() -> Stage {
    Stage::eager(Reverse)
}

/// Record mapping each key (as a string) to the items that share it.
pub fn group_by<F>(key: F) -> Stage
where
    F: Fn(&Value) -> Value + Send + Sync + 'static,
{
    Stage::eager(GroupBy { key: Arc::new(key) })
}

/// Consecutive lists of `size` items; the last may be shorter.
pub fn chunk(size: usize) -> Result<Stage> {
    if size == 0 {
        return Err(Error::Config("chunk size must be at least 1".into()));
    }
    Ok(Stage::eager(Chunk { size }))
}

/// Wrap an arbitrary value -> value function as an opaque stage.
pub fn eager<F>(name: &'static str, f: F) -> Stage
where
    F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
{
    Stage::eager(Custom {
        name,
        f: Arc::new(f),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(v: &[i64]) -> Value {
        Value::list(v.to_vec())
    }

    fn row(name: &str, team: &str) -> Value {
        Value::record([("name", name), ("team", team)])
    }

    fn team(v: &Value) -> Value {
        v.get("team").cloned().unwrap_or_default()
    }

    #[test]
    fn sort_by_is_stable() {
        let rows = Value::list(vec![row("a", "y"), row("b", "x"), row("c", "y")]);
        let out = sort_by(team).apply(rows).unwrap();
        assert_eq!(
            out,
            Value::list(vec![row("b", "x"), row("a", "y"), row("c", "y")])
        );
    }

    #[test]
    fn reverse_and_chunk() {
        assert_eq!(reverse().apply(ints(&[1, 2, 3])).unwrap(), ints(&[3, 2, 1]));
        let out = chunk(2).unwrap().apply(ints(&[1, 2, 3])).unwrap();
        assert_eq!(out, Value::list(vec![ints(&[1, 2]), ints(&[3])]));
        assert!(chunk(0).is_err());
    }

    #[test]
    fn group_by_collects_members() {
        let rows = Value::list(vec![row("a", "y"), row("b", "x"), row("c", "y")]);
        let out = group_by(team).apply(rows).unwrap();
        assert_eq!(
            out.get("y").unwrap(),
            &Value::list(vec![row("a", "y"), row("c", "y")])
        );
        assert_eq!(out.get("x").unwrap(), &Value::list(vec![row("b", "x")]));
    }

    #[test]
    fn custom_stage_may_return_non_sequences() {
        let count = eager("count", |v| Ok(Value::from(v.into_sequence("count")?.len())));
        assert!(!count.is_lazy());
        assert_eq!(count.apply(ints(&[1, 2, 3])).unwrap(), Value::Int(3));
        assert!(count.apply(Value::Null).is_err());
    }
}
