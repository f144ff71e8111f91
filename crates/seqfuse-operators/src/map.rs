//! Projection stages: `map`, `try_map`, `map_indexed`, `pluck`.

use std::fmt::Display;

use seqfuse_core::lazy::{Cursor, Evaluator, LazyResult};
use seqfuse_core::prelude::{Result, Value};

use crate::callback::{eager_cursor, Callback};
use crate::expr::FieldPath;
use crate::stage::Stage;
use crate::traits::{LazyOperator, Operator};

pub struct Map {
    name: &'static str,
    f: Callback<Value>,
}

impl Operator for Map {
    fn name(&self) -> &'static str {
        self.name
    }

    fn apply(&self, input: Value) -> Result<Value> {
        let items = input.into_sequence(self.name)?;
        let indexed = self.f.is_indexed();
        let out = (0..items.len())
            .map(|i| self.f.call(&items[i], &eager_cursor(&items, i, indexed)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::List(out))
    }
}

impl LazyOperator for Map {
    fn evaluator(&self) -> Box<dyn Evaluator + '_> {
        Box::new(MapEval { f: &self.f })
    }

    fn indexed(&self) -> bool {
        self.f.is_indexed()
    }
}

struct MapEval<'a> {
    f: &'a Callback<Value>,
}

impl Evaluator for MapEval<'_> {
    fn eval(&mut self, item: Value, cursor: &Cursor<'_>) -> Result<LazyResult> {
        Ok(LazyResult::next(self.f.call(&item, cursor)?))
    }
}

pub fn map<F>(f: F) -> Stage
where
    F: Fn(&Value) -> Value + Send + Sync + 'static,
{
    Stage::lazy(Map {
        name: "map",
        f: Callback::plain(f),
    })
}

/// Projection that can fail; the first error aborts the run.
pub fn try_map<F, E>(f: F) -> Stage
where
    F: Fn(&Value) -> std::result::Result<Value, E> + Send + Sync + 'static,
    E: Display + 'static,
{
    Stage::lazy(Map {
        name: "try_map",
        f: Callback::fallible("try_map", f),
    })
}

/// Projection receiving `(item, index, items_so_far)`.
pub fn map_indexed<F>(f: F) -> Stage
where
    F: Fn(&Value, usize, &[Value]) -> Value + Send + Sync + 'static,
{
    Stage::lazy(Map {
        name: "map_indexed",
        f: Callback::indexed(f),
    })
}

/// Project every item to the value at `path` (`Null` when missing).
pub fn pluck(path: &str) -> Result<Stage> {
    let path = FieldPath::parse(path)?;
    Ok(Stage::lazy(Map {
        name: "pluck",
        f: Callback::plain(move |v| path.extract(v)),
    }))
}
