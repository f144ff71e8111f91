//! User callbacks bound into stages at construction time.
//!
//! Everything is `Arc<dyn Fn .. + Send + Sync>` so stages stay shareable and
//! evaluators can borrow the callback for the length of a run.

use std::fmt::Display;
use std::sync::Arc;

use seqfuse_core::lazy::Cursor;
use seqfuse_core::prelude::{Error, Result, Value};

/// Derives a key or projection from an item.
pub type KeyFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Plain predicate.
pub type PredFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Custom equality between an item and a reference element.
pub type EqFn = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

type PlainFn<R> = Arc<dyn Fn(&Value) -> Result<R> + Send + Sync>;
type IndexedFn<R> = Arc<dyn Fn(&Value, usize, &[Value]) -> Result<R> + Send + Sync>;

/// A per-item callback that may want the running index and the items seen
/// so far.
pub enum Callback<R> {
    Plain(PlainFn<R>),
    Indexed(IndexedFn<R>),
}

impl<R> Clone for Callback<R> {
    fn clone(&self) -> Self {
        match self {
            Callback::Plain(f) => Callback::Plain(Arc::clone(f)),
            Callback::Indexed(f) => Callback::Indexed(Arc::clone(f)),
        }
    }
}

impl<R: 'static> Callback<R> {
    pub fn plain<F>(f: F) -> Self
    where
        F: Fn(&Value) -> R + Send + Sync + 'static,
    {
        Callback::Plain(Arc::new(move |v: &Value| Ok(f(v))))
    }

    /// Wrap a fallible callback; its errors are reported against `stage`.
    pub fn fallible<F, E>(stage: &'static str, f: F) -> Self
    where
        F: Fn(&Value) -> std::result::Result<R, E> + Send + Sync + 'static,
        E: Display + 'static,
    {
        Callback::Plain(Arc::new(move |v: &Value| {
            f(v).map_err(|e| Error::eval(stage, e.to_string()))
        }))
    }

    pub fn indexed<F>(f: F) -> Self
    where
        F: Fn(&Value, usize, &[Value]) -> R + Send + Sync + 'static,
    {
        Callback::Indexed(Arc::new(move |v: &Value, i: usize, seen: &[Value]| {
            Ok(f(v, i, seen))
        }))
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self, Callback::Indexed(_))
    }

    pub fn call(&self, item: &Value, cursor: &Cursor<'_>) -> Result<R> {
        match self {
            Callback::Plain(f) => f(item),
            Callback::Indexed(f) => f(item, cursor.index, cursor.seen),
        }
    }
}

/// Cursor for item `i` of a fully materialized input, matching what the
/// fused driver would hand the same stage.
pub(crate) fn eager_cursor(items: &[Value], i: usize, indexed: bool) -> Cursor<'_> {
    if indexed {
        Cursor::new(i, &items[..=i])
    } else {
        Cursor::unindexed(i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallible_errors_carry_the_stage_name() {
        let cb: Callback<Value> = Callback::fallible("try_map", |v: &Value| {
            v.as_i64().map(Value::Int).ok_or("not an int")
        });
        let cursor = Cursor::unindexed(0);
        assert_eq!(cb.call(&Value::Int(3), &cursor).unwrap(), Value::Int(3));

        let err = cb.call(&Value::from("x"), &cursor).unwrap_err();
        assert_eq!(err.to_string(), "Stage 'try_map' failed: not an int");
    }

    #[test]
    fn indexed_callbacks_see_the_prefix() {
        let items = vec![Value::Int(5), Value::Int(6), Value::Int(7)];
        let cb: Callback<usize> = Callback::indexed(|_, i, seen| i * 10 + seen.len());
        assert!(cb.is_indexed());
        assert_eq!(cb.call(&items[1], &eager_cursor(&items, 1, true)).unwrap(), 12);
        assert!(eager_cursor(&items, 2, false).seen.is_empty());
    }
}
