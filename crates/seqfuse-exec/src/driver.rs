//! Single-pass driver for one fused run.
//!
//! Work is an explicit LIFO stack of `(item, next_stage)` pairs. `Many`
//! results are pushed in reverse at `next_stage + 1` so they pop in order,
//! which makes expansion depth-first: every produced item reaches the end of
//! the run (or is dropped) before its next sibling is looked at.
//!
//! Entries are pushed at positions at least as large as anything below them
//! on the stack. When stage `k` reports done, everything still waiting for a
//! stage `<= k` can be discarded; the rest is drained and no further source
//! item is pulled.

use seqfuse_core::lazy::{Cursor, Evaluator, LazyResult};
use seqfuse_core::prelude::{EngineConfig, Error, Result, Value};
use seqfuse_operators::Stage;

use crate::metrics::{self, RunStats};

/// One evaluator plus the bookkeeping the driver keeps for it.
struct Slot<'a> {
    name: &'static str,
    ev: Box<dyn Evaluator + 'a>,
    indexed: bool,
    count: usize,
    seen: Vec<Value>,
}

impl<'a> Slot<'a> {
    fn new(stage: &'a Stage) -> Result<Self> {
        let op = stage.as_lazy().ok_or_else(|| {
            Error::Invariant(format!("eager stage '{}' inside a fused run", stage.name()))
        })?;
        Ok(Self {
            name: op.name(),
            ev: op.evaluator(),
            indexed: op.indexed(),
            count: 0,
            seen: Vec::new(),
        })
    }

    fn feed(&mut self, item: Value) -> Result<LazyResult> {
        let index = self.count;
        self.count += 1;
        if self.indexed {
            self.seen.push(item.clone());
            self.ev.eval(item, &Cursor::new(index, &self.seen))
        } else {
            self.ev.eval(item, &Cursor::unindexed(index))
        }
    }
}

/// Drive `stages` (all lazy) over `source` in one pass.
///
/// Returns the collected list, or for a `single` run the first value that
/// made it through every stage (`Null` if none did). The first evaluator
/// error aborts the run and discards everything collected so far.
pub fn drive<I>(
    stages: &[Stage],
    single: bool,
    source: I,
    cfg: &EngineConfig,
    stats: &mut RunStats,
) -> Result<Value>
where
    I: IntoIterator<Item = Value>,
{
    let mut slots = stages.iter().map(Slot::new).collect::<Result<Vec<_>>>()?;
    let end = slots.len();

    let mut out = Vec::new();
    let mut captured: Option<Value> = None;
    let mut stack: Vec<(Value, usize)> = Vec::new();
    let mut stopped = false;

    for item in source {
        stats.items_pulled += 1;
        stack.push((item, 0));

        while let Some((mut item, mut pos)) = stack.pop() {
            loop {
                if pos == end {
                    if single {
                        captured = Some(item);
                        stack.clear();
                        stopped = true;
                    } else {
                        out.push(item);
                    }
                    break;
                }

                let slot = &mut slots[pos];
                stats.evaluator_calls += 1;
                let result = slot.feed(item)?;
                if cfg.trace_items {
                    metrics::trace_item(slot.name, slot.count - 1, &result);
                }

                if result.is_done() {
                    stopped = true;
                    stack.retain(|(_, p)| *p > pos);
                }

                match result {
                    LazyResult::Empty { .. } => break,
                    LazyResult::Single { next, .. } => {
                        item = next;
                        pos += 1;
                    }
                    LazyResult::Many { items, .. } => {
                        stack.extend(items.into_iter().rev().map(|v| (v, pos + 1)));
                        break;
                    }
                }
            }
        }

        if stopped {
            break;
        }
    }

    if single {
        stats.outputs = u64::from(captured.is_some());
        Ok(captured.unwrap_or(Value::Null))
    } else {
        stats.outputs = out.len() as u64;
        Ok(Value::List(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqfuse_operators::{filter, find, flatten, map, take, uniq};

    fn ints(v: &[i64]) -> Vec<Value> {
        v.iter().copied().map(Value::Int).collect()
    }

    fn run(stages: &[Stage], single: bool, src: Vec<Value>) -> (Value, RunStats) {
        let mut stats = RunStats::default();
        let out = drive(stages, single, src, &EngineConfig::default(), &mut stats).unwrap();
        (out, stats)
    }

    #[test]
    fn take_stops_pulling() {
        let stages = vec![uniq(), take(3)];
        let (out, stats) = run(&stages, false, ints(&[1, 2, 2, 5, 1, 6, 7]));
        assert_eq!(out, Value::list(ints(&[1, 2, 5])));
        assert_eq!(stats.items_pulled, 4);
        assert_eq!(stats.outputs, 3);
    }

    #[test]
    fn expansion_is_depth_first() {
        let src = vec![Value::list(ints(&[1, 2, 3])), Value::list(ints(&[4, 5]))];
        let stages = vec![flatten(), map(|v| Value::Int(v.as_i64().unwrap_or(0) * 10)), take(2)];
        let (out, stats) = run(&stages, false, src);
        assert_eq!(out, Value::list(ints(&[10, 20])));
        // the second source list is never pulled; item 3 is discarded
        assert_eq!(stats.items_pulled, 1);
        assert_eq!(stats.evaluator_calls, 1 + 2 + 2);
    }

    #[test]
    fn single_run_captures_first_value() {
        let src = vec![Value::list(ints(&[1, 2])), Value::Int(3), Value::list(ints(&[4, 5]))];
        let stages = vec![flatten(), find(|v| v.as_i64().map(|i| i - 1 == 2).unwrap_or(false))];
        let (out, stats) = run(&stages, true, src);
        assert_eq!(out, Value::Int(3));
        assert_eq!(stats.items_pulled, 2);
        // flatten twice, find three times
        assert_eq!(stats.evaluator_calls, 5);
    }

    #[test]
    fn empty_source_never_evaluates() {
        let stages = vec![filter(|_| true), find(|_| true)];
        let (out, stats) = run(&stages, true, vec![]);
        assert_eq!(out, Value::Null);
        assert_eq!(stats.evaluator_calls, 0);

        let (out, _) = run(&stages[..1], false, vec![]);
        assert_eq!(out, Value::list(Vec::<Value>::new()));
    }

    #[test]
    fn indexed_evaluators_see_their_own_inputs() {
        let stages = vec![
            filter(|v| v.as_i64().map(|i| i % 2 == 0).unwrap_or(false)),
            seqfuse_operators::map_indexed(|v, i, seen| {
                Value::list(vec![v.clone(), Value::from(i), Value::from(seen.len())])
            }),
        ];
        let (out, _) = run(&stages, false, ints(&[1, 2, 3, 4]));
        assert_eq!(
            out,
            Value::list(vec![
                Value::list(ints(&[2, 0, 1])),
                Value::list(ints(&[4, 1, 2])),
            ])
        );
    }

    #[test]
    fn eager_stage_in_run_is_an_invariant_error() {
        let stages = vec![seqfuse_operators::reverse()];
        let mut stats = RunStats::default();
        let err = drive(&stages, false, ints(&[1]), &EngineConfig::default(), &mut stats);
        assert!(matches!(err, Err(Error::Invariant(_))));
    }
}
