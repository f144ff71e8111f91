//! Run statistics and tracing hooks.
//!
//! Without the `tracing` feature the hooks compile to no-ops; `RunStats` is
//! always collected and handed back to the caller.

use serde::{Deserialize, Serialize};

use seqfuse_core::lazy::LazyResult;
use seqfuse_planner::FusionPlan;

/// Counters for one `Engine` run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Source items pulled by fused runs.
    pub items_pulled: u64,
    /// `Evaluator::eval` calls across all fused runs.
    pub evaluator_calls: u64,
    /// Items (or the single value) produced by the final segment.
    pub outputs: u64,
    pub fused_runs: u64,
    /// Stages applied on their own to a materialized value.
    pub eager_stages: u64,
}

#[cfg(feature = "tracing")]
pub fn emit_span(event: &str, key_values: &[(&str, String)]) {
    let span = tracing::debug_span!("seqfuse", event);
    let _enter = span.enter();
    for (k, v) in key_values {
        tracing::debug!(%k, %v, "metric");
    }
}

#[cfg(not(feature = "tracing"))]
pub fn emit_span(_event: &str, _key_values: &[(&str, String)]) {}

/// Summary event for a finished run, tagged with the plan fingerprint.
#[cfg(feature = "tracing")]
pub fn record_run(plan: &FusionPlan, stats: &RunStats) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    let fingerprint = plan
        .fingerprint()
        .map(|h| h.short())
        .unwrap_or_else(|e| e.to_string());
    emit_span(
        "run",
        &[
            ("plan", fingerprint),
            ("segments", plan.segments.len().to_string()),
            ("fused_runs", stats.fused_runs.to_string()),
            ("items_pulled", stats.items_pulled.to_string()),
            ("evaluator_calls", stats.evaluator_calls.to_string()),
            ("outputs", stats.outputs.to_string()),
        ],
    );
}

#[cfg(not(feature = "tracing"))]
pub fn record_run(_plan: &FusionPlan, _stats: &RunStats) {}

/// Per-evaluation event; only called when `trace_items` is on.
#[cfg(feature = "tracing")]
pub fn trace_item(stage: &str, index: usize, result: &LazyResult) {
    let (kind, done) = match result {
        LazyResult::Empty { done } => ("empty", *done),
        LazyResult::Single { done, .. } => ("single", *done),
        LazyResult::Many { items, done } => {
            tracing::trace!(stage, index, expanded = items.len(), done, "eval");
            return;
        }
    };
    tracing::trace!(stage, index, kind, done, "eval");
}

#[cfg(not(feature = "tracing"))]
pub fn trace_item(_stage: &str, _index: usize, _result: &LazyResult) {}
