//! Runtime: plan a stage chain and execute it segment by segment.
//!
//! Behavior:
//! - Chains are validated (non-empty, optional `max_stages`) before any
//!   stage runs.
//! - Eager segments apply their stage to the current materialized value.
//! - Fused segments are driven in one pass when the current value is a
//!   `List` (or the caller's iterator); a single non-list value falls back
//!   to applying the run's stages one at a time.
//! - With `fusion` off every stage is its own eager segment. Fused runs
//!   produce the same value whenever sequential application succeeds.
//! - A fused run that short-circuits never evaluates items past the cutoff,
//!   so an error those items would raise under sequential application is
//!   not raised.

use thiserror::Error;

use seqfuse_core::config::EngineConfig;
use seqfuse_core::prelude::Value;
use seqfuse_operators::Stage;
use seqfuse_planner::{plan_fusion, plan_sequential, FusionPlan, Segment};

use crate::driver::drive;
use crate::metrics::{self, RunStats};

#[derive(Debug, Error)]
pub enum ExecError {
    /// The chain itself is unusable (empty, too long).
    #[error("invalid pipeline: {0}")]
    Config(String),
    /// A stage failed while running.
    #[error(transparent)]
    Stage(#[from] seqfuse_core::error::Error),
}

/// Result of [`Engine::run_with_stats`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    pub value: Value,
    pub stats: RunStats,
}

/// What the next segment consumes: a materialized value, or the caller's
/// iterator if nothing has consumed it yet.
enum Input<I> {
    Value(Value),
    Iter(I),
}

impl<I: Iterator<Item = Value>> Input<I> {
    fn materialize(self) -> Value {
        match self {
            Input::Value(v) => v,
            Input::Iter(it) => Value::List(it.collect()),
        }
    }
}

/// Engine owns the configuration; stages are borrowed per run.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    cfg: EngineConfig,
}

impl Engine {
    pub fn new(cfg: EngineConfig) -> Self {
        Self { cfg }
    }

    /// Engine configured from `SEQFUSE_*` environment variables.
    pub fn from_env() -> Self {
        Self::new(EngineConfig::from_env())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Validate `stages` and return the plan `run` would follow.
    pub fn plan(&self, stages: &[Stage]) -> Result<FusionPlan, ExecError> {
        if stages.is_empty() {
            return Err(ExecError::Config("pipeline needs at least one stage".into()));
        }
        if let Some(max) = self.cfg.max_stages {
            if stages.len() > max {
                return Err(ExecError::Config(format!(
                    "{} stages exceed the configured maximum of {}",
                    stages.len(),
                    max
                )));
            }
        }
        Ok(if self.cfg.fusion {
            plan_fusion(stages)
        } else {
            plan_sequential(stages)
        })
    }

    pub fn run(&self, source: Value, stages: &[Stage]) -> Result<Value, ExecError> {
        Ok(self.run_with_stats(source, stages)?.value)
    }

    /// Run with an arbitrary item source. Items are pulled lazily: a chain
    /// that short-circuits stops consuming `source` early.
    pub fn run_iter<S>(&self, source: S, stages: &[Stage]) -> Result<Value, ExecError>
    where
        S: IntoIterator<Item = Value>,
    {
        let out = self.execute(Input::Iter(source.into_iter()), stages)?;
        Ok(out.value)
    }

    pub fn run_with_stats(&self, source: Value, stages: &[Stage]) -> Result<RunOutput, ExecError> {
        self.execute(Input::<std::iter::Empty<Value>>::Value(source), stages)
    }

    fn execute<I>(&self, source: Input<I>, stages: &[Stage]) -> Result<RunOutput, ExecError>
    where
        I: Iterator<Item = Value>,
    {
        let plan = self.plan(stages)?;
        let mut stats = RunStats::default();
        let mut current = source;
        // the driver counts outputs of the run it drove last
        let mut driven_last = false;

        for segment in &plan.segments {
            driven_last = false;
            let range = segment.stages();
            let value = match segment {
                Segment::Eager { .. } => {
                    stats.eager_stages += 1;
                    stages[range.start].apply(current.materialize())?
                }
                Segment::Fused { single, .. } => {
                    let run = &stages[range];
                    match current {
                        Input::Iter(it) => {
                            stats.fused_runs += 1;
                            driven_last = true;
                            drive(run, *single, it, &self.cfg, &mut stats)?
                        }
                        Input::Value(Value::List(items)) => {
                            stats.fused_runs += 1;
                            driven_last = true;
                            drive(run, *single, items, &self.cfg, &mut stats)?
                        }
                        Input::Value(other) => {
                            stats.eager_stages += run.len() as u64;
                            run.iter().try_fold(other, |v, stage| stage.apply(v))?
                        }
                    }
                }
            };
            current = Input::Value(value);
        }

        let value = current.materialize();
        if !driven_last {
            stats.outputs = match &value {
                Value::List(items) => items.len() as u64,
                _ => 1,
            };
        }
        metrics::record_run(&plan, &stats);
        Ok(RunOutput { value, stats })
    }
}

/// Run `source` through `stages` with the default configuration.
pub fn run(source: impl Into<Value>, stages: &[Stage]) -> Result<Value, ExecError> {
    Engine::default().run(source.into(), stages)
}
