//! Minimal YAML -> stage chain parser for linear pipelines.
//!
//! Example:
//! ```yaml
//! config:
//!   fusion: true
//! steps:
//!   - op: filter
//!     expr: "score >= 10"
//!   - op: pluck
//!     path: name
//!   - op: uniq
//!   - op: take
//!     n: 3
//! ```
//!
//! Predicates are `path OP literal` comparisons and keys are field paths;
//! see `seqfuse_operators::expr`.

use serde::{Deserialize, Serialize};

use seqfuse_core::prelude::{EngineConfig, Result, Value};
use seqfuse_operators::expr::{Comparison, FieldPath};
use seqfuse_operators::{self as ops, Stage};

use super::DslError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default)]
    pub config: Option<PipelineConfig>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum Step {
    Pluck { path: String },

    Filter { expr: String },
    Reject { expr: String },
    Compact,

    Take { n: usize },
    Skip { n: usize },
    TakeWhile { expr: String },
    SkipWhile { expr: String },

    Uniq,
    UniqBy { path: String },

    Difference { values: Vec<Value> },
    DifferenceBy { values: Vec<Value>, path: String },
    Intersection { values: Vec<Value> },
    IntersectionBy { values: Vec<Value>, path: String },

    Flatten,
    FlattenDeep,
    FlatMap { path: String },

    Find { expr: String },
    FindIndex { expr: String },
    First,

    SortBy { path: String },
    Reverse,
    GroupBy { path: String },
    Chunk { size: usize },
}

fn predicate(expr: &str) -> Result<impl Fn(&Value) -> bool + Send + Sync + 'static> {
    let cmp = Comparison::parse(expr)?;
    Ok(move |v: &Value| cmp.matches(v))
}

fn key(path: &str) -> Result<impl Fn(&Value) -> Value + Send + Sync + 'static> {
    let path = FieldPath::parse(path)?;
    Ok(move |v: &Value| path.extract(v))
}

impl Step {
    /// The `op` tag as written in YAML.
    pub fn op(&self) -> &'static str {
        match self {
            Step::Pluck { .. } => "pluck",
            Step::Filter { .. } => "filter",
            Step::Reject { .. } => "reject",
            Step::Compact => "compact",
            Step::Take { .. } => "take",
            Step::Skip { .. } => "skip",
            Step::TakeWhile { .. } => "take_while",
            Step::SkipWhile { .. } => "skip_while",
            Step::Uniq => "uniq",
            Step::UniqBy { .. } => "uniq_by",
            Step::Difference { .. } => "difference",
            Step::DifferenceBy { .. } => "difference_by",
            Step::Intersection { .. } => "intersection",
            Step::IntersectionBy { .. } => "intersection_by",
            Step::Flatten => "flatten",
            Step::FlattenDeep => "flatten_deep",
            Step::FlatMap { .. } => "flat_map",
            Step::Find { .. } => "find",
            Step::FindIndex { .. } => "find_index",
            Step::First => "first",
            Step::SortBy { .. } => "sort_by",
            Step::Reverse => "reverse",
            Step::GroupBy { .. } => "group_by",
            Step::Chunk { .. } => "chunk",
        }
    }

    /// Build the stage this step describes.
    pub fn build(&self) -> Result<Stage> {
        Ok(match self {
            Step::Pluck { path } => ops::pluck(path)?,
            Step::Filter { expr } => ops::filter(predicate(expr)?),
            Step::Reject { expr } => ops::reject(predicate(expr)?),
            Step::Compact => ops::compact(),
            Step::Take { n } => ops::take(*n),
            Step::Skip { n } => ops::skip(*n),
            Step::TakeWhile { expr } => ops::take_while(predicate(expr)?),
            Step::SkipWhile { expr } => ops::skip_while(predicate(expr)?),
            Step::Uniq => ops::uniq(),
            Step::UniqBy { path } => ops::uniq_by(key(path)?),
            Step::Difference { values } => ops::difference(values.clone()),
            Step::DifferenceBy { values, path } => {
                ops::difference_by(values.clone(), key(path)?)
            }
            Step::Intersection { values } => ops::intersection(values.clone()),
            Step::IntersectionBy { values, path } => {
                ops::intersection_by(values.clone(), key(path)?)
            }
            Step::Flatten => ops::flatten(),
            Step::FlattenDeep => ops::flatten_deep(),
            Step::FlatMap { path } => ops::flat_map(key(path)?),
            Step::Find { expr } => ops::find(predicate(expr)?),
            Step::FindIndex { expr } => ops::find_index(predicate(expr)?),
            Step::First => ops::first(),
            Step::SortBy { path } => ops::sort_by(key(path)?),
            Step::Reverse => ops::reverse(),
            Step::GroupBy { path } => ops::group_by(key(path)?),
            Step::Chunk { size } => ops::chunk(*size)?,
        })
    }
}

/// Engine overrides carried by a pipeline file. Unset fields leave the
/// caller's configuration alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub fusion: Option<bool>,
    /// `0` lifts the limit.
    pub max_stages: Option<usize>,
    pub trace_items: Option<bool>,
}

impl PipelineConfig {
    pub fn apply_to(&self, cfg: &mut EngineConfig) {
        if let Some(f) = self.fusion {
            cfg.fusion = f;
        }
        if let Some(n) = self.max_stages {
            cfg.max_stages = if n == 0 { None } else { Some(n) };
        }
        if let Some(t) = self.trace_items {
            cfg.trace_items = t;
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParsedPipeline {
    pub steps: Vec<Step>,
    pub config: PipelineConfig,
}

impl ParsedPipeline {
    /// Fresh stages for one run.
    pub fn stages(&self) -> std::result::Result<Vec<Stage>, DslError> {
        self.steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                step.build().map_err(|source| DslError::Stage {
                    index,
                    op: step.op(),
                    source,
                })
            })
            .collect()
    }
}

/// Parse a YAML pipeline. Every step is built once here so malformed paths
/// and predicates are reported before anything runs.
pub fn parse_yaml_pipeline(yaml_src: &str) -> std::result::Result<ParsedPipeline, DslError> {
    let doc: Pipeline = serde_yaml::from_str(yaml_src)?;
    if doc.steps.is_empty() {
        return Err(DslError::Invalid("pipeline has no steps".into()));
    }

    let parsed = ParsedPipeline {
        steps: doc.steps,
        config: doc.config.unwrap_or_default(),
    };
    parsed.stages()?;
    Ok(parsed)
}
