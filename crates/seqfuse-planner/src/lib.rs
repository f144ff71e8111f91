#![forbid(unsafe_code)]
//! seqfuse-planner: from a stage chain (built in Rust or parsed from YAML)
//! to a `FusionPlan` the executor walks.
//!
//! Design:
//! - `fusion` splits a chain into eager steps and maximal fused runs. It
//!   only reads stage metadata (`is_lazy`, `is_single`); no evaluation.
//! - `dsl` parses linear YAML pipelines into `Step`s and builds `Stage`s
//!   from them, validating everything up front.

pub mod dsl;
pub mod fusion;

pub use dsl::yaml::{parse_yaml_pipeline, ParsedPipeline, PipelineConfig, Step};
pub use dsl::DslError;
pub use fusion::{plan_fusion, plan_sequential, FusionPlan, Segment};
