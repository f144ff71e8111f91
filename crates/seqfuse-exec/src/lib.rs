#![forbid(unsafe_code)]
//! seqfuse-exec: the pipeline executor.
//!
//! `Engine::run` plans a stage chain, applies eager stages one at a time and
//! drives every fused run in a single pass over its source, stopping as soon
//! as a stage reports it is done.

pub mod driver;
mod macros;
pub mod metrics;
pub mod runtime;

pub use metrics::RunStats;
pub use runtime::{run, Engine, ExecError, RunOutput};
