//! Textual pipeline definitions.

pub mod yaml;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DslError {
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid pipeline: {0}")]
    Invalid(String),

    /// A step parsed but its stage could not be built (bad path or predicate).
    #[error("Step {index} ({op}): {source}")]
    Stage {
        index: usize,
        op: &'static str,
        #[source]
        source: seqfuse_core::error::Error,
    },
}
