//! Convenient re-exports for downstream crates.

pub use crate::config::EngineConfig;
pub use crate::error::{Error, Result};
pub use crate::hash::Hash256;
pub use crate::id::{SegmentId, StageId};
pub use crate::lazy::{Cursor, Evaluator, LazyResult};
pub use crate::value::Value;
