#![forbid(unsafe_code)]
//! seqfuse-core: the shared vocabulary of the pipeline engine.
//!
//! - [`value::Value`]: the dynamic item type flowing through stages.
//! - [`lazy`]: `LazyResult`, `Cursor` and the `Evaluator` contract that a
//!   stage implements to take part in single-pass fusion.
//! - [`config::EngineConfig`], [`error::Error`], ids and stable hashing.
//!
//! No IO and no runtime live here.

pub mod config;
pub mod error;
pub mod hash;
pub mod id;
pub mod lazy;
pub mod prelude;
pub mod value;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
