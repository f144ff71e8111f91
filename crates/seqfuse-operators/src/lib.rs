#![forbid(unsafe_code)]
//! seqfuse-operators: the stages a pipeline is built from.
//!
//! Every stage is a [`Stage`]: either an opaque eager function over a
//! materialized value, or a lazy-capable operator that also knows how to
//! build a per-run [`seqfuse_core::lazy::Evaluator`] so the executor can fuse
//! it with its neighbours.
//!
//! Design intent:
//! - Pure and synchronous; no IO.
//! - Configuration errors surface from the constructors, never mid-run.
//! - Each lazy adapter shares its state type between the eager path and the
//!   evaluator so both agree item for item.

pub mod callback;
pub mod expr;
pub mod stage;
pub mod traits;

pub mod filter;
pub mod find;
pub mod flatten;
pub mod map;
pub mod reshape;
pub mod set;
pub mod take;
pub mod uniq;

pub use stage::Stage;
pub use traits::{LazyOperator, Operator};

pub use filter::{compact, filter, filter_indexed, reject, try_filter};
pub use find::{find, find_index, first};
pub use flatten::{flat_map, flatten, flatten_deep};
pub use map::{map, map_indexed, pluck, try_map};
pub use reshape::{chunk, eager, group_by, reverse, sort_by};
pub use set::{
    difference, difference_by, difference_with, intersection, intersection_by,
    intersection_with,
};
pub use take::{skip, skip_while, take, take_while};
pub use uniq::{uniq, uniq_by, uniq_with};
