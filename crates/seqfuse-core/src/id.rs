//! Position ids for stages and plan segments.
//!
//! Planner and exec refer to stages by their place in the chain; the
//! wrappers keep a stage position from being mixed up with a segment one.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! position_id {
    ($name:ident, $label:literal) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Ord, PartialOrd,
        )]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            pub const fn new(v: u32) -> Self {
                Self(v)
            }

            /// Position as a slice index.
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self(v as u32)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $label, self.0)
            }
        }
    };
}

position_id!(StageId, "stage");
position_id!(SegmentId, "segment");
