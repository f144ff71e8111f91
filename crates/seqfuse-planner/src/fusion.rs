//! Fusion planning: which stages run together in one pass.
//!
//! A fused run is a maximal stretch of lazy stages. It ends before the first
//! eager stage, or right after the first `single` stage. Everything else is
//! an eager segment of exactly one stage.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use seqfuse_core::hash::{hash_serde, Hash256};
use seqfuse_core::id::{SegmentId, StageId};
use seqfuse_core::prelude::Result;
use seqfuse_operators::Stage;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    /// One stage applied to the whole materialized value.
    Eager {
        id: SegmentId,
        stage: StageId,
        name: String,
    },
    /// Stages `start..end` driven together over one pass of their source.
    Fused {
        id: SegmentId,
        start: StageId,
        end: StageId,
        names: Vec<String>,
        /// Last stage is `single`; the run yields one value.
        single: bool,
    },
}

impl Segment {
    pub fn id(&self) -> SegmentId {
        match self {
            Segment::Eager { id, .. } | Segment::Fused { id, .. } => *id,
        }
    }

    /// Positions of the covered stages in the chain.
    pub fn stages(&self) -> Range<usize> {
        match self {
            Segment::Eager { stage, .. } => stage.index()..stage.index() + 1,
            Segment::Fused { start, end, .. } => start.index()..end.index(),
        }
    }

    pub fn is_fused(&self) -> bool {
        matches!(self, Segment::Fused { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FusionPlan {
    pub segments: Vec<Segment>,
}

impl FusionPlan {
    /// Stable content hash of the plan, for logs and `explain`.
    pub fn fingerprint(&self) -> Result<Hash256> {
        hash_serde(self)
    }

    pub fn fused_runs(&self) -> usize {
        self.segments.iter().filter(|s| s.is_fused()).count()
    }

    pub fn eager_stages(&self) -> usize {
        self.segments.len() - self.fused_runs()
    }

    /// One line per segment, e.g. `fused[0..3] filter -> uniq -> take`.
    pub fn describe(&self) -> Vec<String> {
        self.segments
            .iter()
            .map(|seg| match seg {
                Segment::Eager { stage, name, .. } => {
                    format!("eager[{}] {}", stage.index(), name)
                }
                Segment::Fused {
                    start,
                    end,
                    names,
                    single,
                    ..
                } => format!(
                    "fused[{}..{}] {}{}",
                    start.index(),
                    end.index(),
                    names.join(" -> "),
                    if *single { " (single)" } else { "" }
                ),
            })
            .collect()
    }
}

/// Segment `stages` into eager steps and maximal fused runs.
pub fn plan_fusion(stages: &[Stage]) -> FusionPlan {
    let mut segments = Vec::new();
    let mut i = 0;

    while i < stages.len() {
        let id = SegmentId::from(segments.len());
        if !stages[i].is_lazy() {
            segments.push(eager_segment(id, i, &stages[i]));
            i += 1;
            continue;
        }

        let start = i;
        let mut single = false;
        while i < stages.len() && stages[i].is_lazy() {
            single = stages[i].is_single();
            i += 1;
            if single {
                break;
            }
        }

        segments.push(Segment::Fused {
            id,
            start: StageId::from(start),
            end: StageId::from(i),
            names: stages[start..i].iter().map(|s| s.name().to_string()).collect(),
            single,
        });
    }

    FusionPlan { segments }
}

/// Every stage on its own, applied in order. The reference execution that
/// fused plans must agree with.
pub fn plan_sequential(stages: &[Stage]) -> FusionPlan {
    FusionPlan {
        segments: stages
            .iter()
            .enumerate()
            .map(|(i, s)| eager_segment(SegmentId::from(i), i, s))
            .collect(),
    }
}

fn eager_segment(id: SegmentId, index: usize, stage: &Stage) -> Segment {
    Segment::Eager {
        id,
        stage: StageId::from(index),
        name: stage.name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqfuse_core::prelude::Value;
    use seqfuse_operators::{filter, find, map, reverse, take, uniq};

    fn any(_: &Value) -> bool {
        true
    }

    #[test]
    fn lazy_runs_are_maximal() {
        let stages = vec![map(|v| v.clone()), filter(any), reverse(), uniq(), take(2)];
        let plan = plan_fusion(&stages);
        assert_eq!(plan.segments.len(), 3);
        assert_eq!(plan.segments[0].stages(), 0..2);
        assert!(!plan.segments[1].is_fused());
        assert_eq!(plan.segments[2].stages(), 3..5);
        assert_eq!(plan.fused_runs(), 2);
        assert_eq!(plan.eager_stages(), 1);
    }

    #[test]
    fn single_stage_closes_its_run() {
        let stages = vec![filter(any), find(any), map(|v| v.clone()), take(1)];
        let plan = plan_fusion(&stages);
        assert_eq!(
            plan.describe(),
            vec![
                "fused[0..2] filter -> find (single)".to_string(),
                "fused[2..4] map -> take".to_string(),
            ]
        );
    }

    #[test]
    fn sequential_plan_has_no_fused_runs() {
        let stages = vec![uniq(), take(3)];
        let plan = plan_sequential(&stages);
        assert_eq!(plan.fused_runs(), 0);
        assert_eq!(plan.segments.len(), 2);
        assert_eq!(plan.segments[1].id(), SegmentId::new(1));
    }

    #[test]
    fn fingerprint_tracks_shape() {
        let a = plan_fusion(&[uniq(), take(3)]).fingerprint().unwrap();
        let b = plan_fusion(&[uniq(), take(5)]).fingerprint().unwrap();
        let c = plan_sequential(&[uniq(), take(3)]).fingerprint().unwrap();
        // bound arguments are not part of the plan
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
