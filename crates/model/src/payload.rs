use serde::{Deserialize, Serialize};

use crate::capture::SessionMeta;
use crate::corner::NamedSegment;
use crate::delta::{ConsistencyFinding, PriorityCorner, TheoreticalBest};

/// Single structured output of the Analyser (C8), consumed by external
/// collaborators (UI, report rendering, driver-profile store — spec §1, §6).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoachingPayload {
    pub session: SessionMeta,
    pub reference_lap_time_s: f64,
    pub theoretical_best: TheoreticalBest,
    pub priority_corners: Vec<PriorityCorner>,
    pub consistency: Vec<ConsistencyFinding>,
    pub reference_segments: Vec<NamedSegment>,
}
