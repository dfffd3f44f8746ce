use serde::{Deserialize, Serialize};

/// Diagnosis tag assigned to a priority corner (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diagnosis {
    LateBrakeOverSlow,
    EarlyLift,
    TightLine,
    EarlyThrottleLossOfDrive,
    Other,
}

/// Per-corner delta between a candidate and a reference lap (spec §3, §4.7).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CornerDelta {
    pub corner_name: Option<String>,
    pub corner_number: Option<u32>,
    pub entry_m: i64,
    pub apex_m: i64,
    pub exit_m: i64,
    pub braking_point_delta_m: Option<f64>,
    pub min_speed_delta: f64,
    pub throttle_application_delta_m: Option<f64>,
    pub time_delta_s: Option<f64>,
    pub lap_position_percent: f64,
}

/// A corner ranked highest by absolute time-loss against the reference lap
/// (spec §3, §4.8).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriorityCorner {
    pub corner_name: Option<String>,
    pub corner_number: u32,
    pub time_lost_s: f64,
    pub diagnosis: Diagnosis,
    pub delta: CornerDelta,
}

/// Per-corner best-lap attribution within a `TheoreticalBest` (spec §3, §4.7).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CornerAttribution {
    pub corner_number: u32,
    pub best_lap_number: i64,
    pub best_corner_time_s: f64,
}

/// Sum of per-corner minima across a lap set, inter-corner straights taken
/// from the actual fastest lap (spec §3, §4.7).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TheoreticalBest {
    pub actual_best_time_s: f64,
    pub theoretical_time_s: f64,
    pub per_corner: Vec<CornerAttribution>,
}

/// Per-corner pace-consistency finding across the surviving lap set (spec §4.8).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsistencyFinding {
    pub corner_number: u32,
    pub corner_name: Option<String>,
    pub std_dev_s: f64,
    pub mean_delta_s: f64,
    pub consistency_issue: bool,
    pub technique_issue: bool,
}

/// Tunable thresholds for the consistency/technique split (spec §4.8, §9
/// Open Questions — heuristic, stable defaults, overridable by callers).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ConsistencyThresholds {
    pub std_dev_s: f64,
    pub mean_delta_s: f64,
}

impl Default for ConsistencyThresholds {
    fn default() -> Self {
        Self { std_dev_s: 0.15, mean_delta_s: 0.2 }
    }
}
