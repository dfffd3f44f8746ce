use serde::{Deserialize, Serialize};

/// Heuristic shape classification for a detected corner (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerType {
    Hairpin,
    Sweeper,
    Chicane,
    Kink,
    HeavyBraking,
    Unknown,
}

/// One segmented corner on a normalised lap's distance grid (spec §3, §4.4).
///
/// `index` is the sequential, 1-based order of occurrence on this lap — it
/// is not a canonical track turn number; naming against a canonical number
/// happens in the Corner Registry (C6).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CornerSegment {
    pub index: u32,
    pub entry_m: i64,
    pub apex_m: i64,
    pub exit_m: i64,
    pub apex_speed: f64,
    pub corner_type: CornerType,
}

impl CornerSegment {
    pub fn span_m(&self) -> i64 {
        self.exit_m - self.entry_m
    }
}

/// A `CornerSegment` matched against a `CornerRecord`, or left unnamed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedSegment {
    pub segment: CornerSegment,
    pub corner_name: Option<String>,
    pub corner_number: Option<u32>,
}
