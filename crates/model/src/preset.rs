use serde::{Deserialize, Serialize};

use crate::track::TrackType;

/// Named corner-detector threshold preset (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Preset {
    Road,
    Street,
    Oval,
}

impl Preset {
    /// Defaults from `track_type` when not forced by a caller (spec §4.8,
    /// §9: unknown `track_type` defaults to `road`).
    pub fn from_track_type(track_type: Option<TrackType>) -> Self {
        match track_type {
            Some(TrackType::Road) => Preset::Road,
            Some(TrackType::Street) => Preset::Street,
            Some(TrackType::Oval) => Preset::Oval,
            None => Preset::Road,
        }
    }

    pub fn config(self) -> PresetConfig {
        match self {
            // min_corner_speed_drop is 3.0, not 5.0 — 5.0 missed fast
            // sweepers like Eau Rouge and is a regression if reintroduced.
            Preset::Road => PresetConfig {
                min_corner_speed_drop: 3.0,
                apex_speed_ceiling: 60.0,
                brake_threshold: 0.05,
                throttle_threshold: 0.90,
                merge_gap_m: 30.0,
            },
            Preset::Street => PresetConfig {
                min_corner_speed_drop: 2.0,
                apex_speed_ceiling: 45.0,
                brake_threshold: 0.05,
                throttle_threshold: 0.85,
                merge_gap_m: 20.0,
            },
            Preset::Oval => PresetConfig {
                min_corner_speed_drop: 8.0,
                apex_speed_ceiling: 70.0,
                brake_threshold: 0.03,
                throttle_threshold: 0.90,
                merge_gap_m: 60.0,
            },
        }
    }
}

impl Default for Preset {
    fn default() -> Self {
        Preset::Road
    }
}

/// Corner-detector thresholds for one preset (spec §4.4 table).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresetConfig {
    pub min_corner_speed_drop: f64,
    pub apex_speed_ceiling: f64,
    pub brake_threshold: f64,
    pub throttle_threshold: f64,
    pub merge_gap_m: f64,
}
