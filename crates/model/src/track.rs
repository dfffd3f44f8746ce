use serde::{Deserialize, Serialize};

use crate::corner::CornerType;

/// Track archetype, drives corner-detector preset selection (spec §3, §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackType {
    Road,
    Street,
    Oval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackCharacter {
    Momentum,
    PointAndShoot,
    Mixed,
}

/// Persistent track record (spec §3, §6 `tracks` table).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackRecord {
    pub id: String,
    pub name: String,
    pub config: String,
    pub length_m: f64,
    pub track_type: TrackType,
    pub character: TrackCharacter,
    pub notes: String,
}

/// Persistent named corner (spec §3, §6 `corners` table).
///
/// Invariant: within a track, `number` is unique and records are sorted by
/// `distance_start_m`; intervals may touch but must not overlap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CornerRecord {
    pub track_id: String,
    pub number: u32,
    pub name: String,
    pub distance_start_m: f64,
    pub distance_end_m: f64,
    pub corner_type: CornerType,
    pub notes: String,
}
