use serde::{Deserialize, Serialize};

use crate::channel::ChannelTable;

/// Contiguous sample range whose `Lap` value is constant (spec §4.2).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawLap {
    pub lap_number: i64,
    pub channels: ChannelTable,
}

/// Why a `RawLap` could not be normalised onto the distance grid (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    InsufficientCoverage,
    DistanceJump,
    TooShort,
    PitLap,
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RejectionReason::InsufficientCoverage => "insufficient_coverage",
            RejectionReason::DistanceJump => "distance_jump",
            RejectionReason::TooShort => "too_short",
            RejectionReason::PitLap => "pit_lap",
        };
        f.write_str(s)
    }
}

/// A lap resampled onto a uniform 1-metre distance grid (spec §3, §4.3).
///
/// `channels` holds every continuous/discrete channel resampled onto
/// `[0, 1, ..., floor(track_length_m)]`; `SessionTime` within it is strictly
/// increasing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalisedLap {
    pub lap_number: i64,
    pub lap_time_s: f64,
    pub channels: ChannelTable,
}

impl NormalisedLap {
    /// Number of 1-metre grid points, i.e. `floor(track_length_m) + 1`.
    pub fn grid_len(&self) -> usize {
        self.channels.len
    }
}
