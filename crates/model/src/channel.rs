use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Scalar primitive type a channel is stored as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelType {
    Bool,
    Int,
    Float,
}

/// Physical unit a channel is expressed in. Kept as a small closed set
/// rather than a free-form string so downstream consumers can match on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    Meters,
    MetersPerSecond,
    Seconds,
    Radians,
    Ratio,
    Rpm,
    Count,
    Boolean,
    Degrees,
}

/// One decoded channel's values, column-major.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ChannelValues {
    Bool(Vec<bool>),
    Int(Vec<i64>),
    Float(Vec<f64>),
}

impl ChannelValues {
    pub fn len(&self) -> usize {
        match self {
            ChannelValues::Bool(v) => v.len(),
            ChannelValues::Int(v) => v.len(),
            ChannelValues::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtype(&self) -> ChannelType {
        match self {
            ChannelValues::Bool(_) => ChannelType::Bool,
            ChannelValues::Int(_) => ChannelType::Int,
            ChannelValues::Float(_) => ChannelType::Float,
        }
    }

    pub fn as_floats(&self) -> Vec<f64> {
        match self {
            ChannelValues::Bool(v) => v.iter().map(|b| if *b { 1.0 } else { 0.0 }).collect(),
            ChannelValues::Int(v) => v.iter().map(|i| *i as f64).collect(),
            ChannelValues::Float(v) => v.clone(),
        }
    }

    pub fn slice(&self, start: usize, end: usize) -> ChannelValues {
        match self {
            ChannelValues::Bool(v) => ChannelValues::Bool(v[start..end].to_vec()),
            ChannelValues::Int(v) => ChannelValues::Int(v[start..end].to_vec()),
            ChannelValues::Float(v) => ChannelValues::Float(v[start..end].to_vec()),
        }
    }
}

/// Column-oriented table of named channels, all sharing one sample count.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChannelTable {
    pub len: usize,
    pub channels: HashMap<String, ChannelValues>,
}

impl ChannelTable {
    pub fn new(len: usize) -> Self {
        Self { len, channels: HashMap::new() }
    }

    pub fn insert(&mut self, name: impl Into<String>, values: ChannelValues) {
        self.channels.insert(name.into(), values);
    }

    pub fn get(&self, name: &str) -> Result<&ChannelValues> {
        self.channels
            .get(name)
            .ok_or_else(|| AnalysisError::MissingChannel(name.to_string()))
    }

    pub fn get_floats(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self.get(name)?.as_floats())
    }

    pub fn has(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// Contiguous sub-range `[start, end)` over every channel, preserving `len`.
    pub fn slice(&self, start: usize, end: usize) -> ChannelTable {
        let mut out = ChannelTable::new(end - start);
        for (name, values) in &self.channels {
            out.insert(name.clone(), values.slice(start, end));
        }
        out
    }
}

/// Canonical channel names the pipeline depends on by contract (spec §3).
pub mod names {
    pub const SPEED: &str = "Speed";
    pub const THROTTLE: &str = "Throttle";
    pub const BRAKE: &str = "Brake";
    pub const STEERING_WHEEL_ANGLE: &str = "SteeringWheelAngle";
    pub const LAT: &str = "Lat";
    pub const LON: &str = "Lon";
    pub const ALT: &str = "Alt";
    pub const LAP: &str = "Lap";
    pub const LAP_CURRENT_LAP_TIME: &str = "LapCurrentLapTime";
    pub const LAP_DIST: &str = "LapDist";
    pub const LAP_DIST_PCT: &str = "LapDistPct";
    pub const SESSION_TIME: &str = "SessionTime";
    pub const SESSION_TICK: &str = "SessionTick";
    pub const RPM: &str = "RPM";
    pub const GEAR: &str = "Gear";
    pub const PLAYER_TRACK_SURFACE: &str = "PlayerTrackSurface";
    pub const PLAYER_CAR_MY_INCIDENT_COUNT: &str = "PlayerCarMyIncidentCount";
    pub const ON_PIT_ROAD: &str = "OnPitRoad";
}
