use serde::{Deserialize, Serialize};

use crate::channel::ChannelTable;

/// Session metadata extracted from a capture's metadata document (spec §4.1).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionMeta {
    pub track_id: String,
    pub track_name: String,
    pub track_length_m: f64,
    pub car_id: String,
    pub car_name: String,
    pub driver_id: String,
    pub driver_name: String,
    pub sample_hz: f64,
}

/// One decoded capture: session metadata plus the per-sample channel table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Capture {
    pub session: SessionMeta,
    pub channels: ChannelTable,
}
