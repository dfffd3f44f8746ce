//! Shared domain types for the telemetry analysis core.
//!
//! No I/O and no persistence live here — just the data model flowing
//! between the binary parser, the normaliser, the corner detector, the
//! track store and the analyser.

pub mod capture;
pub mod channel;
pub mod corner;
pub mod delta;
pub mod error;
pub mod lap;
pub mod payload;
pub mod preset;
pub mod track;

pub use capture::{Capture, SessionMeta};
pub use channel::{ChannelTable, ChannelType, ChannelValues, Unit};
pub use corner::{CornerSegment, CornerType, NamedSegment};
pub use delta::{
    ConsistencyFinding, ConsistencyThresholds, CornerAttribution, CornerDelta, Diagnosis,
    PriorityCorner, TheoreticalBest,
};
pub use error::{AnalysisError, Result};
pub use lap::{NormalisedLap, RawLap, RejectionReason};
pub use payload::CoachingPayload;
pub use preset::{Preset, PresetConfig};
pub use track::{CornerRecord, TrackCharacter, TrackRecord, TrackType};
