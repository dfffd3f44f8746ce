use thiserror::Error;

/// Stable, distinguishable error kinds produced anywhere in the pipeline.
///
/// Each variant's `Display` impl is the stable string tag external
/// collaborators match on; renaming a variant is a breaking change.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("malformed capture: {0}")]
    MalformedCapture(String),

    #[error("unsupported channel type for `{channel}`: type code {code}")]
    UnsupportedChannelType { channel: String, code: u16 },

    #[error("missing required channel `{0}`")]
    MissingChannel(String),

    #[error("no usable lap: {0}")]
    NoUsableLap(String),

    #[error("track store unavailable: {0}")]
    TrackStoreUnavailable(String),

    #[error("seeding failed: {0}")]
    SeedingFailed(String),

    #[error("cancelled")]
    Cancelled,

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// Exit code contract from spec §6.
    pub fn exit_code(&self) -> i32 {
        match self {
            AnalysisError::MalformedCapture(_) => 2,
            AnalysisError::NoUsableLap(_) => 3,
            AnalysisError::TrackStoreUnavailable(_) => 4,
            AnalysisError::UnsupportedChannelType { .. }
            | AnalysisError::MissingChannel(_)
            | AnalysisError::SeedingFailed(_)
            | AnalysisError::Cancelled
            | AnalysisError::Internal(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
