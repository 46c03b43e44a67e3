use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExposureError {
    #[error("Failed to open source: {0}")]
    SourceOpen(String),

    #[error("Invalid MP4: {0}")]
    InvalidMp4(String),

    #[error("No GPMF metadata track found in {0}")]
    MissingMetadataTrack(String),

    #[error("Payload index {index} out of range (payloads: {count})")]
    PayloadIndex { index: u32, count: u32 },

    #[error("Payload {index} size mismatch: stored {expected} bytes, buffer has {actual}")]
    PayloadSizeMismatch { index: u32, expected: u32, actual: usize },

    #[error("Invalid GPMF payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid exposure limit: {0} stops (must be finite and >= 0)")]
    InvalidLimit(f32),

    #[error("Source was opened read-only")]
    ReadOnlySource,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExposureError>;
