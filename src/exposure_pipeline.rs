//! Exposure comparison pipeline module
//!
//! This module compares the exposure (shutter time × ISO gain) recorded in the
//! GPMF telemetry of two camera streams, with separate modules for payload
//! sources, GPMF walking, exposure math and comparison orchestration.

pub mod common;
pub mod comparisons;
pub mod exposure;
pub mod gpmf;
pub mod source;

pub use common::{
    ExposureError,
    Result,
};

pub use exposure::{
    ExposureConfig,
    ExposureConfigBuilder,
    ExposureEqualizer,
    RangePolicy,
};

pub use gpmf::{
    FourCC,
    GpmfStream,
};

pub use source::{
    MemoryPayloadSource,
    Mp4PayloadSource,
    PayloadSource,
};

pub use comparisons::{
    ComparisonReport,
    ExposureComparisonPipeline,
};
