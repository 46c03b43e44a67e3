//! Exposure comparison module
//!
//! Decoding of shutter/gain sample words, per-sample exposure, the maximum
//! stop difference scan and the in-place limiting pass.

pub mod compute;
pub mod equalizer;
pub mod scanner;
pub mod series;
pub mod types;
pub mod word;

pub use compute::{compute_exposure, is_usable_exposure, stop_difference};
pub use equalizer::{limit_exposure_difference, EqualizeOutcome, ExposureEqualizer};
pub use scanner::{comparable_samples, scan_exposure_difference, scan_max_stop_difference, StopScan};
pub use series::{split_series_mut, SampleSeries, SampleSeriesMut, SeriesLocation};
pub use types::{ExposureConfig, ExposureConfigBuilder, RangePolicy};
pub use word::{byte_swap, decode_word, encode_word};
