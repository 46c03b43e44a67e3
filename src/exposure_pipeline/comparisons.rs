//! Stream comparison module
//!
//! Orchestrates payload-by-payload comparison of two telemetry streams and the
//! optional limiting pass.

mod exposure_comparison;
mod report;


pub use exposure_comparison::{durations_match, ExposureComparisonPipeline, PayloadInspector};
pub use report::ComparisonReport;
