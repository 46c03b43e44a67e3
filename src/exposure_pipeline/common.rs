//! Common utilities module
//!
//! This module contains shared utilities used across the exposure pipeline.

pub mod error;

pub use error::{ExposureError, Result};
