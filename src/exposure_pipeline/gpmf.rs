//! GPMF payload access
//!
//! Structural walking of the key-length-value telemetry format and tag
//! lookup. Only the element headers are interpreted here; sample values are
//! decoded by the exposure module.

pub mod builder;
mod fourcc;
mod stream;

pub use builder::{exposure_payload, KlvBuilder};
pub use fourcc::FourCC;
pub use stream::{describe_stream, GpmfStream, DEFAULT_MAX_DEPTH, HEADER_LEN, TYPE_NESTED};
