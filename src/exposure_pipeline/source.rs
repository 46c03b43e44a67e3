//! Payload source module
//!
//! The `PayloadSource` seam between the exposure comparison and wherever
//! GPMF payloads live, with MP4 file and in-memory implementations.

mod memory_source;
pub mod mp4;
mod reader;

pub use memory_source::MemoryPayloadSource;
pub use mp4::Mp4PayloadSource;
pub use reader::PayloadSource;
