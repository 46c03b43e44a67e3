use crate::exposure_pipeline::common::error::Result;

/// Timed sequence of GPMF payloads backing one telemetry stream.
///
/// Releasing a source (and any file it holds) happens on drop.
pub trait PayloadSource {
    /// Total stream duration in seconds.
    fn duration(&self) -> f64;

    fn payload_count(&self) -> u32;

    fn payload_size(&self, index: u32) -> Result<u32>;

    /// Loads payload `index` into `buffer`, resizing it as needed and reusing
    /// its allocation.
    fn read_payload(&mut self, buffer: &mut Vec<u8>, index: u32) -> Result<()>;

    /// Start and end time of payload `index` in seconds.
    fn payload_time(&self, index: u32) -> Result<(f64, f64)>;

    /// Persists a mutated payload. The buffer must keep the stored size.
    fn save_payload(&mut self, buffer: &[u8], index: u32) -> Result<()>;
}
