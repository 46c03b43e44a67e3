use tracing::debug;

use crate::exposure_pipeline::common::error::{ExposureError, Result};
use crate::exposure_pipeline::source::reader::PayloadSource;

/// Payload source held entirely in memory, with payloads spread evenly over
/// the stream duration.
#[derive(Debug, Clone)]
pub struct MemoryPayloadSource {
    payloads: Vec<Vec<u8>>,
    duration: f64,
    saved: Vec<u32>,
}

impl MemoryPayloadSource {
    pub fn new(payloads: Vec<Vec<u8>>, duration: f64) -> Self {
        Self {
            payloads,
            duration,
            saved: Vec::new(),
        }
    }

    pub fn payload(&self, index: u32) -> Option<&[u8]> {
        self.payloads.get(index as usize).map(Vec::as_slice)
    }

    /// Indices passed to `save_payload`, in call order.
    pub fn saved_indices(&self) -> &[u32] {
        &self.saved
    }

    pub fn into_payloads(self) -> Vec<Vec<u8>> {
        self.payloads
    }

    fn check_index(&self, index: u32) -> Result<usize> {
        if (index as usize) < self.payloads.len() {
            Ok(index as usize)
        } else {
            Err(ExposureError::PayloadIndex {
                index,
                count: self.payload_count(),
            })
        }
    }
}

impl PayloadSource for MemoryPayloadSource {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn payload_count(&self) -> u32 {
        self.payloads.len() as u32
    }

    fn payload_size(&self, index: u32) -> Result<u32> {
        let i = self.check_index(index)?;
        Ok(self.payloads[i].len() as u32)
    }

    fn read_payload(&mut self, buffer: &mut Vec<u8>, index: u32) -> Result<()> {
        let i = self.check_index(index)?;
        buffer.clear();
        buffer.extend_from_slice(&self.payloads[i]);
        Ok(())
    }

    fn payload_time(&self, index: u32) -> Result<(f64, f64)> {
        self.check_index(index)?;
        let period = self.duration / self.payloads.len() as f64;
        Ok((index as f64 * period, (index + 1) as f64 * period))
    }

    fn save_payload(&mut self, buffer: &[u8], index: u32) -> Result<()> {
        let i = self.check_index(index)?;
        if buffer.len() != self.payloads[i].len() {
            return Err(ExposureError::PayloadSizeMismatch {
                index,
                expected: self.payloads[i].len() as u32,
                actual: buffer.len(),
            });
        }
        self.payloads[i].copy_from_slice(buffer);
        self.saved.push(index);
        debug!(index, "Saved payload in memory");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_times_split_duration() {
        let source = MemoryPayloadSource::new(vec![vec![0; 4]; 4], 2.0);
        assert_eq!(source.payload_time(0).unwrap(), (0.0, 0.5));
        assert_eq!(source.payload_time(3).unwrap(), (1.5, 2.0));
        assert!(source.payload_time(4).is_err());
    }

    #[test]
    fn test_read_reuses_buffer_and_save_records_index() {
        let mut source = MemoryPayloadSource::new(vec![vec![1; 8], vec![2; 4]], 1.0);
        let mut buffer = Vec::with_capacity(16);
        source.read_payload(&mut buffer, 0).unwrap();
        source.read_payload(&mut buffer, 1).unwrap();
        assert_eq!(buffer, vec![2; 4]);
        assert!(buffer.capacity() >= 16);

        source.save_payload(&[9; 4], 1).unwrap();
        assert_eq!(source.payload(1), Some(&[9u8; 4][..]));
        assert_eq!(source.saved_indices(), &[1]);
        assert!(source.save_payload(&[9; 3], 1).is_err());
    }
}
