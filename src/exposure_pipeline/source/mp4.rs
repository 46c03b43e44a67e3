//! MP4/MOV payload source.
//!
//! Locates the GPMF metadata track (`meta` handler, `gpmd` sample entry) and
//! serves its samples as payloads. Mutated payloads are written back over the
//! original bytes, so the container layout never changes.

mod atoms;
mod reader;
mod sample_table;
pub mod writer;

pub use reader::{MetadataTrack, Mp4Reader};
pub use sample_table::PayloadEntry;
pub use writer::build_metadata_mp4;

use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::exposure_pipeline::common::error::{ExposureError, Result};
use crate::exposure_pipeline::source::reader::PayloadSource;

pub struct Mp4PayloadSource {
    file: File,
    path: PathBuf,
    writable: bool,
    track: MetadataTrack,
}

impl Mp4PayloadSource {
    /// Opens `path` and indexes its GPMF track. `writable` is required for
    /// [`PayloadSource::save_payload`].
    pub fn open<P: AsRef<Path>>(path: P, writable: bool) -> Result<Self> {
        let path = path.as_ref();

        let file = OpenOptions::new()
            .read(true)
            .write(writable)
            .open(path)
            .map_err(|e| ExposureError::SourceOpen(format!("{}: {}", path.display(), e)))?;

        let track = {
            let _span = tracing::info_span!("index_metadata_track").entered();
            let mut reader = Mp4Reader::new(BufReader::new(&file))?;
            reader
                .find_metadata_track()?
                .ok_or_else(|| ExposureError::MissingMetadataTrack(path.display().to_string()))?
        };

        info!(
            path = %path.display(),
            payloads = track.payloads.len(),
            duration = track.duration_secs(),
            "Opened GPMF source"
        );

        Ok(Self {
            file,
            path: path.to_path_buf(),
            writable,
            track,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn track(&self) -> &MetadataTrack {
        &self.track
    }

    fn entry(&self, index: u32) -> Result<&PayloadEntry> {
        self.track
            .payloads
            .get(index as usize)
            .ok_or(ExposureError::PayloadIndex {
                index,
                count: self.payload_count(),
            })
    }
}

impl PayloadSource for Mp4PayloadSource {
    fn duration(&self) -> f64 {
        self.track.duration_secs()
    }

    fn payload_count(&self) -> u32 {
        self.track.payloads.len() as u32
    }

    fn payload_size(&self, index: u32) -> Result<u32> {
        Ok(self.entry(index)?.size)
    }

    fn read_payload(&mut self, buffer: &mut Vec<u8>, index: u32) -> Result<()> {
        let entry = *self.entry(index)?;
        buffer.resize(entry.size as usize, 0);
        self.file.seek(SeekFrom::Start(entry.offset))?;
        self.file.read_exact(buffer)?;
        debug!(index, offset = entry.offset, size = entry.size, "Read payload");
        Ok(())
    }

    fn payload_time(&self, index: u32) -> Result<(f64, f64)> {
        let entry = self.entry(index)?;
        let start = self.track.to_secs(entry.start);
        let end = self.track.to_secs(entry.start + entry.duration as u64);
        Ok((start, end))
    }

    fn save_payload(&mut self, buffer: &[u8], index: u32) -> Result<()> {
        if !self.writable {
            return Err(ExposureError::ReadOnlySource);
        }
        let entry = *self.entry(index)?;
        if buffer.len() != entry.size as usize {
            return Err(ExposureError::PayloadSizeMismatch {
                index,
                expected: entry.size,
                actual: buffer.len(),
            });
        }
        self.file.seek(SeekFrom::Start(entry.offset))?;
        self.file.write_all(buffer)?;
        self.file.flush()?;
        debug!(index, offset = entry.offset, "Saved payload");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exposure_pipeline::gpmf::exposure_payload;

    fn write_fixture(dir: &tempfile::TempDir, name: &str, payloads: &[Vec<u8>]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, build_metadata_mp4(payloads, 1000, 1001)).unwrap();
        path
    }

    #[test]
    fn test_reads_payloads_and_timing() {
        let dir = tempfile::tempdir().unwrap();
        let payloads = vec![
            exposure_payload(&[0.01, 0.01], &[100.0, 100.0]),
            exposure_payload(&[0.02, 0.02, 0.02], &[200.0, 200.0, 200.0]),
        ];
        let path = write_fixture(&dir, "a.mp4", &payloads);

        let mut source = Mp4PayloadSource::open(&path, false).unwrap();
        assert_eq!(source.payload_count(), 2);
        assert!((source.duration() - 2.002).abs() < 1e-9);
        assert_eq!(source.payload_size(1).unwrap() as usize, payloads[1].len());

        let mut buffer = Vec::new();
        source.read_payload(&mut buffer, 0).unwrap();
        assert_eq!(buffer, payloads[0]);
        source.read_payload(&mut buffer, 1).unwrap();
        assert_eq!(buffer, payloads[1]);

        let (start, end) = source.payload_time(1).unwrap();
        assert!((start - 1.001).abs() < 1e-9);
        assert!((end - 2.002).abs() < 1e-9);
    }

    #[test]
    fn test_save_payload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let payloads = vec![
            exposure_payload(&[0.01], &[100.0]),
            exposure_payload(&[0.02], &[100.0]),
        ];
        let path = write_fixture(&dir, "b.mp4", &payloads);

        {
            let mut source = Mp4PayloadSource::open(&path, true).unwrap();
            let replacement = exposure_payload(&[0.005], &[100.0]);
            source.save_payload(&replacement, 1).unwrap();
        }

        let mut source = Mp4PayloadSource::open(&path, false).unwrap();
        let mut buffer = Vec::new();
        source.read_payload(&mut buffer, 0).unwrap();
        assert_eq!(buffer, payloads[0]);
        source.read_payload(&mut buffer, 1).unwrap();
        assert_eq!(buffer, exposure_payload(&[0.005], &[100.0]));
    }

    #[test]
    fn test_save_rejects_read_only_and_resized_buffers() {
        let dir = tempfile::tempdir().unwrap();
        let payloads = vec![exposure_payload(&[0.01], &[100.0])];
        let path = write_fixture(&dir, "c.mp4", &payloads);

        let mut read_only = Mp4PayloadSource::open(&path, false).unwrap();
        assert!(matches!(
            read_only.save_payload(&payloads[0], 0),
            Err(ExposureError::ReadOnlySource)
        ));

        let mut writable = Mp4PayloadSource::open(&path, true).unwrap();
        assert!(matches!(
            writable.save_payload(&payloads[0][..4], 0),
            Err(ExposureError::PayloadSizeMismatch { .. })
        ));
        assert!(matches!(
            writable.payload_size(3),
            Err(ExposureError::PayloadIndex { index: 3, count: 1 })
        ));
    }

    #[test]
    fn test_open_rejects_payload_past_end_of_file() {
        let dir = tempfile::tempdir().unwrap();
        let payloads = vec![exposure_payload(&[0.01], &[100.0])];
        let mut bytes = build_metadata_mp4(&payloads, 1000, 1001);

        // First per-sample size follows the stsz version/flags, uniform size and count.
        let stsz = bytes.windows(4).position(|w| w == b"stsz").unwrap();
        let size_at = stsz + 4 + 12;
        bytes[size_at..size_at + 4].copy_from_slice(&0xFFFF_FFF0u32.to_be_bytes());

        let path = dir.path().join("corrupt_stsz.mp4");
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(
            Mp4PayloadSource::open(&path, false),
            Err(ExposureError::InvalidMp4(_))
        ));
    }

    #[test]
    fn test_open_failures() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Mp4PayloadSource::open(dir.path().join("missing.mp4"), false),
            Err(ExposureError::SourceOpen(_))
        ));

        let no_moov = dir.path().join("no_moov.mp4");
        std::fs::write(&no_moov, [0u8, 0, 0, 8, b'f', b'r', b'e', b'e']).unwrap();
        assert!(matches!(
            Mp4PayloadSource::open(&no_moov, false),
            Err(ExposureError::InvalidMp4(_))
        ));

        // A moov without any trak has no GPMF track.
        let empty_moov = dir.path().join("empty_moov.mp4");
        std::fs::write(&empty_moov, [0u8, 0, 0, 8, b'm', b'o', b'o', b'v']).unwrap();
        assert!(matches!(
            Mp4PayloadSource::open(&empty_moov, false),
            Err(ExposureError::MissingMetadataTrack(_))
        ));
    }
}
