//! Atom walker that extracts the GPMF metadata track from an MP4/MOV file.

use std::io::{Read, Seek, SeekFrom};

use tracing::debug;

use crate::exposure_pipeline::common::error::{ExposureError, Result};
use crate::exposure_pipeline::source::mp4::atoms::{Atom, AtomType, FORMAT_GPMD, HANDLER_META};
use crate::exposure_pipeline::source::mp4::sample_table::{PayloadEntry, SampleTableBuilder};

/// Largest table atom read into memory; guards against malformed sizes.
const MAX_ATOM_DATA_SIZE: u64 = 64 * 1024 * 1024;

/// Timing and payload layout of a GPMF track.
#[derive(Debug, Clone, Default)]
pub struct MetadataTrack {
    /// Media timescale, units per second.
    pub timescale: u32,
    /// Track duration in timescale units.
    pub duration: u64,
    pub payloads: Vec<PayloadEntry>,
}

impl MetadataTrack {
    pub fn duration_secs(&self) -> f64 {
        if self.timescale == 0 {
            0.0
        } else {
            self.duration as f64 / self.timescale as f64
        }
    }

    pub fn to_secs(&self, units: u64) -> f64 {
        if self.timescale == 0 {
            0.0
        } else {
            units as f64 / self.timescale as f64
        }
    }
}

#[derive(Default)]
struct TrackCandidate {
    handler: [u8; 4],
    format: [u8; 4],
    track: MetadataTrack,
}

impl TrackCandidate {
    fn is_gpmf(&self) -> bool {
        self.handler == HANDLER_META && self.format == FORMAT_GPMD
    }
}

fn be_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn be_u64(data: &[u8], offset: usize) -> Option<u64> {
    let bytes = data.get(offset..offset + 8)?;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    Some(u64::from_be_bytes(buf))
}

pub struct Mp4Reader<R> {
    reader: R,
    file_size: u64,
}

impl<R: Read + Seek> Mp4Reader<R> {
    pub fn new(mut reader: R) -> Result<Self> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        Ok(Self { reader, file_size })
    }

    /// Returns the first `meta`/`gpmd` track, if the file has one.
    pub fn find_metadata_track(&mut self) -> Result<Option<MetadataTrack>> {
        let top = self.read_atoms(0, self.file_size)?;
        let Some(moov) = top.iter().find(|a| a.atom_type == AtomType::MOOV) else {
            return Err(ExposureError::InvalidMp4("no moov atom".to_string()));
        };

        for trak in self.read_atoms(moov.data_offset, moov.data_end())? {
            if trak.atom_type != AtomType::TRAK {
                continue;
            }
            let candidate = self.parse_trak(&trak)?;
            debug!(
                handler = %String::from_utf8_lossy(&candidate.handler),
                format = %String::from_utf8_lossy(&candidate.format),
                payloads = candidate.track.payloads.len(),
                "Found track"
            );
            if candidate.is_gpmf() {
                self.check_payload_bounds(&candidate.track)?;
                return Ok(Some(candidate.track));
            }
        }

        Ok(None)
    }

    /// Every payload must lie inside the file; payload buffers are sized from
    /// `stsz`, so a corrupt table must not reach them.
    fn check_payload_bounds(&self, track: &MetadataTrack) -> Result<()> {
        for (index, entry) in track.payloads.iter().enumerate() {
            let end = entry.offset.checked_add(entry.size as u64);
            if end.is_none_or(|end| end > self.file_size) {
                return Err(ExposureError::InvalidMp4(format!(
                    "payload {} at offset {} with size {} runs past end of file ({} bytes)",
                    index, entry.offset, entry.size, self.file_size
                )));
            }
        }
        Ok(())
    }

    fn read_atoms(&mut self, start: u64, end: u64) -> Result<Vec<Atom>> {
        let mut atoms = Vec::new();
        let mut pos = start;

        while pos + 8 <= end {
            self.reader.seek(SeekFrom::Start(pos))?;

            let mut header = [0u8; 8];
            if self.reader.read_exact(&mut header).is_err() {
                break;
            }

            let size = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as u64;
            let atom_type = AtomType([header[4], header[5], header[6], header[7]]);

            let (actual_size, header_size) = match size {
                1 => {
                    let mut ext = [0u8; 8];
                    self.reader.read_exact(&mut ext)?;
                    (u64::from_be_bytes(ext), 16u8)
                }
                0 => (end - pos, 8u8),
                _ => (size, 8u8),
            };

            if actual_size < header_size as u64 || pos + actual_size > end {
                debug!(atom = %atom_type, offset = pos, size = actual_size, "Stopping at malformed atom");
                break;
            }

            atoms.push(Atom {
                atom_type,
                size: actual_size,
                data_offset: pos + header_size as u64,
                header_size,
            });

            pos += actual_size;
        }

        Ok(atoms)
    }

    fn read_atom_data(&mut self, atom: &Atom) -> Result<Vec<u8>> {
        let size = atom.data_size();
        if size > MAX_ATOM_DATA_SIZE {
            return Err(ExposureError::InvalidMp4(format!(
                "atom {} data size {} exceeds maximum {}",
                atom.atom_type, size, MAX_ATOM_DATA_SIZE
            )));
        }
        self.reader.seek(SeekFrom::Start(atom.data_offset))?;
        let mut data = vec![0u8; size as usize];
        self.reader.read_exact(&mut data)?;
        Ok(data)
    }

    fn children(&mut self, atom: &Atom) -> Result<Vec<Atom>> {
        self.read_atoms(atom.data_offset, atom.data_end())
    }

    fn parse_trak(&mut self, trak: &Atom) -> Result<TrackCandidate> {
        let mut candidate = TrackCandidate::default();

        for mdia in self.children(trak)? {
            if mdia.atom_type != AtomType::MDIA {
                continue;
            }
            for child in self.children(&mdia)? {
                match child.atom_type {
                    AtomType::MDHD => self.parse_mdhd(&child, &mut candidate.track)?,
                    AtomType::HDLR => {
                        let data = self.read_atom_data(&child)?;
                        if let Some(handler) = data.get(8..12) {
                            candidate.handler.copy_from_slice(handler);
                        }
                    }
                    AtomType::MINF => self.parse_minf(&child, &mut candidate)?,
                    _ => {}
                }
            }
        }

        Ok(candidate)
    }

    fn parse_mdhd(&mut self, atom: &Atom, track: &mut MetadataTrack) -> Result<()> {
        let data = self.read_atom_data(atom)?;
        let Some(&version) = data.first() else {
            return Ok(());
        };

        if version == 0 {
            track.timescale = be_u32(&data, 12).unwrap_or(0);
            track.duration = be_u32(&data, 16).unwrap_or(0) as u64;
        } else {
            track.timescale = be_u32(&data, 20).unwrap_or(0);
            track.duration = be_u64(&data, 24).unwrap_or(0);
        }

        Ok(())
    }

    fn parse_minf(&mut self, minf: &Atom, candidate: &mut TrackCandidate) -> Result<()> {
        for stbl in self.children(minf)? {
            if stbl.atom_type != AtomType::STBL {
                continue;
            }

            let mut builder = SampleTableBuilder::new();
            for child in self.children(&stbl)? {
                let data = match child.atom_type {
                    AtomType::STSD
                    | AtomType::STTS
                    | AtomType::STSC
                    | AtomType::STSZ
                    | AtomType::STCO
                    | AtomType::CO64 => self.read_atom_data(&child)?,
                    _ => continue,
                };

                match child.atom_type {
                    AtomType::STSD => {
                        // version/flags, entry count, then the first entry's size and format
                        if let Some(format) = data.get(12..16) {
                            candidate.format.copy_from_slice(format);
                        }
                    }
                    AtomType::STTS => builder.set_stts(read_pairs(&data)),
                    AtomType::STSC => {
                        let entries = read_table(&data, 12, |entry| {
                            Some((be_u32(entry, 0)?, be_u32(entry, 4)?))
                        });
                        builder.set_stsc(entries);
                    }
                    AtomType::STSZ => {
                        let uniform = be_u32(&data, 4).unwrap_or(0);
                        let count = be_u32(&data, 8).unwrap_or(0);
                        let sizes = if uniform == 0 {
                            data.get(12..)
                                .unwrap_or_default()
                                .chunks_exact(4)
                                .take(count as usize)
                                .filter_map(|c| be_u32(c, 0))
                                .collect()
                        } else {
                            Vec::new()
                        };
                        builder.set_stsz(uniform, count, sizes);
                    }
                    AtomType::STCO => {
                        let offsets = read_table(&data, 4, |e| be_u32(e, 0).map(u64::from));
                        builder.set_chunk_offsets(offsets);
                    }
                    AtomType::CO64 => {
                        let offsets = read_table(&data, 8, |e| be_u64(e, 0));
                        builder.set_chunk_offsets(offsets);
                    }
                    _ => {}
                }
            }

            candidate.track.payloads = builder.build();
        }

        Ok(())
    }
}

/// Reads a full-box table: version/flags, entry count, fixed-size entries.
fn read_table<T>(data: &[u8], entry_size: usize, parse: impl Fn(&[u8]) -> Option<T>) -> Vec<T> {
    let count = be_u32(data, 4).unwrap_or(0) as usize;
    data.get(8..)
        .unwrap_or_default()
        .chunks_exact(entry_size)
        .take(count)
        .filter_map(parse)
        .collect()
}

fn read_pairs(data: &[u8]) -> Vec<(u32, u32)> {
    read_table(data, 8, |entry| Some((be_u32(entry, 0)?, be_u32(entry, 4)?)))
}
