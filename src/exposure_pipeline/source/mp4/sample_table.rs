//! Resolution of per-sample offsets, sizes and times from `stbl` tables.

/// One GPMF payload inside the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadEntry {
    /// File offset of the payload bytes.
    pub offset: u64,
    pub size: u32,
    /// Decode time in media timescale units.
    pub start: u64,
    /// Duration in media timescale units.
    pub duration: u32,
}

#[derive(Debug, Default)]
pub struct SampleTableBuilder {
    stts_entries: Vec<(u32, u32)>, // (count, delta)
    stsc_entries: Vec<(u32, u32)>, // (first_chunk, samples_per_chunk)
    uniform_size: u32,
    sample_sizes: Vec<u32>,
    sample_count: u32,
    chunk_offsets: Vec<u64>,
}

impl SampleTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_stts(&mut self, entries: Vec<(u32, u32)>) {
        self.stts_entries = entries;
    }

    pub fn set_stsc(&mut self, entries: Vec<(u32, u32)>) {
        self.stsc_entries = entries;
    }

    pub fn set_stsz(&mut self, uniform_size: u32, sample_count: u32, sizes: Vec<u32>) {
        self.uniform_size = uniform_size;
        self.sample_count = sample_count;
        self.sample_sizes = sizes;
    }

    pub fn set_chunk_offsets(&mut self, offsets: Vec<u64>) {
        self.chunk_offsets = offsets;
    }

    /// Resolves every sample. Samples whose chunk cannot be located are
    /// dropped from the end of the table.
    pub fn build(self) -> Vec<PayloadEntry> {
        let sample_count = if self.uniform_size > 0 {
            self.sample_count as usize
        } else {
            self.sample_sizes.len()
        };
        let size_of = |i: usize| {
            if self.uniform_size > 0 {
                self.uniform_size
            } else {
                self.sample_sizes.get(i).copied().unwrap_or(0)
            }
        };

        let offsets = self.resolve_offsets(sample_count, &size_of);
        let times = self.resolve_times(sample_count);

        offsets
            .into_iter()
            .enumerate()
            .map(|(i, offset)| {
                let (start, duration) = times.get(i).copied().unwrap_or((0, 0));
                PayloadEntry {
                    offset,
                    size: size_of(i),
                    start,
                    duration,
                }
            })
            .collect()
    }

    fn samples_in_chunk(&self, chunk: u32) -> u32 {
        // Without stsc every chunk carries one sample.
        let mut per_chunk = 1;
        for &(first_chunk, samples) in &self.stsc_entries {
            if first_chunk > chunk {
                break;
            }
            per_chunk = samples;
        }
        per_chunk
    }

    fn resolve_offsets(&self, sample_count: usize, size_of: &dyn Fn(usize) -> u32) -> Vec<u64> {
        let mut offsets = Vec::with_capacity(sample_count);

        for (chunk_index, &chunk_offset) in self.chunk_offsets.iter().enumerate() {
            let mut offset = chunk_offset;
            for _ in 0..self.samples_in_chunk(chunk_index as u32 + 1) {
                if offsets.len() == sample_count {
                    return offsets;
                }
                offsets.push(offset);
                offset += size_of(offsets.len() - 1) as u64;
            }
        }

        offsets
    }

    fn resolve_times(&self, sample_count: usize) -> Vec<(u64, u32)> {
        let mut times = Vec::with_capacity(sample_count);
        let mut start = 0u64;

        'entries: for &(count, delta) in &self.stts_entries {
            for _ in 0..count {
                if times.len() == sample_count {
                    break 'entries;
                }
                times.push((start, delta));
                start += delta as u64;
            }
        }

        times
    }
}
