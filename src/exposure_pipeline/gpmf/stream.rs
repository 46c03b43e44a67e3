//! Cursor over a GPMF key-length-value payload.
//!
//! Every element starts with an 8-byte header: a four-character key, a type
//! byte (0 for a nested container), a struct size byte and a big-endian
//! 16-bit repeat count. The value follows, `struct_size * repeat` bytes padded
//! to a 4-byte boundary. Containers hold further elements in their value.

use std::ops::Range;

use crate::exposure_pipeline::common::error::{ExposureError, Result};
use crate::exposure_pipeline::exposure::series::SeriesLocation;
use crate::exposure_pipeline::gpmf::fourcc::FourCC;

/// Size of a KLV element header in bytes.
pub const HEADER_LEN: usize = 8;

/// Type byte marking a nested container.
pub const TYPE_NESTED: u8 = 0;

/// Default number of container levels a lookup may descend.
pub const DEFAULT_MAX_DEPTH: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Element {
    offset: usize,
    key: FourCC,
    type_byte: u8,
    struct_size: u8,
    repeat: u16,
    end: usize,
}

impl Element {
    fn value_start(&self) -> usize {
        self.offset + HEADER_LEN
    }

    fn value_len(&self) -> usize {
        self.struct_size as usize * self.repeat as usize
    }

    fn is_nested(&self) -> bool {
        self.type_byte == TYPE_NESTED
    }
}

enum Header {
    Element(Element),
    End,
}

fn read_header(buffer: &[u8], pos: usize, limit: usize) -> Result<Header> {
    if pos + HEADER_LEN > limit {
        return Ok(Header::End);
    }
    let h = &buffer[pos..pos + HEADER_LEN];
    let key = FourCC([h[0], h[1], h[2], h[3]]);

    // Zero keys are trailing padding.
    if key.0 == [0; 4] {
        return Ok(Header::End);
    }
    if !key.is_valid() {
        return Err(ExposureError::InvalidPayload(format!(
            "invalid key {:02x?} at offset {}",
            key.0, pos
        )));
    }

    let struct_size = h[5];
    let repeat = u16::from_be_bytes([h[6], h[7]]);
    let value_start = pos + HEADER_LEN;
    let value_end = value_start + struct_size as usize * repeat as usize;
    if value_end > limit {
        return Err(ExposureError::InvalidPayload(format!(
            "{} at offset {} needs {} bytes, container ends at {}",
            key, pos, value_end, limit
        )));
    }
    let padded_end = (value_end + 3) & !3;

    Ok(Header::Element(Element {
        offset: pos,
        key,
        type_byte: h[4],
        struct_size,
        repeat,
        end: padded_end.min(limit),
    }))
}

/// Position inside a GPMF payload.
///
/// Cloning a stream snapshots its position; the clone moves independently.
#[derive(Debug, Clone)]
pub struct GpmfStream<'a> {
    buffer: &'a [u8],
    current: Option<Element>,
    /// End offsets of the containers enclosing `current`, outermost first.
    parents: Vec<usize>,
}

impl<'a> GpmfStream<'a> {
    /// Validates the payload structure and positions the cursor before its
    /// first element.
    pub fn new(buffer: &'a [u8]) -> Result<Self> {
        let stream = Self {
            buffer,
            current: None,
            parents: Vec::new(),
        };

        let mut probe = stream.clone();
        while probe.step(u32::MAX)? {}

        Ok(stream)
    }

    /// Moves to the next element in document order, entering containers while
    /// fewer than `max_depth` are open.
    fn step(&mut self, max_depth: u32) -> Result<bool> {
        let mut pos = match self.current {
            None => 0,
            Some(element) => {
                if element.is_nested()
                    && element.value_len() > 0
                    && (self.parents.len() as u32) < max_depth
                {
                    self.parents.push(element.end);
                    element.value_start()
                } else {
                    element.end
                }
            }
        };

        loop {
            let limit = self.parents.last().copied().unwrap_or(self.buffer.len());
            match read_header(self.buffer, pos, limit)? {
                Header::Element(element) => {
                    self.current = Some(element);
                    return Ok(true);
                }
                Header::End => match self.parents.pop() {
                    Some(end) => pos = end,
                    None => {
                        self.current = None;
                        return Ok(false);
                    }
                },
            }
        }
    }

    /// Searches forward for the next element with `key`.
    ///
    /// On success the cursor rests on the match; otherwise it is unchanged.
    pub fn find_next(&mut self, key: FourCC, max_depth: u32) -> bool {
        let saved_current = self.current;
        let saved_parents = self.parents.clone();

        while let Ok(true) = self.step(max_depth) {
            if self.current.is_some_and(|e| e.key == key) {
                return true;
            }
        }

        self.current = saved_current;
        self.parents = saved_parents;
        false
    }

    /// Moves to the next element, descending into containers. Returns false
    /// once the payload is exhausted.
    pub fn next_element(&mut self) -> bool {
        matches!(self.step(DEFAULT_MAX_DEPTH), Ok(true))
    }

    pub fn key(&self) -> Option<FourCC> {
        self.current.map(|e| e.key)
    }

    pub fn type_char(&self) -> Option<char> {
        self.current.map(|e| e.type_byte as char)
    }

    pub fn struct_size(&self) -> u8 {
        self.current.map_or(0, |e| e.struct_size)
    }

    /// Repeat count of the current element, 0 before the first match.
    pub fn sample_count(&self) -> u32 {
        self.current.map_or(0, |e| e.repeat as u32)
    }

    /// Number of containers enclosing the current element.
    pub fn depth(&self) -> usize {
        self.parents.len()
    }

    /// Byte range of the current element's value, without padding.
    pub fn raw_range(&self) -> Option<Range<usize>> {
        self.current
            .map(|e| e.value_start()..e.value_start() + e.value_len())
    }

    /// Value bytes of the current element.
    pub fn raw_data(&self) -> Option<&'a [u8]> {
        let range = self.raw_range()?;
        self.buffer.get(range)
    }

    /// Location of the current element's value as a sample series.
    pub fn location(&self) -> Option<SeriesLocation> {
        Some(SeriesLocation::new(self.raw_range()?, self.sample_count()))
    }
}

/// One-line description of the element under the cursor.
pub fn describe_stream(stream: &GpmfStream<'_>) -> String {
    match stream.current {
        None => "<no element>".to_string(),
        Some(e) if e.is_nested() => format!(
            "{:indent$}{} nested {} bytes",
            "",
            e.key,
            e.value_len(),
            indent = stream.depth() * 2
        ),
        Some(e) => format!(
            "{:indent$}{} type '{}' size {} repeat {}",
            "",
            e.key,
            e.type_byte as char,
            e.struct_size,
            e.repeat,
            indent = stream.depth() * 2
        ),
    }
}
