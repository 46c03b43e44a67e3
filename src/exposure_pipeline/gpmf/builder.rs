//! Minimal GPMF payload writer for fixtures and in-memory sources.

use crate::exposure_pipeline::exposure::word::encode_word;
use crate::exposure_pipeline::gpmf::stream::TYPE_NESTED;

#[derive(Debug, Default, Clone)]
pub struct KlvBuilder {
    bytes: Vec<u8>,
}

impl KlvBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one element with an already encoded value, padding it to a
    /// 4-byte boundary. `value` must be `struct_size * repeat` bytes.
    pub fn element(mut self, key: &[u8; 4], type_byte: u8, struct_size: u8, repeat: u16, value: &[u8]) -> Self {
        debug_assert_eq!(value.len(), struct_size as usize * repeat as usize);
        self.bytes.extend_from_slice(key);
        self.bytes.push(type_byte);
        self.bytes.push(struct_size);
        self.bytes.extend_from_slice(&repeat.to_be_bytes());
        self.bytes.extend_from_slice(value);
        while self.bytes.len() % 4 != 0 {
            self.bytes.push(0);
        }
        self
    }

    /// Big-endian `f` samples.
    pub fn floats(self, key: &[u8; 4], values: &[f32]) -> Self {
        let value: Vec<u8> = values
            .iter()
            .flat_map(|v| encode_word(*v).to_ne_bytes())
            .collect();
        self.element(key, b'f', 4, values.len() as u16, &value)
    }

    /// Big-endian `L` samples.
    pub fn u32_values(self, key: &[u8; 4], values: &[u32]) -> Self {
        let value: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        self.element(key, b'L', 4, values.len() as u16, &value)
    }

    /// A container whose children are written by `children`.
    pub fn nested(self, key: &[u8; 4], children: impl FnOnce(KlvBuilder) -> KlvBuilder) -> Self {
        let inner = children(KlvBuilder::new()).build();
        // Children are 4-byte aligned, so the length always splits into words.
        match u16::try_from(inner.len()) {
            Ok(len) => self.element(key, TYPE_NESTED, 1, len, &inner),
            Err(_) => self.element(key, TYPE_NESTED, 4, (inner.len() / 4) as u16, &inner),
        }
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Payload with one device holding a `SHUT` stream and an `ISOG` stream.
pub fn exposure_payload(shutter: &[f32], gain: &[f32]) -> Vec<u8> {
    KlvBuilder::new()
        .nested(b"DEVC", |devc| {
            devc.u32_values(b"DVID", &[1])
                .nested(b"STRM", |strm| strm.floats(b"SHUT", shutter))
                .nested(b"STRM", |strm| strm.floats(b"ISOG", gain))
        })
        .build()
}
