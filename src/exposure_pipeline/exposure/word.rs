//! Wire-word codec for GPMF float samples.
//!
//! GPMF stores every scalar big-endian. A raw word is the 32-bit value exactly
//! as it sits in the payload buffer (loaded in native byte order); it has to be
//! converted out of big-endian before it can be read as an `f32`, and back
//! again before it is stored.

/// Size in bytes of one raw word.
pub const WORD_SIZE: usize = 4;

/// Reverses the byte order of a 32-bit word.
#[inline]
pub fn byte_swap(word: u32) -> u32 {
    word.swap_bytes()
}

/// Decodes a stored big-endian IEEE-754 word into a float.
#[inline]
pub fn decode_word(raw: u32) -> f32 {
    f32::from_bits(u32::from_be(raw))
}

/// Encodes a float into the stored big-endian word representation.
#[inline]
pub fn encode_word(value: f32) -> u32 {
    value.to_bits().to_be()
}

/// Loads the raw word at word `index` of `bytes`.
#[inline]
pub fn read_word(bytes: &[u8], index: usize) -> Option<u32> {
    let start = index.checked_mul(WORD_SIZE)?;
    let chunk = bytes.get(start..start.checked_add(WORD_SIZE)?)?;
    Some(u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
}

/// Stores `raw` at word `index` of `bytes`. Returns false when out of range.
#[inline]
pub fn write_word(bytes: &mut [u8], index: usize, raw: u32) -> bool {
    let Some(start) = index.checked_mul(WORD_SIZE) else {
        return false;
    };
    let Some(end) = start.checked_add(WORD_SIZE) else {
        return false;
    };
    match bytes.get_mut(start..end) {
        Some(chunk) => {
            chunk.copy_from_slice(&raw.to_ne_bytes());
            true
        }
        None => false,
    }
}
