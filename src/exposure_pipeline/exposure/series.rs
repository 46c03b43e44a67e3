//! Bounded views over runs of raw sample words inside a payload buffer.

use std::ops::Range;

use crate::exposure_pipeline::common::error::{ExposureError, Result};
use crate::exposure_pipeline::exposure::word::{self, WORD_SIZE};

/// Where a sample series lives inside a payload buffer.
///
/// Produced by a tag lookup and holds no borrow, so cursors over a buffer can
/// be dropped before the buffer is lent out mutably.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesLocation {
    /// Byte range of the element's value.
    pub range: Range<usize>,
    /// Repeat count reported by the element header.
    pub count: u32,
}

impl SeriesLocation {
    pub fn new(range: Range<usize>, count: u32) -> Self {
        Self { range, count }
    }

    /// Read-only view of this series inside `buffer`.
    pub fn view<'a>(&self, buffer: &'a [u8]) -> Result<SampleSeries<'a>> {
        let bytes = buffer.get(self.range.clone()).ok_or_else(|| {
            out_of_buffer(&self.range, buffer.len())
        })?;
        Ok(SampleSeries::new(bytes, self.count))
    }
}

fn out_of_buffer(range: &Range<usize>, len: usize) -> ExposureError {
    ExposureError::InvalidPayload(format!(
        "series bytes {}..{} outside payload of {} bytes",
        range.start, range.end, len
    ))
}

/// Read-only run of raw words.
#[derive(Debug, Clone, Copy)]
pub struct SampleSeries<'a> {
    bytes: &'a [u8],
    count: usize,
}

impl<'a> SampleSeries<'a> {
    /// Wraps `bytes`, clamping `count` to the number of whole words present.
    pub fn new(bytes: &'a [u8], count: u32) -> Self {
        let count = (count as usize).min(bytes.len() / WORD_SIZE);
        Self { bytes, count }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Raw stored word at `index`, `None` past the end of the series.
    pub fn raw(&self, index: usize) -> Option<u32> {
        if index >= self.count {
            return None;
        }
        word::read_word(self.bytes, index)
    }

    /// Decoded value at `index`.
    pub fn value(&self, index: usize) -> Option<f32> {
        self.raw(index).map(word::decode_word)
    }

    pub fn values(&self) -> impl Iterator<Item = f32> + '_ {
        (0..self.count).filter_map(move |i| self.value(i))
    }
}

/// Exclusively borrowed run of raw words that may be rewritten in place.
#[derive(Debug)]
pub struct SampleSeriesMut<'a> {
    bytes: &'a mut [u8],
    count: usize,
}

impl<'a> SampleSeriesMut<'a> {
    pub fn new(bytes: &'a mut [u8], count: u32) -> Self {
        let count = (count as usize).min(bytes.len() / WORD_SIZE);
        Self { bytes, count }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn raw(&self, index: usize) -> Option<u32> {
        if index >= self.count {
            return None;
        }
        word::read_word(self.bytes, index)
    }

    pub fn value(&self, index: usize) -> Option<f32> {
        self.raw(index).map(word::decode_word)
    }

    /// Stores a raw word. Returns false when `index` is past the series end.
    pub fn set_raw(&mut self, index: usize, raw: u32) -> bool {
        if index >= self.count {
            return false;
        }
        word::write_word(self.bytes, index, raw)
    }

    /// Encodes `value` back to wire order and stores it.
    pub fn set_value(&mut self, index: usize, value: f32) -> bool {
        self.set_raw(index, word::encode_word(value))
    }

    pub fn as_series(&self) -> SampleSeries<'_> {
        SampleSeries {
            bytes: self.bytes,
            count: self.count,
        }
    }
}

/// Splits one payload into a writable shutter view and a read-only gain view.
///
/// The two ranges must not overlap.
pub fn split_series_mut<'a>(
    buffer: &'a mut [u8],
    shutter: &SeriesLocation,
    gain: &SeriesLocation,
) -> Result<(SampleSeriesMut<'a>, SampleSeries<'a>)> {
    let len = buffer.len();
    for location in [shutter, gain] {
        if location.range.start > location.range.end || location.range.end > len {
            return Err(out_of_buffer(&location.range, len));
        }
    }

    let shutter_len = shutter.range.len();
    let gain_len = gain.range.len();

    if shutter.range.end <= gain.range.start {
        let (head, tail) = buffer.split_at_mut(gain.range.start);
        let shut = SampleSeriesMut::new(&mut head[shutter.range.clone()], shutter.count);
        let gain = SampleSeries::new(&tail[..gain_len], gain.count);
        Ok((shut, gain))
    } else if gain.range.end <= shutter.range.start {
        let (head, tail) = buffer.split_at_mut(shutter.range.start);
        let gain = SampleSeries::new(&head[gain.range.clone()], gain.count);
        let shut = SampleSeriesMut::new(&mut tail[..shutter_len], shutter.count);
        Ok((shut, gain))
    } else {
        Err(ExposureError::InvalidPayload(format!(
            "shutter bytes {}..{} overlap gain bytes {}..{}",
            shutter.range.start, shutter.range.end, gain.range.start, gain.range.end
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exposure_pipeline::exposure::word::encode_word;

    fn words(values: &[f32]) -> Vec<u8> {
        values
            .iter()
            .flat_map(|v| encode_word(*v).to_ne_bytes())
            .collect()
    }

    #[test]
    fn test_count_is_clamped_to_available_words() {
        let bytes = words(&[1.0, 2.0]);
        let series = SampleSeries::new(&bytes, 5);
        assert_eq!(series.len(), 2);
        assert_eq!(series.value(1), Some(2.0));
        assert_eq!(series.value(2), None);
    }

    #[test]
    fn test_count_limits_access_when_smaller_than_bytes() {
        let bytes = words(&[1.0, 2.0, 3.0]);
        let series = SampleSeries::new(&bytes, 1);
        assert_eq!(series.values().collect::<Vec<_>>(), vec![1.0]);
        assert_eq!(series.raw(1), None);
    }

    #[test]
    fn test_set_value_past_end_is_rejected() {
        let mut bytes = words(&[1.0]);
        let mut series = SampleSeriesMut::new(&mut bytes, 1);
        assert!(series.set_value(0, 0.5));
        assert!(!series.set_value(1, 0.5));
        assert_eq!(series.as_series().value(0), Some(0.5));
    }

    #[test]
    fn test_split_either_order() {
        let mut buffer = words(&[1.0, 2.0, 3.0, 4.0]);

        let shutter = SeriesLocation::new(0..8, 2);
        let gain = SeriesLocation::new(8..16, 2);
        let (mut shut, gain_view) = split_series_mut(&mut buffer, &shutter, &gain).unwrap();
        assert_eq!(gain_view.value(0), Some(3.0));
        assert!(shut.set_value(1, 9.0));
        assert_eq!(buffer[4..8], encode_word(9.0).to_ne_bytes());

        let shutter = SeriesLocation::new(8..16, 2);
        let gain = SeriesLocation::new(0..8, 2);
        let (shut, gain_view) = split_series_mut(&mut buffer, &shutter, &gain).unwrap();
        assert_eq!(shut.value(0), Some(3.0));
        assert_eq!(gain_view.value(1), Some(9.0));
    }

    #[test]
    fn test_split_rejects_overlap_and_out_of_range() {
        let mut buffer = words(&[1.0, 2.0, 3.0]);
        let a = SeriesLocation::new(0..8, 2);
        let b = SeriesLocation::new(4..12, 2);
        assert!(matches!(
            split_series_mut(&mut buffer, &a, &b),
            Err(ExposureError::InvalidPayload(_))
        ));

        let c = SeriesLocation::new(8..16, 2);
        assert!(split_series_mut(&mut buffer, &a, &c).is_err());
    }
}
