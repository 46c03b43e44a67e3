use crate::exposure_pipeline::exposure::word::decode_word;

/// Relative exposure of one sample: shutter time multiplied by ISO gain.
///
/// Both arguments are raw stored words. The result is not validated; run it
/// through [`is_usable_exposure`] before taking ratios or logarithms.
#[inline]
pub fn compute_exposure(shutter_raw: u32, gain_raw: u32) -> f32 {
    decode_word(shutter_raw) * decode_word(gain_raw)
}

/// Whether an exposure value can take part in a ratio or logarithm.
#[inline]
pub fn is_usable_exposure(exposure: f32) -> bool {
    exposure.is_finite() && exposure > 0.0
}

/// `|log2(b / a)|`, or `None` when either exposure is unusable.
#[inline]
pub fn stop_difference(exposure_a: f32, exposure_b: f32) -> Option<f32> {
    if !is_usable_exposure(exposure_a) || !is_usable_exposure(exposure_b) {
        return None;
    }
    let stops = (exposure_b / exposure_a).log2().abs();
    stops.is_finite().then_some(stops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exposure_pipeline::exposure::word::encode_word;

    #[test]
    fn test_exposure_of_hundredth_second_at_iso_100_is_one() {
        let exposure = compute_exposure(encode_word(0.01), encode_word(100.0));
        assert!((exposure - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_stop_difference() {
        assert_eq!(stop_difference(1.0, 2.0), Some(1.0));
        assert_eq!(stop_difference(4.0, 1.0), Some(2.0));
        assert_eq!(stop_difference(3.0, 3.0), Some(0.0));
    }

    #[test]
    fn test_stop_difference_rejects_non_positive() {
        assert_eq!(stop_difference(0.0, 1.0), None);
        assert_eq!(stop_difference(1.0, -2.0), None);
        assert_eq!(stop_difference(f32::NAN, 1.0), None);
        assert_eq!(stop_difference(1.0, f32::INFINITY), None);
    }
}
