use tracing::debug;

use crate::exposure_pipeline::exposure::compute::{compute_exposure, stop_difference};
use crate::exposure_pipeline::exposure::series::SampleSeries;

/// Outcome of one diff scan over a payload pair.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StopScan {
    /// Largest stop difference seen, 0.0 when nothing was compared.
    pub max_stops: f32,
    /// Sample positions that produced a stop difference.
    pub compared: usize,
    /// Sample positions skipped because an exposure was not positive.
    pub skipped: usize,
}

/// Number of sample positions both streams can supply.
pub fn comparable_samples(
    shut_a: &SampleSeries<'_>,
    gain_a: &SampleSeries<'_>,
    shut_b: &SampleSeries<'_>,
    gain_b: &SampleSeries<'_>,
) -> usize {
    shut_a
        .len()
        .min(gain_a.len())
        .min(shut_b.len())
        .min(gain_b.len())
}

/// Walks both streams position by position and records the widest gap in stops.
pub fn scan_exposure_difference(
    shut_a: &SampleSeries<'_>,
    gain_a: &SampleSeries<'_>,
    shut_b: &SampleSeries<'_>,
    gain_b: &SampleSeries<'_>,
) -> StopScan {
    let samples = comparable_samples(shut_a, gain_a, shut_b, gain_b);
    let mut scan = StopScan::default();

    for i in 0..samples {
        // All four series hold at least `samples` words.
        let (Some(sa), Some(ga), Some(sb), Some(gb)) =
            (shut_a.raw(i), gain_a.raw(i), shut_b.raw(i), gain_b.raw(i))
        else {
            break;
        };

        let exp_a = compute_exposure(sa, ga);
        let exp_b = compute_exposure(sb, gb);

        match stop_difference(exp_a, exp_b) {
            Some(diff) => {
                scan.compared += 1;
                if diff > scan.max_stops {
                    scan.max_stops = diff;
                }
            }
            None => {
                debug!(sample = i, exp_a, exp_b, "Skipping sample with unusable exposure");
                scan.skipped += 1;
            }
        }
    }

    scan
}

/// Maximum stop difference between the two streams' exposures.
pub fn scan_max_stop_difference(
    shut_a: &SampleSeries<'_>,
    gain_a: &SampleSeries<'_>,
    shut_b: &SampleSeries<'_>,
    gain_b: &SampleSeries<'_>,
) -> f32 {
    scan_exposure_difference(shut_a, gain_a, shut_b, gain_b).max_stops
}
