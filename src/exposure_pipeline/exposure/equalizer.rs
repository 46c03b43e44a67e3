//! In-place shutter rewriting that caps the exposure gap between two streams.
//!
//! The pass walks stream A's shutter series. Each stream keeps its own cursor
//! which only advances while that stream still has both a shutter and a gain
//! sample at the current position; once a stream runs out, its last exposure
//! is reused and its cursor stays on the last word it reached. Which gain word
//! feeds the exposure depends on the [`RangePolicy`]. Gain series are only
//! ever borrowed shared.

use tracing::{debug, trace};

use crate::exposure_pipeline::common::error::{ExposureError, Result};
use crate::exposure_pipeline::exposure::compute::{compute_exposure, is_usable_exposure};
use crate::exposure_pipeline::exposure::scanner::comparable_samples;
use crate::exposure_pipeline::exposure::series::{SampleSeries, SampleSeriesMut};
use crate::exposure_pipeline::exposure::types::RangePolicy;

/// What one limiting pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EqualizeOutcome {
    /// Sample positions the pass walked.
    pub visited: usize,
    /// Shutter words rewritten in stream A.
    pub rewritten_a: usize,
    /// Shutter words rewritten in stream B.
    pub rewritten_b: usize,
}

impl EqualizeOutcome {
    pub fn rewritten(&self) -> usize {
        self.rewritten_a + self.rewritten_b
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExposureEqualizer {
    limit_stops: f32,
    max_scale: f32,
    policy: RangePolicy,
}

impl ExposureEqualizer {
    pub fn new(limit_stops: f32) -> Result<Self> {
        Self::with_policy(limit_stops, RangePolicy::CarryForward)
    }

    pub fn with_policy(limit_stops: f32, policy: RangePolicy) -> Result<Self> {
        if !limit_stops.is_finite() || limit_stops < 0.0 {
            return Err(ExposureError::InvalidLimit(limit_stops));
        }
        Ok(Self {
            limit_stops,
            max_scale: 2.0f32.powf(limit_stops),
            policy,
        })
    }

    pub fn limit_stops(&self) -> f32 {
        self.limit_stops
    }

    pub fn policy(&self) -> RangePolicy {
        self.policy
    }

    /// Rewrites shutter words so neither stream's exposure exceeds the other's
    /// by more than the configured number of stops.
    pub fn apply(
        &self,
        shut_a: &mut SampleSeriesMut<'_>,
        gain_a: &SampleSeries<'_>,
        shut_b: &mut SampleSeriesMut<'_>,
        gain_b: &SampleSeries<'_>,
    ) -> EqualizeOutcome {
        let (len_shut_a, len_gain_a) = (shut_a.len(), gain_a.len());
        let (len_shut_b, len_gain_b) = (shut_b.len(), gain_b.len());

        let steps = match self.policy {
            RangePolicy::CarryForward => len_shut_a,
            RangePolicy::Strict => {
                comparable_samples(&shut_a.as_series(), gain_a, &shut_b.as_series(), gain_b)
            }
        };

        // CarryForward keeps each stream's gain on its first word.
        let aligned_gain = self.policy == RangePolicy::Strict;

        let mut outcome = EqualizeOutcome::default();
        let mut exp_a: Option<f32> = None;
        let mut exp_b: Option<f32> = None;
        let mut pos_a = 0usize;
        let mut pos_b = 0usize;

        for i in 0..steps {
            let live_a = i < len_shut_a && i < len_gain_a;
            let live_b = i < len_shut_b && i < len_gain_b;

            if live_a {
                let gain_pos = if aligned_gain { pos_a } else { 0 };
                exp_a = shut_a
                    .raw(pos_a)
                    .zip(gain_a.raw(gain_pos))
                    .map(|(shutter, gain)| compute_exposure(shutter, gain));
            }
            if live_b {
                let gain_pos = if aligned_gain { pos_b } else { 0 };
                exp_b = shut_b
                    .raw(pos_b)
                    .zip(gain_b.raw(gain_pos))
                    .map(|(shutter, gain)| compute_exposure(shutter, gain));
            }

            let (Some(value_a), Some(value_b)) = (shut_a.value(pos_a), shut_b.value(pos_b)) else {
                debug!(sample = i, pos_a, pos_b, "Shutter series exhausted, ending limiting pass");
                break;
            };

            let scale = limit_scale(exp_a, exp_b, self.max_scale);
            if scale != 1.0 {
                if value_a >= value_b {
                    shut_a.set_value(pos_a, value_a / scale);
                    outcome.rewritten_a += 1;
                } else if value_b > value_a {
                    shut_b.set_value(pos_b, value_b / scale);
                    outcome.rewritten_b += 1;
                }
                trace!(sample = i, scale, value_a, value_b, "Limited shutter");
            }

            outcome.visited += 1;

            if live_a {
                pos_a += 1;
            }
            if live_b {
                pos_b += 1;
            }
        }

        outcome
    }
}

/// Factor the larger shutter must shrink by, 1.0 when within the limit or
/// when either exposure is unusable.
fn limit_scale(exp_a: Option<f32>, exp_b: Option<f32>, max_scale: f32) -> f32 {
    let (Some(exp_a), Some(exp_b)) = (exp_a, exp_b) else {
        return 1.0;
    };
    if !is_usable_exposure(exp_a) || !is_usable_exposure(exp_b) {
        return 1.0;
    }

    let diff_a = (exp_b / exp_a).abs();
    let diff_b = (exp_a / exp_b).abs();
    let mut scale = 1.0;

    if diff_a > max_scale {
        scale = diff_a / max_scale;
    }
    // Evaluated after the A-driven check and may replace it.
    if diff_b > max_scale {
        scale = diff_b / max_scale;
    }

    if scale.is_finite() { scale } else { 1.0 }
}

/// Caps the exposure gap between two streams at `limit_stops`, rewriting
/// shutter words in place with the carry-forward range policy.
///
/// Returns `Ok(true)` once the pass has walked at least one sample position.
pub fn limit_exposure_difference(
    shut_a: &mut SampleSeriesMut<'_>,
    gain_a: &SampleSeries<'_>,
    shut_b: &mut SampleSeriesMut<'_>,
    gain_b: &SampleSeries<'_>,
    limit_stops: f32,
) -> Result<bool> {
    let outcome = ExposureEqualizer::new(limit_stops)?.apply(shut_a, gain_a, shut_b, gain_b);
    Ok(outcome.visited > 0)
}
