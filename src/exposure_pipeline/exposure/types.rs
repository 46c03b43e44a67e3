//! Exposure comparison configuration types

use crate::exposure_pipeline::gpmf::FourCC;

/// How the limiting pass treats a stream whose series run out first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangePolicy {
    /// Keep walking stream A's shutter series, reusing the last exposure
    /// computed for a stream once its series are exhausted (default).
    ///
    /// Exposure is recomputed from each stream's current shutter word and its
    /// *first* gain word. The pass ends as soon as either stream's shutter cursor
    /// points past its series, so stream A samples after that point are left
    /// untouched.
    #[default]
    CarryForward,
    /// Stop at the first position any of the four series cannot supply,
    /// pairing every shutter word with the gain word at the same position
    Strict,
}

/// Configuration for comparing and limiting exposure between two streams
#[derive(Debug, Clone)]
pub struct ExposureConfig {
    /// Largest allowed difference in stops; `None` only measures
    pub limit_stops: Option<f32>,
    /// Maximum ratio between the two stream durations (1.2 = within 20%)
    pub duration_tolerance: f64,
    /// How many container levels a tag lookup may descend
    pub max_depth: u32,
    /// Range handling for the limiting pass
    pub range_policy: RangePolicy,
    /// Tag holding shutter time samples
    pub shutter_key: FourCC,
    /// Tag holding ISO gain samples
    pub gain_key: FourCC,
    /// Whether limited payloads are written back to their sources
    pub persist: bool,
}

impl Default for ExposureConfig {
    fn default() -> Self {
        Self {
            limit_stops: None,
            duration_tolerance: 1.2,
            max_depth: 8,
            range_policy: RangePolicy::CarryForward,
            shutter_key: FourCC::SHUT,
            gain_key: FourCC::ISOG,
            persist: true,
        }
    }
}

impl ExposureConfig {
    pub fn builder() -> ExposureConfigBuilder {
        ExposureConfigBuilder::default()
    }
}

/// Builder for ExposureConfig
#[derive(Default)]
pub struct ExposureConfigBuilder {
    limit_stops: Option<Option<f32>>,
    duration_tolerance: Option<f64>,
    max_depth: Option<u32>,
    range_policy: Option<RangePolicy>,
    shutter_key: Option<FourCC>,
    gain_key: Option<FourCC>,
    persist: Option<bool>,
}

impl ExposureConfigBuilder {
    pub fn limit_stops(mut self, limit: Option<f32>) -> Self {
        self.limit_stops = Some(limit);
        self
    }

    pub fn duration_tolerance(mut self, tolerance: f64) -> Self {
        self.duration_tolerance = Some(tolerance);
        self
    }

    pub fn max_depth(mut self, depth: u32) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn range_policy(mut self, policy: RangePolicy) -> Self {
        self.range_policy = Some(policy);
        self
    }

    pub fn shutter_key(mut self, key: FourCC) -> Self {
        self.shutter_key = Some(key);
        self
    }

    pub fn gain_key(mut self, key: FourCC) -> Self {
        self.gain_key = Some(key);
        self
    }

    pub fn persist(mut self, persist: bool) -> Self {
        self.persist = Some(persist);
        self
    }

    pub fn build(self) -> ExposureConfig {
        let default = ExposureConfig::default();
        ExposureConfig {
            limit_stops: self.limit_stops.unwrap_or(default.limit_stops),
            duration_tolerance: self.duration_tolerance.unwrap_or(default.duration_tolerance),
            max_depth: self.max_depth.unwrap_or(default.max_depth),
            range_policy: self.range_policy.unwrap_or(default.range_policy),
            shutter_key: self.shutter_key.unwrap_or(default.shutter_key),
            gain_key: self.gain_key.unwrap_or(default.gain_key),
            persist: self.persist.unwrap_or(default.persist),
        }
    }
}
