use std::path::Path;

use tracing::{debug, info, instrument, warn};

use crate::exposure_pipeline::{
    common::error::Result,
    comparisons::report::ComparisonReport,
    exposure::{
        scan_exposure_difference, split_series_mut, ExposureConfig, ExposureEqualizer,
        SeriesLocation,
    },
    gpmf::{FourCC, GpmfStream},
    source::{Mp4PayloadSource, PayloadSource},
};

/// Callback handed the root cursor of every payload of stream A and B.
pub type PayloadInspector = Box<dyn Fn(u32, &GpmfStream<'_>)>;

/// Shutter and gain series of both streams inside one payload pair.
#[derive(Debug, Clone)]
struct PayloadLayout {
    shut_a: SeriesLocation,
    gain_a: SeriesLocation,
    shut_b: SeriesLocation,
    gain_b: SeriesLocation,
}

/// Whether two durations are both positive and within `tolerance` of each other.
pub fn durations_match(duration_a: f64, duration_b: f64, tolerance: f64) -> bool {
    duration_a > 0.0
        && duration_b > 0.0
        && duration_a < duration_b * tolerance
        && duration_a * tolerance > duration_b
}

fn find_series(root: &GpmfStream<'_>, key: FourCC, max_depth: u32) -> Option<SeriesLocation> {
    let mut cursor = root.clone();
    if cursor.find_next(key, max_depth) {
        cursor.location()
    } else {
        None
    }
}

fn find_layout(
    stream_a: &GpmfStream<'_>,
    stream_b: &GpmfStream<'_>,
    shutter_key: FourCC,
    gain_key: FourCC,
    max_depth: u32,
) -> Option<PayloadLayout> {
    Some(PayloadLayout {
        shut_a: find_series(stream_a, shutter_key, max_depth)?,
        shut_b: find_series(stream_b, shutter_key, max_depth)?,
        gain_a: find_series(stream_a, gain_key, max_depth)?,
        gain_b: find_series(stream_b, gain_key, max_depth)?,
    })
}

pub struct ExposureComparisonPipeline {
    config: ExposureConfig,
    inspector: Option<PayloadInspector>,
}

impl ExposureComparisonPipeline {
    pub fn new(config: ExposureConfig) -> Self {
        Self {
            config,
            inspector: None,
        }
    }

    pub fn with_inspector(mut self, inspector: impl Fn(u32, &GpmfStream<'_>) + 'static) -> Self {
        self.inspector = Some(Box::new(inspector));
        self
    }

    fn locate(&self, index: u32, buffer_a: &[u8], buffer_b: &[u8]) -> Result<Option<PayloadLayout>> {
        let stream_a = GpmfStream::new(buffer_a)?;
        let stream_b = GpmfStream::new(buffer_b)?;

        if let Some(inspect) = &self.inspector {
            inspect(index, &stream_a);
            inspect(index, &stream_b);
        }

        Ok(find_layout(
            &stream_a,
            &stream_b,
            self.config.shutter_key,
            self.config.gain_key,
            self.config.max_depth,
        ))
    }

    /// Compares two streams payload by payload and, when a limit is
    /// configured and exceeded, rewrites shutter samples and saves the
    /// payloads back to their sources.
    #[instrument(skip(self, source_a, source_b))]
    pub fn compare<A: PayloadSource, B: PayloadSource>(
        &self,
        source_a: &mut A,
        source_b: &mut B,
    ) -> Result<ComparisonReport> {
        let equalizer = self
            .config
            .limit_stops
            .map(|limit| ExposureEqualizer::with_policy(limit, self.config.range_policy))
            .transpose()?;

        let duration_a = source_a.duration();
        let duration_b = source_b.duration();
        let mut report = ComparisonReport::new(duration_a, duration_b);

        if !durations_match(duration_a, duration_b, self.config.duration_tolerance) {
            warn!(duration_a, duration_b, "Stream durations differ too much, skipping comparison");
            return Ok(report);
        }
        report.durations_matched = true;

        let payloads = source_a.payload_count().min(source_b.payload_count());
        report.payloads = payloads;
        info!(payloads, duration_a, duration_b, "Starting exposure comparison");

        // Both buffers live for the whole run and are reused per payload.
        let mut buffer_a = Vec::new();
        let mut buffer_b = Vec::new();

        for index in 0..payloads {
            let _span = tracing::info_span!("payload", index).entered();

            {
                let _span = tracing::debug_span!("fetch").entered();
                source_a.read_payload(&mut buffer_a, index)?;
                source_b.read_payload(&mut buffer_b, index)?;
            }
            let (time_in, time_out) = source_a.payload_time(index)?;

            let Some(layout) = self.locate(index, &buffer_a, &buffer_b)? else {
                debug!(time_in, time_out, "Shutter or gain missing, skipping payload");
                continue;
            };

            let scan = {
                let _span = tracing::debug_span!("scan").entered();
                scan_exposure_difference(
                    &layout.shut_a.view(&buffer_a)?,
                    &layout.gain_a.view(&buffer_a)?,
                    &layout.shut_b.view(&buffer_b)?,
                    &layout.gain_b.view(&buffer_b)?,
                )
            };
            debug!(
                time_in,
                time_out,
                max_stops = scan.max_stops,
                compared = scan.compared,
                skipped = scan.skipped,
                "Scanned payload"
            );

            report.compared_payloads += 1;
            report.skipped_samples += scan.skipped;
            if scan.max_stops > report.max_stop_difference {
                report.max_stop_difference = scan.max_stops;
            }

            // Gated on the largest difference seen so far, not just this payload's.
            let Some(equalizer) = &equalizer else {
                continue;
            };
            if report.max_stop_difference <= equalizer.limit_stops() {
                continue;
            }

            let outcome = {
                let _span = tracing::debug_span!("limit").entered();
                let (mut shut_a, gain_a) =
                    split_series_mut(&mut buffer_a, &layout.shut_a, &layout.gain_a)?;
                let (mut shut_b, gain_b) =
                    split_series_mut(&mut buffer_b, &layout.shut_b, &layout.gain_b)?;
                equalizer.apply(&mut shut_a, &gain_a, &mut shut_b, &gain_b)
            };
            debug!(
                rewritten_a = outcome.rewritten_a,
                rewritten_b = outcome.rewritten_b,
                "Limited payload"
            );

            report.limited_payloads += 1;
            report.rewritten_samples += outcome.rewritten();

            if self.config.persist {
                let _span = tracing::debug_span!("save").entered();
                source_a.save_payload(&buffer_a, index)?;
                source_b.save_payload(&buffer_b, index)?;
            }
        }

        if let Some(limit) = self.config.limit_stops {
            if report.max_stop_difference > limit {
                report.limit_applied = Some(limit);
            }
        }

        info!(
            max_stops = report.max_stop_difference,
            compared = report.compared_payloads,
            limited = report.limited_payloads,
            "Comparison complete"
        );
        Ok(report)
    }

    /// Opens both files as MP4 sources and compares them. Files are opened
    /// for writing only when limited payloads will be persisted.
    #[instrument(skip(self, path_a, path_b))]
    pub fn compare_files<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        path_a: P,
        path_b: Q,
    ) -> Result<ComparisonReport> {
        let path_a = path_a.as_ref();
        let path_b = path_b.as_ref();
        let writable = self.config.limit_stops.is_some() && self.config.persist;

        info!(
            a = %path_a.display(),
            b = %path_b.display(),
            writable,
            "Comparing files"
        );

        let mut source_a = Mp4PayloadSource::open(path_a, writable)?;
        let mut source_b = Mp4PayloadSource::open(path_b, writable)?;

        self.compare(&mut source_a, &mut source_b)
    }

    pub fn config(&self) -> &ExposureConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ExposureConfig) {
        self.config = config;
    }
}
