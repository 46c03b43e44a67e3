use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use gpmf_expose_rs::exposure_pipeline::gpmf::describe_stream;
use gpmf_expose_rs::exposure_pipeline::{
    ExposureComparisonPipeline, ExposureConfig, FourCC, RangePolicy,
};
use gpmf_expose_rs::logger;

use tracing::{debug, info};

/// Compare the exposure recorded in the GPMF telemetry of two camera files
/// and optionally limit the difference in place.
#[derive(Parser, Debug)]
#[command(name = "gpmf-expose", version, about)]
struct Cli {
    /// First MP4/MOV file
    file_a: PathBuf,

    /// Second MP4/MOV file
    file_b: PathBuf,

    /// Largest allowed exposure difference in stops (e.g. -s1.5); a negative
    /// value only measures
    #[arg(short = 's', long = "stops", value_name = "STOPS", allow_negative_numbers = true)]
    max_stops: Option<f32>,

    /// Stop limiting at the shortest of the four sample series
    #[arg(long)]
    strict: bool,

    /// Maximum ratio between the two file durations
    #[arg(long, default_value_t = 1.2)]
    tolerance: f64,

    /// Report what would be limited without writing either file
    #[arg(long)]
    dry_run: bool,

    /// Tag holding shutter time samples
    #[arg(long, default_value = "SHUT")]
    shutter_key: FourCC,

    /// Tag holding ISO gain samples
    #[arg(long, default_value = "ISOG")]
    gain_key: FourCC,

    /// Log the element layout of every payload at debug level
    #[arg(long)]
    dump: bool,
}

impl Cli {
    /// Negative (and NaN) limits turn limiting off.
    fn limit_stops(&self) -> Option<f32> {
        self.max_stops.filter(|stops| *stops >= 0.0)
    }

    fn config(&self) -> ExposureConfig {
        ExposureConfig::builder()
            .limit_stops(self.limit_stops())
            .duration_tolerance(self.tolerance)
            .range_policy(if self.strict {
                RangePolicy::Strict
            } else {
                RangePolicy::CarryForward
            })
            .shutter_key(self.shutter_key)
            .gain_key(self.gain_key)
            .persist(!self.dry_run)
            .build()
    }
}

fn main() -> Result<()> {
    logger::init();

    let cli = Cli::parse();
    let config = cli.config();

    info!("Starting gpmf-expose...");
    info!("Limit: {:?} stops", config.limit_stops);
    info!("Range policy: {:?}", config.range_policy);
    info!(
        "Persist: {}",
        if config.persist { "enabled" } else { "disabled" }
    );

    let mut pipeline = ExposureComparisonPipeline::new(config);
    if cli.dump {
        pipeline = pipeline.with_inspector(|index, stream| {
            let mut cursor = stream.clone();
            while cursor.next_element() {
                debug!(payload = index, "{}", describe_stream(&cursor));
            }
        });
    }

    let report = pipeline
        .compare_files(&cli.file_a, &cli.file_b)
        .with_context(|| {
            format!(
                "comparing {} with {}",
                cli.file_a.display(),
                cli.file_b.display()
            )
        })?;

    for line in report.summary_lines() {
        println!("{line}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_attached_stop_limit() {
        let cli = Cli::try_parse_from(["gpmf-expose", "a.mp4", "b.mp4", "-s1.5"]).unwrap();
        assert_eq!(cli.max_stops, Some(1.5));
        assert_eq!(cli.file_a, PathBuf::from("a.mp4"));

        let config = cli.config();
        assert_eq!(config.limit_stops, Some(1.5));
        assert_eq!(config.range_policy, RangePolicy::CarryForward);
        assert!(config.persist);
        assert_eq!(config.shutter_key, FourCC::SHUT);
    }

    #[test]
    fn test_defaults_measure_only() {
        let cli = Cli::try_parse_from(["gpmf-expose", "a.mp4", "b.mp4"]).unwrap();
        let config = cli.config();
        assert_eq!(config.limit_stops, None);
        assert_eq!(config.duration_tolerance, 1.2);
    }

    #[test]
    fn test_flags_map_to_config() {
        let cli = Cli::try_parse_from([
            "gpmf-expose",
            "a.mp4",
            "b.mp4",
            "--stops",
            "2",
            "--strict",
            "--dry-run",
            "--tolerance",
            "1.5",
            "--gain-key",
            "ISOE",
        ])
        .unwrap();
        let config = cli.config();
        assert_eq!(config.limit_stops, Some(2.0));
        assert_eq!(config.range_policy, RangePolicy::Strict);
        assert!(!config.persist);
        assert_eq!(config.duration_tolerance, 1.5);
        assert_eq!(config.gain_key, FourCC(*b"ISOE"));
    }

    #[test]
    fn test_negative_limit_only_measures() {
        for args in [
            &["gpmf-expose", "a.mp4", "b.mp4", "-s-1"][..],
            &["gpmf-expose", "a.mp4", "b.mp4", "-s", "-0.5"][..],
        ] {
            let cli = Cli::try_parse_from(args).unwrap();
            assert!(cli.max_stops.is_some_and(|stops| stops < 0.0));
            assert_eq!(cli.config().limit_stops, None);
        }

        let zero = Cli::try_parse_from(["gpmf-expose", "a.mp4", "b.mp4", "-s0"]).unwrap();
        assert_eq!(zero.config().limit_stops, Some(0.0));
    }

    #[test]
    fn test_rejects_bad_arguments() {
        assert!(Cli::try_parse_from(["gpmf-expose", "a.mp4"]).is_err());
        assert!(Cli::try_parse_from(["gpmf-expose", "a.mp4", "b.mp4", "-sabc"]).is_err());
        assert!(
            Cli::try_parse_from(["gpmf-expose", "a.mp4", "b.mp4", "--shutter-key", "TOOLONG"])
                .is_err()
        );
    }
}
