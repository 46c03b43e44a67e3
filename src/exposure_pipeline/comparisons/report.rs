/// Result of comparing two telemetry streams.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonReport {
    /// Stream durations in seconds.
    pub duration_a: f64,
    pub duration_b: f64,
    /// False when the durations were too far apart to compare.
    pub durations_matched: bool,
    /// Payload indices walked (the smaller of the two payload counts).
    pub payloads: u32,
    /// Payloads where both streams carried shutter and gain series.
    pub compared_payloads: u32,
    /// Payloads the limiting pass ran on.
    pub limited_payloads: u32,
    /// Shutter words rewritten across all payloads.
    pub rewritten_samples: usize,
    /// Samples skipped for non-positive exposure.
    pub skipped_samples: usize,
    /// Largest stop difference seen before any limiting.
    pub max_stop_difference: f32,
    /// The configured limit, set when it was exceeded.
    pub limit_applied: Option<f32>,
}

impl ComparisonReport {
    pub fn new(duration_a: f64, duration_b: f64) -> Self {
        Self {
            duration_a,
            duration_b,
            ..Self::default()
        }
    }

    /// Lines printed by the command line tool.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.max_stop_difference != 0.0 {
            lines.push(format!(
                "maximum exposure difference: {:.1} stops",
                self.max_stop_difference
            ));
        }
        if let Some(limit) = self.limit_applied {
            lines.push(format!("exposure difference limited to {:.1} stops", limit));
        }
        lines
    }
}
