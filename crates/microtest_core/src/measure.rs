//! Run measurements and their aggregate summary.

/// Start and end timestamps of a single run, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub start: f64,
    pub end: f64,
}

impl Measurement {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Elapsed milliseconds for this run.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Aggregate timing over every measured run of a verification session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceSummary {
    /// End of the last run minus start of the first run.
    pub total_ms: f64,
    /// Mean of the individual run durations.
    pub average_ms: f64,
    /// Number of measured runs.
    pub runs: usize,
}

impl PerformanceSummary {
    /// Summarize per-group measurement buckets.
    ///
    /// ## Returns
    /// - (`Option<PerformanceSummary>`): `None` when no bucket holds a measurement.
    ///
    /// ## Notes
    /// - Empty buckets (groups that never ran after a halt) are skipped rather than treated as zero.
    pub fn from_buckets(buckets: &[Vec<Measurement>]) -> Option<Self> {
        let mut runs = buckets.iter().flatten();
        let first = runs.next()?;

        let mut last = first;
        let mut summed = first.duration();
        let mut count = 1usize;
        for run in runs {
            summed += run.duration();
            count += 1;
            last = run;
        }

        Some(Self {
            total_ms: last.end - first.start,
            average_ms: summed / count as f64,
            runs: count,
        })
    }
}
