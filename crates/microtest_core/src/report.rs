//! Report configuration and rendering.
//!
//! A report is a single string: a header line (`✓ name test passed`), an optional performance clause, an optional
//! per-run duration table, and on failure the mismatched `Expected`/`Received` values.

use std::fmt::{self, Write as _};
use std::str::FromStr;

use thiserror::Error;

use crate::measure::{Measurement, PerformanceSummary};

/// Icons used for passed and failed reports, in that order.
pub const DEFAULT_ICONS: [&str; 2] = ["✓", "✕"];

const TABLE_TOP: &str = "\n  ╭───────┬───────┬───────────────╮\n  │ Test  │ Run   │ Duration (ms) │";
const TABLE_GROUP_RULE: &str = "\n  ├───────┼───────┼───────────────┤";
const TABLE_BOTTOM: &str = "\n  ╰───────┴───────┴───────────────╯";

/// Severity with which a failed verification is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    /// Informational log for both outcomes.
    #[default]
    Info,
    /// Failures are logged as warnings.
    Warn,
    /// Failures are returned as an error carrying the rendered report.
    Error,
}

/// How run durations are reported when a verification passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PerformanceMode {
    #[default]
    None,
    /// Total duration plus the mean duration per run.
    Average,
    /// Everything `Average` reports, followed by a table with one row per run.
    Table,
}

impl PerformanceMode {
    pub fn is_enabled(self) -> bool {
        self != PerformanceMode::None
    }
}

/// A bare `true` performance flag means averages; `false` disables reporting.
impl From<bool> for PerformanceMode {
    fn from(enabled: bool) -> Self {
        if enabled {
            PerformanceMode::Average
        } else {
            PerformanceMode::None
        }
    }
}

/// Errors produced when parsing textual configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseConfigError {
    #[error("unknown severity '{0}' (expected log, warn or error)")]
    Severity(String),

    #[error("unknown performance mode '{0}' (expected none, average or table)")]
    Performance(String),
}

impl FromStr for Severity {
    type Err = ParseConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" | "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            _ => Err(ParseConfigError::Severity(s.to_string())),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "log",
            Severity::Warn => "warn",
            Severity::Error => "error",
        })
    }
}

impl FromStr for PerformanceMode {
    type Err = ParseConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "false" | "off" => Ok(PerformanceMode::None),
            "average" | "true" => Ok(PerformanceMode::Average),
            "table" => Ok(PerformanceMode::Table),
            _ => Err(ParseConfigError::Performance(s.to_string())),
        }
    }
}

impl fmt::Display for PerformanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PerformanceMode::None => "none",
            PerformanceMode::Average => "average",
            PerformanceMode::Table => "table",
        })
    }
}

/// Where a rendered report goes once a verification finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emission {
    Info,
    Warn,
    /// Hand the report back to the caller as an error.
    Raise,
}

impl Emission {
    /// Route a report by severity and outcome. Passing runs always log informationally.
    pub fn route(severity: Severity, passed: bool) -> Self {
        match (passed, severity) {
            (true, _) | (false, Severity::Info) => Emission::Info,
            (false, Severity::Warn) => Emission::Warn,
            (false, Severity::Error) => Emission::Raise,
        }
    }
}

/// Reporting configuration for one runner.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    /// Report name; no report is emitted without one.
    pub name: Option<String>,
    pub severity: Severity,
    /// Passed and failed icons, in that order.
    pub icons: [String; 2],
    pub performance: PerformanceMode,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            name: None,
            severity: Severity::Info,
            icons: DEFAULT_ICONS.map(String::from),
            performance: PerformanceMode::None,
        }
    }
}

impl ReportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Replace the icon pair. Anything other than exactly two icons is ignored.
    pub fn with_icons<I, S>(mut self, icons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let icons: Vec<String> = icons.into_iter().map(Into::into).collect();
        if let Ok(pair) = <[String; 2]>::try_from(icons) {
            self.icons = pair;
        }
        self
    }

    pub fn with_performance(mut self, performance: impl Into<PerformanceMode>) -> Self {
        self.performance = performance.into();
        self
    }

    /// Icon matching an outcome.
    pub fn icon(&self, passed: bool) -> &str {
        if passed { &self.icons[0] } else { &self.icons[1] }
    }
}

/// Everything the renderer needs from a finished verification.
pub struct ReportInput<'a> {
    pub config: &'a ReportConfig,
    pub passed: bool,
    pub expected: Option<&'a dyn fmt::Display>,
    pub received: Option<&'a dyn fmt::Display>,
    pub measurements: &'a [Vec<Measurement>],
}

/// Render a report string.
///
/// ## Notes
/// - Performance figures only appear on a passing report with at least one measurement.
/// - The header ends in `:` when a table follows it and `.` otherwise.
/// - Values render with `Display`, so strings appear unquoted.
pub fn render_report(input: &ReportInput<'_>) -> String {
    let config = input.config;
    let mut out = String::with_capacity(64);

    // Writing to String cannot fail.
    let _ = write!(
        out,
        "{} {} test {}",
        config.icon(input.passed),
        config.name.as_deref().unwrap_or_default(),
        if input.passed { "passed" } else { "failed" }
    );

    let mut table = None;
    if input.passed && config.performance.is_enabled() {
        if let Some(summary) = PerformanceSummary::from_buckets(input.measurements) {
            let _ = write!(out, " in {:.3}ms", summary.total_ms);
            if summary.runs > 1 {
                let _ = write!(
                    out,
                    " (x̄ {:.3}ms per run, over {} runs)",
                    summary.average_ms, summary.runs
                );
            }
            if config.performance == PerformanceMode::Table {
                table = Some(render_table(input.measurements));
            }
        }
    }

    let tabled = input.passed && config.performance == PerformanceMode::Table;
    out.push(if tabled { ':' } else { '.' });
    if let Some(table) = table {
        out.push_str(&table);
    }

    if !input.passed {
        if let Some(expected) = input.expected {
            let _ = write!(out, "\nExpected: {expected}");
        }
        if let Some(received) = input.received {
            let _ = write!(out, "\nReceived: {received}");
        }
    }

    out
}

fn render_table(buckets: &[Vec<Measurement>]) -> String {
    let runs: usize = buckets.iter().map(Vec::len).sum();
    let mut table = String::with_capacity(TABLE_TOP.len() + (buckets.len() + runs + 1) * 40);
    table.push_str(TABLE_TOP);

    for (group, bucket) in buckets.iter().enumerate() {
        table.push_str(TABLE_GROUP_RULE);
        for (run, measurement) in bucket.iter().enumerate() {
            let group_cell = if run == 0 { (group + 1).to_string() } else { String::new() };
            let _ = write!(
                table,
                "\n  │ {:<5} │ {:<5} │ {:>13.3} │",
                group_cell,
                run + 1,
                measurement.duration()
            );
        }
    }

    table.push_str(TABLE_BOTTOM);
    table
}
