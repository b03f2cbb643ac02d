//! Verification results.

use microtest_core::Measurement;
use thiserror::Error;

/// Pass/fail outcome of a verification session.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<R> {
    pub passed: bool,
    /// Literal of the last mismatched validator; `None` when a predicate rejected the run.
    pub expected: Option<R>,
    /// Result of the last mismatched run.
    pub received: Option<R>,
}

impl<R> Default for Outcome<R> {
    fn default() -> Self {
        Self {
            passed: false,
            expected: None,
            received: None,
        }
    }
}

/// Everything a finished verification produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Verification<R> {
    pub outcome: Outcome<R>,
    /// Per-group run timings. Empty unless performance reporting was enabled.
    pub measurements: Vec<Vec<Measurement>>,
    /// Rendered report, when the runner was given a report name.
    pub report: Option<String>,
}

impl<R> Verification<R> {
    pub fn passed(&self) -> bool {
        self.outcome.passed
    }
}

/// A failed verification escalated by `Severity::Error` reporting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// Carries the rendered report as its message.
    #[error("{report}")]
    Failed { report: String },
}

impl VerificationError {
    pub fn report(&self) -> &str {
        match self {
            VerificationError::Failed { report } => report,
        }
    }
}
