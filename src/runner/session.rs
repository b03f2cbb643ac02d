//! Per-verification bookkeeping shared by the synchronous and asynchronous run loops.
//!
//! A `Session` is created by the terminal call and consumed when the verdict is produced. The drivers own the
//! candidate and decide how to invoke it; everything that happens after an invocation (timing, matching, the halt
//! decision, verdict reduction, report emission) lives here so both loops agree.

use std::fmt::Display;

use microtest_core::{Emission, Measurement, ReportConfig, ReportInput, reduce_verdict, render_report, validator_index};

use crate::candidate::{InvocationError, catch_panic_as};
use crate::clock::Clock;
use crate::sink::ReportSink;
use crate::validator::Validator;
use crate::verdict::{Outcome, Verification, VerificationError};

/// Whether the run loop may continue after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Halt,
}

pub(crate) struct Session<R> {
    validators: Vec<Validator<R>>,
    performance: bool,
    measurements: Vec<Vec<Measurement>>,
    passing: Vec<bool>,
    outcome: Outcome<R>,
}

impl<R: Clone + PartialEq + Display> Session<R> {
    pub(crate) fn new(validators: Vec<Validator<R>>, performance: bool) -> Self {
        Self {
            validators,
            performance,
            measurements: Vec::new(),
            passing: Vec::new(),
            outcome: Outcome::default(),
        }
    }

    pub(crate) fn begin_group(&mut self) {
        if self.performance {
            self.measurements.push(Vec::new());
        }
    }

    /// Start timestamp for the next run, when measuring.
    pub(crate) fn start_run(&self, clock: &dyn Clock) -> Option<f64> {
        self.performance.then(|| clock.now())
    }

    /// Record one run and decide whether the loop halts.
    ///
    /// Invocation errors and panicking predicates are logged as warnings and fail the run without halting. A
    /// mismatch halts and captures the received value, plus the expected value when the validator is a literal.
    pub(crate) fn finish_run(
        &mut self,
        group: usize,
        run: usize,
        started: Option<f64>,
        result: Result<R, InvocationError>,
        clock: &dyn Clock,
        sink: &dyn ReportSink,
    ) -> Flow {
        let duration = started.map(|start| {
            let end = clock.now();
            if let Some(bucket) = self.measurements.last_mut() {
                bucket.push(Measurement::new(start, end));
            }
            end - start
        });

        let value = match result {
            Ok(value) => value,
            Err(err) => return self.fail_with_error(&err, sink),
        };

        let Some(validator) = validator_index(group, self.validators.len()).map(|index| &self.validators[index])
        else {
            tracing::debug!(group, run, "no validator configured; failing run");
            self.passing.push(false);
            self.outcome.received = Some(value);
            return Flow::Halt;
        };

        let checked = catch_panic_as(InvocationError::ValidatorPanicked, || {
            Ok(validator.check(&value, run, duration))
        });
        let pass = match checked {
            Ok(pass) => pass,
            Err(err) => return self.fail_with_error(&err, sink),
        };
        self.passing.push(pass);
        tracing::debug!(group, run, pass, duration_ms = duration, "run finished");

        if pass {
            return Flow::Continue;
        }
        if let Some(expected) = validator.expected() {
            self.outcome.expected = Some(expected.clone());
        }
        self.outcome.received = Some(value);
        Flow::Halt
    }

    fn fail_with_error(&mut self, err: &InvocationError, sink: &dyn ReportSink) -> Flow {
        sink.warn(&format!("microtest: run failed with error:\n{err}"));
        self.passing.push(false);
        Flow::Continue
    }

    /// Reduce the recorded runs to a verdict and emit the report if one is configured.
    pub(crate) fn finish(
        self,
        report: &ReportConfig,
        sink: &dyn ReportSink,
    ) -> Result<Verification<R>, VerificationError> {
        let Session {
            measurements,
            passing,
            mut outcome,
            ..
        } = self;
        outcome.passed = reduce_verdict(&passing);

        let rendered = report.name.as_ref().map(|_| {
            render_report(&ReportInput {
                config: report,
                passed: outcome.passed,
                expected: outcome.expected.as_ref().map(|value| value as &dyn Display),
                received: outcome.received.as_ref().map(|value| value as &dyn Display),
                measurements: &measurements,
            })
        });

        if let Some(message) = &rendered {
            match Emission::route(report.severity, outcome.passed) {
                Emission::Info => sink.info(message),
                Emission::Warn => sink.warn(message),
                Emission::Raise => {
                    return Err(VerificationError::Failed {
                        report: message.clone(),
                    });
                }
            }
        }

        Ok(Verification {
            outcome,
            measurements,
            report: rendered,
        })
    }
}
