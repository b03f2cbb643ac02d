//! The verification runner.
//!
//! ## Lifecycle
//!
//! 1. Construct a runner around one candidate (`Runner::test`, `Runner::test_async`, ...).
//! 2. Chain configuration calls; each consumes the runner and returns it.
//! 3. Call the terminal operation (`expect` or `verify`) exactly once. It consumes the runner, so a runner cannot be
//!    reused for a second session.
//!
//! ## Execution modes
//!
//! The mode is a type parameter. `enable_async` turns a `Runner<_, _, _, SyncMode>` into a
//! `Runner<_, _, _, AsyncMode>`, whose terminal operations are `async`. The candidate's shape is independent of the
//! mode: an immediate candidate runs fine in either mode, while a future-returning candidate can only be awaited in
//! asynchronous mode (in synchronous mode every run of it fails with an invocation error).
//!
//! ## Run loop
//!
//! Argument groups run in order, each repeated `repetitions` times, strictly sequentially. The first run whose result
//! does not satisfy its validator halts the loop. Invocation errors and panics are logged through the sink and fail
//! the run without halting.

#![deny(clippy::unwrap_used)]

mod session;

use std::convert::Infallible;
use std::fmt::Display;
use std::future::Future;
use std::marker::PhantomData;

use microtest_core::{PerformanceMode, RepeatCount, ReportConfig, Severity};

use crate::candidate::Candidate;
use crate::clock::{Clock, MonotonicClock};
use crate::sink::{ReportSink, TracingSink};
use crate::validator::Validator;
use crate::verdict::{Verification, VerificationError};

use self::session::{Flow, Session};

// ============================================================================
// Execution mode
// ============================================================================

/// Whether invocation results are awaited and the verdict is deferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Synchronous,
    Asynchronous,
}

mod sealed {
    pub trait Sealed {}
}

/// Type-level execution mode of a [`Runner`].
pub trait Mode: sealed::Sealed {
    const EXECUTION: ExecutionMode;
}

/// Runs candidates inline and returns the verdict directly.
#[derive(Debug, Clone, Copy)]
pub struct SyncMode;

/// Awaits deferred candidates and returns the verdict as a future.
#[derive(Debug, Clone, Copy)]
pub struct AsyncMode;

impl sealed::Sealed for SyncMode {}
impl sealed::Sealed for AsyncMode {}

impl Mode for SyncMode {
    const EXECUTION: ExecutionMode = ExecutionMode::Synchronous;
}

impl Mode for AsyncMode {
    const EXECUTION: ExecutionMode = ExecutionMode::Asynchronous;
}

// ============================================================================
// Runner
// ============================================================================

/// Accumulates configuration for one candidate, then verifies it once.
///
/// - `A`: one argument group, passed by value to every run (cloned per run).
/// - `R`: the candidate's resolved result.
/// - `X`: the invocation context bound with [`Runner::bind`].
/// - `M`: [`SyncMode`] or [`AsyncMode`].
pub struct Runner<A, R, X = (), M = SyncMode> {
    candidate: Candidate<A, R, X>,
    context: Option<X>,
    repetitions: usize,
    argument_groups: Vec<A>,
    expectations: Vec<Validator<R>>,
    report: ReportConfig,
    clock: Box<dyn Clock>,
    sink: Box<dyn ReportSink>,
    mode: PhantomData<M>,
}

impl<A: 'static, R: 'static> Runner<A, R> {
    /// Test a function of the argument group.
    pub fn test<F>(mut candidate: F) -> Self
    where
        F: FnMut(A) -> R + 'static,
    {
        Self::from_candidate(Candidate::immediate(move |_: Option<&()>, args| {
            Ok::<_, Infallible>(candidate(args))
        }))
    }

    /// Test a fallible function. An `Err` fails the run and is logged as a warning.
    pub fn try_test<F, E>(mut candidate: F) -> Self
    where
        F: FnMut(A) -> Result<R, E> + 'static,
        E: Display,
    {
        Self::from_candidate(Candidate::immediate(move |_: Option<&()>, args| candidate(args)))
    }

    /// Test a function returning a future. Use together with [`Runner::enable_async`].
    pub fn test_async<F, Fut>(mut candidate: F) -> Self
    where
        F: FnMut(A) -> Fut + 'static,
        Fut: Future<Output = R> + 'static,
    {
        Self::from_candidate(Candidate::deferred(move |_: Option<&()>, args| {
            let pending = candidate(args);
            async move { Ok::<_, Infallible>(pending.await) }
        }))
    }

    /// Test a function returning a fallible future.
    pub fn try_test_async<F, Fut, E>(mut candidate: F) -> Self
    where
        F: FnMut(A) -> Fut + 'static,
        Fut: Future<Output = Result<R, E>> + 'static,
        E: Display,
    {
        Self::from_candidate(Candidate::deferred(move |_: Option<&()>, args| candidate(args)))
    }
}

impl<A: 'static, R: 'static, X: 'static> Runner<A, R, X> {
    /// Test a function that receives the bound context, if any, alongside its arguments.
    pub fn test_method<F>(mut candidate: F) -> Self
    where
        F: FnMut(Option<&X>, A) -> R + 'static,
    {
        Self::from_candidate(Candidate::immediate(move |context: Option<&X>, args| {
            Ok::<_, Infallible>(candidate(context, args))
        }))
    }

    /// Context-receiving variant of [`Runner::test_async`].
    ///
    /// The returned future must not borrow the context; clone what it needs before building it.
    pub fn test_method_async<F, Fut>(mut candidate: F) -> Self
    where
        F: FnMut(Option<&X>, A) -> Fut + 'static,
        Fut: Future<Output = R> + 'static,
    {
        Self::from_candidate(Candidate::deferred(move |context: Option<&X>, args| {
            let pending = candidate(context, args);
            async move { Ok::<_, Infallible>(pending.await) }
        }))
    }

    fn from_candidate(candidate: Candidate<A, R, X>) -> Self {
        Self {
            candidate,
            context: None,
            repetitions: 1,
            argument_groups: Vec::new(),
            expectations: Vec::new(),
            report: ReportConfig::default(),
            clock: Box::new(MonotonicClock::new()),
            sink: Box::new(TracingSink),
            mode: PhantomData,
        }
    }

    /// Await deferred candidates and return the verdict as a future.
    pub fn enable_async(self) -> Runner<A, R, X, AsyncMode> {
        Runner {
            candidate: self.candidate,
            context: self.context,
            repetitions: self.repetitions,
            argument_groups: self.argument_groups,
            expectations: self.expectations,
            report: self.report,
            clock: self.clock,
            sink: self.sink,
            mode: PhantomData,
        }
    }
}

impl<A, R, X> Runner<A, R, X, AsyncMode> {
    /// Already asynchronous.
    pub fn enable_async(self) -> Self {
        self
    }
}

// ============================================================================
// Configuration surface
// ============================================================================

impl<A, R, X, M: Mode> Runner<A, R, X, M> {
    /// Pass `context` to every invocation. Replaces any earlier binding.
    pub fn bind(mut self, context: X) -> Self {
        self.context = Some(context);
        self
    }

    /// Run each argument group `times` times: `max(ceil(times), 1)`. Accepts any primitive integer or float.
    pub fn repeat(mut self, times: impl RepeatCount) -> Self {
        self.repetitions = times.repetitions();
        self
    }

    /// Append one argument group.
    pub fn with_arguments(mut self, args: A) -> Self {
        self.argument_groups.push(args);
        self
    }

    /// Validators used when the terminal call supplies none.
    pub fn expecting<I>(mut self, validators: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Validator<R>>,
    {
        self.expectations = validators.into_iter().map(Into::into).collect();
        self
    }

    /// Emit a named report once the verification finishes.
    ///
    /// `icons` is ignored unless it holds exactly two entries. `performance` is dropped to
    /// [`PerformanceMode::None`] when the clock is not high resolution.
    pub fn configure_reporting(
        self,
        name: impl Into<String>,
        severity: Severity,
        icons: Option<&[&str]>,
        performance: impl Into<PerformanceMode>,
    ) -> Self {
        let mut config = ReportConfig {
            name: Some(name.into()),
            severity,
            icons: self.report.icons.clone(),
            performance: performance.into(),
        };
        if let Some(icons) = icons {
            config = config.with_icons(icons.iter().copied());
        }
        self.with_report_config(config)
    }

    /// Shorthand for an informational report without performance figures.
    pub fn named(self, name: impl Into<String>) -> Self {
        self.configure_reporting(name, Severity::Info, None, PerformanceMode::None)
    }

    /// Replace the whole report configuration.
    pub fn with_report_config(mut self, mut config: ReportConfig) -> Self {
        if !self.clock.is_high_resolution() {
            config.performance = PerformanceMode::None;
        }
        self.report = config;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        if !clock.is_high_resolution() {
            self.report.performance = PerformanceMode::None;
        }
        self.clock = Box::new(clock);
        self
    }

    pub fn with_sink(mut self, sink: impl ReportSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn repetitions(&self) -> usize {
        self.repetitions
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        M::EXECUTION
    }

    pub fn report_config(&self) -> &ReportConfig {
        &self.report
    }
}

// ============================================================================
// Terminal operations
// ============================================================================

/// A runner taken apart for one verification pass.
struct Plan<A, R, X> {
    candidate: Candidate<A, R, X>,
    context: Option<X>,
    repetitions: usize,
    groups: Vec<A>,
    session: Session<R>,
    report: ReportConfig,
    clock: Box<dyn Clock>,
    sink: Box<dyn ReportSink>,
}

impl<A, R, X, M> Runner<A, R, X, M>
where
    A: Clone + Default,
    R: Clone + PartialEq + Display,
{
    fn into_plan<I>(self, validators: I) -> Plan<A, R, X>
    where
        I: IntoIterator,
        I::Item: Into<Validator<R>>,
    {
        let Runner {
            candidate,
            context,
            repetitions,
            mut argument_groups,
            mut expectations,
            report,
            clock,
            sink,
            ..
        } = self;

        let supplied: Vec<Validator<R>> = validators.into_iter().map(Into::into).collect();
        if !supplied.is_empty() {
            expectations = supplied;
        }
        if argument_groups.is_empty() {
            argument_groups.push(A::default());
        }

        Plan {
            candidate,
            context,
            repetitions,
            groups: argument_groups,
            session: Session::new(expectations, report.performance.is_enabled()),
            report,
            clock,
            sink,
        }
    }
}

impl<A, R, X> Runner<A, R, X, SyncMode>
where
    A: Clone + Default + 'static,
    R: Clone + PartialEq + Display + 'static,
    X: 'static,
{
    /// Run the verification pass and return every detail of it.
    ///
    /// Returns `Err` only when reporting is configured with [`Severity::Error`] and the verification failed.
    #[tracing::instrument(skip_all, fields(groups = tracing::field::Empty, repetitions = self.repetitions))]
    pub fn verify<I>(self, validators: I) -> Result<Verification<R>, VerificationError>
    where
        I: IntoIterator,
        I::Item: Into<Validator<R>>,
    {
        let Plan {
            mut candidate,
            context,
            repetitions,
            groups,
            mut session,
            report,
            clock,
            sink,
        } = self.into_plan(validators);
        tracing::Span::current().record("groups", groups.len());

        if candidate.is_deferred() {
            tracing::debug!("deferred candidate in synchronous mode; its runs cannot be awaited");
        }

        'groups: for (index, group) in groups.iter().enumerate() {
            session.begin_group();
            for run in 0..repetitions {
                let started = session.start_run(clock.as_ref());
                let result = candidate.invoke_now(context.as_ref(), group.clone());
                if session.finish_run(index, run, started, result, clock.as_ref(), sink.as_ref()) == Flow::Halt {
                    break 'groups;
                }
            }
        }

        session.finish(&report, sink.as_ref())
    }

    /// Run the verification pass and return the verdict.
    pub fn expect<I>(self, validators: I) -> Result<bool, VerificationError>
    where
        I: IntoIterator,
        I::Item: Into<Validator<R>>,
    {
        self.verify(validators).map(|verification| verification.passed())
    }
}

impl<A, R, X> Runner<A, R, X, AsyncMode>
where
    A: Clone + Default + 'static,
    R: Clone + PartialEq + Display + 'static,
    X: 'static,
{
    /// Asynchronous [`Runner::verify`]: each deferred run is awaited before the next starts.
    #[tracing::instrument(skip_all, fields(groups = tracing::field::Empty, repetitions = self.repetitions))]
    pub async fn verify<I>(self, validators: I) -> Result<Verification<R>, VerificationError>
    where
        I: IntoIterator,
        I::Item: Into<Validator<R>>,
    {
        let Plan {
            mut candidate,
            context,
            repetitions,
            groups,
            mut session,
            report,
            clock,
            sink,
        } = self.into_plan(validators);
        tracing::Span::current().record("groups", groups.len());

        'groups: for (index, group) in groups.iter().enumerate() {
            session.begin_group();
            for run in 0..repetitions {
                let started = session.start_run(clock.as_ref());
                let result = candidate.invoke(context.as_ref(), group.clone()).await;
                if session.finish_run(index, run, started, result, clock.as_ref(), sink.as_ref()) == Flow::Halt {
                    break 'groups;
                }
            }
        }

        session.finish(&report, sink.as_ref())
    }

    /// Asynchronous [`Runner::expect`].
    pub async fn expect<I>(self, validators: I) -> Result<bool, VerificationError>
    where
        I: IntoIterator,
        I::Item: Into<Validator<R>>,
    {
        self.verify(validators).await.map(|verification| verification.passed())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::UnavailableClock;
    use crate::sink::{LogLevel, MemorySink};

    fn add((a, b): (i32, i32)) -> i32 {
        a + b
    }

    #[test]
    fn test_repeat_coercion() {
        assert_eq!(Runner::test(add).repetitions(), 1);
        assert_eq!(Runner::test(add).repeat(0).repetitions(), 1);
        assert_eq!(Runner::test(add).repeat(-5).repetitions(), 1);
        assert_eq!(Runner::test(add).repeat(2.3).repetitions(), 3);
        assert_eq!(Runner::test(add).repeat(4usize).repetitions(), 4);
        assert_eq!(Runner::test(add).repeat(5u64).repetitions(), 5);
        assert_eq!(Runner::test(add).repeat(0.5f32).repetitions(), 1);
    }

    #[test]
    fn test_panicking_predicate_is_caught() {
        let sink = MemorySink::new();
        let passed = Runner::test(|x: i64| x)
            .with_sink(sink.clone())
            .with_arguments(1)
            .with_arguments(2)
            .expect([Validator::matching(|x: &i64| {
                if *x == 1 {
                    panic!("predicate rejected one");
                }
                true
            })])
            .unwrap();

        assert!(!passed);
        assert_eq!(
            sink.messages(LogLevel::Warn),
            vec!["microtest: run failed with error:\nvalidator panicked: predicate rejected one".to_string()]
        );
    }

    /// Writer shared between a test and the subscriber it installs.
    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_span_counts_default_group() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let passed = tracing::subscriber::with_default(subscriber, || Runner::test(|()| 1_i32).expect([1]))
            .unwrap();
        assert!(passed);

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("run finished"), "{output}");
        assert!(output.contains("groups=1"), "{output}");
    }

    #[test]
    fn test_enable_async_is_idempotent() {
        let runner = Runner::test(add);
        assert_eq!(runner.execution_mode(), ExecutionMode::Synchronous);
        let runner = runner.enable_async().enable_async();
        assert_eq!(runner.execution_mode(), ExecutionMode::Asynchronous);
    }

    #[test]
    fn test_literal_match_passes() {
        let passed = Runner::test(add).with_arguments((24, 48)).expect([72]).unwrap();
        assert!(passed);
    }

    #[test]
    fn test_empty_arguments_use_default_group() {
        let verification = Runner::test(add).verify([0]).unwrap();
        assert!(verification.passed());
    }

    #[test]
    fn test_supplied_validators_replace_configured_ones() {
        let runner = || Runner::test(add).with_arguments((1, 1)).expecting([3]);
        assert!(!runner().expect(Vec::<Validator<i32>>::new()).unwrap());
        assert!(runner().expect([2]).unwrap());
    }

    #[test]
    fn test_halt_skips_remaining_runs() {
        let calls = std::rc::Rc::new(std::cell::Cell::new(0));
        let counter = calls.clone();
        let verification = Runner::test(move |x: i32| {
            counter.set(counter.get() + 1);
            x
        })
        .repeat(3)
        .with_arguments(1)
        .with_arguments(2)
        .verify([0])
        .unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(verification.outcome.expected, Some(0));
        assert_eq!(verification.outcome.received, Some(1));
    }

    #[test]
    fn test_icons_must_be_a_pair() {
        let runner = Runner::test(add).configure_reporting("Icons", Severity::Info, Some(&["+"]), false);
        assert_eq!(runner.report_config().icons, ["✓".to_string(), "✕".to_string()]);

        let runner = Runner::test(add).configure_reporting("Icons", Severity::Info, Some(&["+", "-"]), false);
        assert_eq!(runner.report_config().icon(false), "-");
    }

    #[test]
    fn test_unavailable_clock_disables_performance() {
        let runner = Runner::test(add)
            .with_clock(UnavailableClock)
            .configure_reporting("Timed", Severity::Info, None, PerformanceMode::Table);
        assert_eq!(runner.report_config().performance, PerformanceMode::None);

        let runner = Runner::test(add)
            .configure_reporting("Timed", Severity::Info, None, true)
            .with_clock(UnavailableClock);
        assert_eq!(runner.report_config().performance, PerformanceMode::None);
    }

    #[test]
    fn test_deferred_candidate_fails_in_sync_mode() {
        let sink = MemorySink::new();
        let passed = Runner::test_async(|()| async { 1_i32 })
            .with_sink(sink.clone())
            .expect([1])
            .unwrap();

        assert!(!passed);
        assert_eq!(
            sink.messages(LogLevel::Warn),
            vec!["microtest: run failed with error:\ndeferred candidate requires asynchronous mode".to_string()]
        );
    }

    #[test]
    fn test_context_is_passed_to_method() {
        struct Offset {
            c: i32,
        }

        let passed = Runner::test_method(|context: Option<&Offset>, (a, b): (i32, i32)| {
            a + b + context.map_or(0, |offset| offset.c)
        })
        .bind(Offset { c: 17 })
        .with_arguments((24, 48))
        .expect([89])
        .unwrap();
        assert!(passed);
    }

    #[tokio::test]
    async fn test_async_mode_runs_immediate_candidate() {
        let passed = Runner::test(add)
            .enable_async()
            .with_arguments((2, 2))
            .expect([4])
            .await
            .unwrap();
        assert!(passed);
    }
}
