//! Bundled verification scenarios for the `demo` command.
//!
//! Each scenario builds a runner, verifies it, and states the verdict it should reach. Reports go to the default
//! tracing sink, so they show up in the demo's log output.

use std::fmt;
use std::time::Duration;

use microtest_core::{PerformanceMode, Severity};
use tokio::runtime::Runtime;

use crate::{Runner, Validator, VerificationError};

/// A named verification with a known verdict.
#[derive(Debug)]
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    /// Verdict a correct runner reaches for this scenario.
    pub expected: bool,
    run: fn(&Runtime) -> Result<bool, VerificationError>,
}

impl Scenario {
    pub fn run(&self, runtime: &Runtime) -> Result<bool, VerificationError> {
        (self.run)(runtime)
    }
}

pub const SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "integration",
        description: "a + b repeated three times against a literal",
        expected: true,
        run: integration,
    },
    Scenario {
        name: "context",
        description: "a + b + context offset, one literal and one predicate",
        expected: true,
        run: context,
    },
    Scenario {
        name: "failure",
        description: "error-severity failure caught and checked by an outer runner",
        expected: true,
        run: failure,
    },
    Scenario {
        name: "async",
        description: "deferred a + b resolved after 250ms",
        expected: true,
        run: asynchronous,
    },
    Scenario {
        name: "performance",
        description: "deferred candidate timed into a per-run table",
        expected: true,
        run: performance,
    },
];

pub fn find(name: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|scenario| scenario.name == name)
}

fn add((a, b): (i64, i64)) -> i64 {
    a + b
}

/// True when the rendered value contains at least one digit.
fn is_numeric(value: &i64) -> bool {
    value.to_string().chars().any(|c| c.is_ascii_digit())
}

fn integration(_: &Runtime) -> Result<bool, VerificationError> {
    Runner::test(add)
        .named("Integration")
        .repeat(3)
        .with_arguments((24, 48))
        .expect([72])
}

/// Receiver bound as the invocation context.
struct Offset {
    c: i64,
}

fn context(_: &Runtime) -> Result<bool, VerificationError> {
    Runner::test_method(|offset: Option<&Offset>, (a, b): (i64, i64)| {
        a + b + offset.map_or(0, |offset| offset.c)
    })
    .bind(Offset { c: 17 })
    .named("Context")
    .repeat(3)
    .with_arguments((24, 48))
    .with_arguments((162, 5))
    .expect([Validator::literal(89), Validator::matching(is_numeric)])
}

/// Loosely typed operand, so one candidate can add numbers, strings, and missing values.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Operand {
    Number(f64),
    Text(String),
    #[default]
    Missing,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Number(n) => write!(f, "{n}"),
            Operand::Text(s) => f.write_str(s),
            Operand::Missing => f.write_str("missing"),
        }
    }
}

pub fn loose_add((a, b): (Operand, Operand)) -> Operand {
    match (a, b) {
        (Operand::Number(x), Operand::Number(y)) => Operand::Number(x + y),
        (Operand::Missing, _) | (_, Operand::Missing) => Operand::Number(f64::NAN),
        (a, b) => Operand::Text(format!("{a}{b}")),
    }
}

fn is_nan(value: &Operand) -> bool {
    matches!(value, Operand::Number(n) if n.is_nan())
}

/// Run the failing inner verification and return its error message, or an empty string if it did not fail.
fn failing_candidate() -> String {
    let verdict = Runner::test(loose_add)
        .configure_reporting("Failure Candidate", Severity::Error, None, PerformanceMode::Average)
        .repeat(3)
        .with_arguments((Operand::Number(196.5), Operand::Number(42.0)))
        .with_arguments((Operand::Number(10.0), Operand::Missing))
        .with_arguments((Operand::Text("Hello".into()), Operand::Text(" world".into())))
        .expect([
            Validator::literal(Operand::Number(238.5)),
            Validator::matching(is_nan),
            Validator::literal(Operand::Number(9.0)),
        ]);

    match verdict {
        Ok(_) => String::new(),
        Err(err) => err.to_string(),
    }
}

fn failure(_: &Runtime) -> Result<bool, VerificationError> {
    Runner::test(|()| failing_candidate())
        .configure_reporting("Failure", Severity::Error, None, PerformanceMode::Average)
        .repeat(3)
        .expect([Validator::matching(|message: &String| {
            message.starts_with(
                "✕ Failure Candidate test failed.\nExpected: 9\nReceived: Hello world",
            )
        })])
}

fn asynchronous(runtime: &Runtime) -> Result<bool, VerificationError> {
    let runner = Runner::test_async(|(a, b): (i64, i64)| async move {
        tokio::time::sleep(Duration::from_millis(250)).await;
        a + b
    })
    .enable_async()
    .configure_reporting("Async Logging", Severity::Error, None, PerformanceMode::Average)
    .repeat(3)
    .with_arguments((24, 48))
    .with_arguments((162, 5));

    runtime.block_on(runner.expect([Validator::literal(72), Validator::matching(is_numeric)]))
}

fn performance(runtime: &Runtime) -> Result<bool, VerificationError> {
    let runner = Runner::test_async(|()| async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        1_i32
    })
    .configure_reporting("Performance", Severity::Warn, None, PerformanceMode::Table)
    .enable_async()
    .repeat(3)
    .with_arguments(())
    .with_arguments(());

    runtime.block_on(runner.expect([Validator::predicate(|_: &i32, _, duration| {
        duration.is_some_and(|ms| 150.0 < ms && ms < 300.0)
    })]))
}
