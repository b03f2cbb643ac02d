#![forbid(unsafe_code)]
//! microtest: a minimal verification runner
//!
//! A [`Runner`] wraps one candidate function, runs it against argument groups a configurable number of times, and
//! judges every result with a literal or predicate [`Validator`]. The verdict can be reported through a
//! [`ReportSink`], optionally with timing figures, or escalated to an error.
//!
//! ```
//! use microtest::{Runner, Validator};
//!
//! let passed = Runner::test(|(a, b): (i32, i32)| a + b)
//!     .repeat(3)
//!     .with_arguments((24, 48))
//!     .expect([Validator::literal(72)])
//!     .unwrap();
//! assert!(passed);
//! ```
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `runner` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **Candidates**: A panic inside a candidate is caught and turned into a failed run, never propagated.

pub mod candidate;
pub mod cli;
pub mod clock;
pub mod runner;
pub mod sink;
pub mod validator;
pub mod verdict;

pub use candidate::InvocationError;
pub use clock::{Clock, MonotonicClock, UnavailableClock};
pub use runner::{AsyncMode, ExecutionMode, Mode, Runner, SyncMode};
pub use sink::{LogLevel, LogRecord, MemorySink, ReportSink, TracingSink};
pub use validator::Validator;
pub use verdict::{Outcome, Verification, VerificationError};

pub use microtest_core::{Measurement, ParseConfigError, PerformanceMode, PerformanceSummary, ReportConfig, Severity};
