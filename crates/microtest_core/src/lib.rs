//! Provide the pure policy behind the microtest runner: repetition coercion, validator selection,
//! verdict reduction, run measurements, and report rendering.
//!
//! The runner crate (`microtest`) owns candidates, clocks and log sinks. Everything here is deterministic and
//! side-effect free so that the same rules can be unit tested without invoking anything.
//!
//! ## Notes
//!
//! - This is a "semantic core" crate: **no IO**, no global state, no clocks.
//! - Durations and timestamps are plain `f64` milliseconds, as produced by the runner's clock.

pub mod measure;
pub mod report;

pub use measure::{Measurement, PerformanceSummary};
pub use report::{
    DEFAULT_ICONS, Emission, ParseConfigError, PerformanceMode, ReportConfig, ReportInput, Severity, render_report,
};

/// Coerce a requested repetition count into an effective one.
///
/// ## Parameters
/// - `requested`: the raw count passed to `repeat`; may be fractional, zero, negative or NaN.
///
/// ## Returns
/// - (`usize`): `max(ceil(requested), 1)`, saturating at `usize::MAX`.
///
/// ## Examples
/// ```rust
/// use microtest_core::coerce_repetitions;
/// assert_eq!(coerce_repetitions(0.0), 1);
/// assert_eq!(coerce_repetitions(-5.0), 1);
/// assert_eq!(coerce_repetitions(2.3), 3);
/// ```
pub fn coerce_repetitions(requested: f64) -> usize {
    // `f64::max` discards NaN, and float-to-int `as` saturates.
    requested.ceil().max(1.0) as usize
}

/// A requested repetition count: any primitive integer or float.
///
/// ## Notes
/// - Floats go through [`coerce_repetitions`]. Integers below one become one, and counts past `usize::MAX`
///   saturate.
pub trait RepeatCount {
    fn repetitions(self) -> usize;
}

impl RepeatCount for f64 {
    fn repetitions(self) -> usize {
        coerce_repetitions(self)
    }
}

impl RepeatCount for f32 {
    fn repetitions(self) -> usize {
        coerce_repetitions(f64::from(self))
    }
}

macro_rules! impl_repeat_count_for_ints {
    ($($int:ty),* $(,)?) => {
        $(
            impl RepeatCount for $int {
                fn repetitions(self) -> usize {
                    usize::try_from(self).unwrap_or(if self < 1 { 1 } else { usize::MAX }).max(1)
                }
            }
        )*
    };
}

impl_repeat_count_for_ints!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

/// Pick the validator that judges a given argument group.
///
/// ## Parameters
/// - `group_index`: zero-based index of the argument group.
/// - `validator_count`: number of validators in play.
///
/// ## Returns
/// - (`Option<usize>`): `min(group_index, validator_count - 1)`, or `None` when there are no validators.
///
/// ## Notes
/// - Groups past the end of the validator list reuse the last validator.
pub fn validator_index(group_index: usize, validator_count: usize) -> Option<usize> {
    validator_count.checked_sub(1).map(|last| group_index.min(last))
}

/// Reduce recorded run results to a verdict: true iff no run failed.
pub fn reduce_verdict(runs: &[bool]) -> bool {
    !runs.contains(&false)
}
