//! Validators: the expected outcome of a run, either a literal value or a predicate.

use std::fmt;

/// Predicate signature: `(result, repetition index, duration in ms if measured)`.
pub type PredicateFn<R> = Box<dyn Fn(&R, usize, Option<f64>) -> bool>;

/// Judges the result of a run.
pub enum Validator<R> {
    /// Passes when the result equals the value.
    Literal(R),
    /// Passes when the predicate returns `true`.
    Predicate(PredicateFn<R>),
}

impl<R> Validator<R> {
    pub fn literal(value: R) -> Self {
        Validator::Literal(value)
    }

    pub fn predicate(f: impl Fn(&R, usize, Option<f64>) -> bool + 'static) -> Self {
        Validator::Predicate(Box::new(f))
    }

    /// Predicate that only looks at the result.
    pub fn matching(f: impl Fn(&R) -> bool + 'static) -> Self {
        Validator::Predicate(Box::new(move |result, _, _| f(result)))
    }

    /// The literal this validator compares against, if it has one.
    pub fn expected(&self) -> Option<&R> {
        match self {
            Validator::Literal(value) => Some(value),
            Validator::Predicate(_) => None,
        }
    }
}

impl<R: PartialEq> Validator<R> {
    /// Judge one run.
    pub fn check(&self, result: &R, run: usize, duration: Option<f64>) -> bool {
        match self {
            Validator::Literal(value) => result == value,
            Validator::Predicate(f) => f(result, run, duration),
        }
    }
}

impl<R> From<R> for Validator<R> {
    fn from(value: R) -> Self {
        Validator::Literal(value)
    }
}

impl<R: fmt::Debug> fmt::Debug for Validator<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validator::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Validator::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_uses_equality() {
        let validator = Validator::literal(72);
        assert!(validator.check(&72, 0, None));
        assert!(!validator.check(&71, 0, None));
        assert_eq!(validator.expected(), Some(&72));
    }

    #[test]
    fn test_predicate_receives_run_and_duration() {
        let validator = Validator::predicate(|_: &i32, run, duration| run == 2 && duration == Some(1.5));
        assert!(validator.check(&0, 2, Some(1.5)));
        assert!(!validator.check(&0, 1, Some(1.5)));
        assert!(!validator.check(&0, 2, None));
        assert_eq!(validator.expected(), None);
    }

    #[test]
    fn test_matching_ignores_run_metadata() {
        let validator = Validator::matching(|value: &String| value.chars().all(|c| c.is_ascii_digit()));
        assert!(validator.check(&"167".to_string(), 5, None));
        assert!(!validator.check(&"1a".to_string(), 0, Some(3.0)));
    }

    #[test]
    fn test_from_value_is_literal() {
        let validator: Validator<&str> = "ok".into();
        assert!(matches!(validator, Validator::Literal("ok")));
        assert_eq!(format!("{:?}", validator), "Literal(\"ok\")");
        assert_eq!(format!("{:?}", Validator::matching(|_: &i32| true)), "Predicate(..)");
    }
}
