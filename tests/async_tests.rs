//! Integration tests for asynchronous verification
//!
//! Deferred candidates sleep on the tokio timer, so these tests also check that the verdict is only available after
//! every run has resolved, and that measured durations cover the awaited work.

use std::time::{Duration, Instant};

use microtest::{ExecutionMode, LogLevel, MemorySink, PerformanceMode, Runner, Severity, Validator};

async fn delayed_add((a, b): (i64, i64)) -> i64 {
    tokio::time::sleep(Duration::from_millis(50)).await;
    a + b
}

#[tokio::test]
async fn test_deferred_candidate_resolves_before_verdict() {
    let start = Instant::now();
    let runner = Runner::test_async(delayed_add)
        .enable_async()
        .repeat(2)
        .with_arguments((24, 48))
        .with_arguments((162, 5));
    assert_eq!(runner.execution_mode(), ExecutionMode::Asynchronous);

    let passed = runner
        .expect([Validator::literal(72), Validator::matching(|x: &i64| *x == 167)])
        .await
        .unwrap();

    assert!(passed);
    // Four sequential runs of 50ms each.
    assert!(start.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn test_async_mode_survives_configuration_order() {
    let passed = Runner::test_async(delayed_add)
        .with_arguments((1, 2))
        .expecting([3])
        .enable_async()
        .repeat(1)
        .enable_async()
        .expect(Vec::<i64>::new())
        .await
        .unwrap();
    assert!(passed);
}

#[tokio::test]
async fn test_async_error_severity_raises() {
    let err = Runner::test_async(delayed_add)
        .enable_async()
        .configure_reporting("Async Logging", Severity::Error, None, PerformanceMode::Average)
        .repeat(3)
        .with_arguments((24, 48))
        .with_arguments((162, 5))
        .expect([72])
        .await
        .unwrap_err();

    assert_eq!(err.report(), "✕ Async Logging test failed.\nExpected: 72\nReceived: 167");
}

#[tokio::test]
async fn test_async_failures_are_logged_and_continue() {
    let sink = MemorySink::new();
    let passed = Runner::try_test_async(|x: i64| async move {
        tokio::time::sleep(Duration::from_millis(1)).await;
        if x % 2 == 0 { Ok(x) } else { Err(format!("odd input {x}")) }
    })
    .enable_async()
    .with_sink(sink.clone())
    .with_arguments(1)
    .with_arguments(2)
    .expect([Validator::matching(|x: &i64| *x % 2 == 0)])
    .await
    .unwrap();

    assert!(!passed);
    assert_eq!(
        sink.messages(LogLevel::Warn),
        vec!["microtest: run failed with error:\nodd input 1".to_string()]
    );
}

#[tokio::test]
async fn test_async_method_receives_context() {
    let passed = Runner::test_method_async(|scale: Option<&i64>, x: i64| {
        let scale = scale.copied().unwrap_or(1);
        async move {
            tokio::time::sleep(Duration::from_millis(1)).await;
            x * scale
        }
    })
    .bind(3)
    .enable_async()
    .with_arguments(14)
    .expect([42])
    .await
    .unwrap();
    assert!(passed);
}

#[tokio::test]
async fn test_deferred_panic_fails_run() {
    let sink = MemorySink::new();
    let passed = Runner::test_async(|x: i64| async move {
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(x > 0, "non-positive input");
        x
    })
    .enable_async()
    .with_sink(sink.clone())
    .with_arguments(0)
    .expect([0])
    .await
    .unwrap();

    assert!(!passed);
    let warnings = sink.messages(LogLevel::Warn);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("non-positive input"));
}

// =============================================================================
// Performance
// =============================================================================

async fn slow_unit(_: ()) -> i32 {
    tokio::time::sleep(Duration::from_millis(200)).await;
    1
}

fn within_window(_: &i32, _: usize, duration: Option<f64>) -> bool {
    duration.is_some_and(|ms| 150.0 < ms && ms < 300.0)
}

/// Parse `in <total>ms (x̄ <avg>ms per run, over <runs> runs)` out of a report header.
fn parse_header(report: &str) -> (f64, f64, usize) {
    let header = report.lines().next().unwrap();
    let total = header.split(" in ").nth(1).unwrap().split("ms").next().unwrap();
    let average = header.split("x̄ ").nth(1).unwrap().split("ms").next().unwrap();
    let runs = header.split("over ").nth(1).unwrap().split(' ').next().unwrap();
    (total.parse().unwrap(), average.parse().unwrap(), runs.parse().unwrap())
}

#[tokio::test]
async fn test_performance_table_measures_awaited_runs() {
    let sink = MemorySink::new();
    let verification = Runner::test_async(slow_unit)
        .configure_reporting("Performance", Severity::Warn, None, PerformanceMode::Table)
        .enable_async()
        .with_sink(sink.clone())
        .repeat(3)
        .with_arguments(())
        .with_arguments(())
        .verify([Validator::predicate(within_window)])
        .await
        .unwrap();

    assert!(verification.passed());
    assert_eq!(verification.measurements.len(), 2);
    for measurement in verification.measurements.iter().flatten() {
        let duration = measurement.duration();
        assert!(150.0 < duration && duration < 300.0, "duration {duration}");
    }

    let report = verification.report.unwrap();
    assert_eq!(sink.messages(LogLevel::Info), vec![report.clone()]);
    assert!(report.starts_with("✓ Performance test passed in "));
    assert!(report.lines().next().unwrap().ends_with(':'));

    let (total, average, runs) = parse_header(&report);
    assert_eq!(runs, 6);
    assert!(total >= 6.0 * 150.0 && total < 6.0 * 300.0, "total {total}");
    assert!(150.0 < average && average < 300.0, "average {average}");

    // Header, three table frame lines, two group rules, six rows.
    assert_eq!(report.lines().count(), 1 + 3 + 2 + 6);
    assert!(report.lines().skip(1).all(|line| line.starts_with("  ")));
}

#[tokio::test]
async fn test_performance_average_has_no_table() {
    let verification = Runner::test_async(slow_unit)
        .enable_async()
        .with_sink(MemorySink::new())
        .configure_reporting("Performance", Severity::Info, None, true)
        .repeat(2)
        .verify([Validator::predicate(within_window)])
        .await
        .unwrap();

    let report = verification.report.unwrap();
    assert_eq!(report.lines().count(), 1);
    assert!(report.ends_with(" runs)."));
    let (_, average, runs) = parse_header(&report);
    assert_eq!(runs, 2);
    assert!(150.0 < average && average < 300.0, "average {average}");
}
