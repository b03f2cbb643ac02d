//! Layering guardrails to keep the policy crate free of runtime dependencies.
//!
//! `microtest_core` holds the pure verdict, timing, and rendering rules. It must not pull in the async runtime,
//! logging, or CLI crates; those belong to the `microtest` crate. This test scans the core manifest and fails if any
//! of them appears in `[dependencies]`.

const RUNTIME_CRATES: &[&str] = &["tokio", "tracing", "tracing-subscriber", "clap"];

#[test]
fn core_does_not_depend_on_runtime_crates() {
    let manifest = include_str!("../crates/microtest_core/Cargo.toml");
    let mut in_dependencies = false;

    for raw_line in manifest.lines() {
        let line = raw_line.trim();
        // Track when we enter/exit the `[dependencies]` table.
        if line.starts_with('[') {
            in_dependencies = line == "[dependencies]";
            continue;
        }

        if !in_dependencies || line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Strip inline comments for robustness.
        let line_no_comment = line.split('#').next().unwrap_or("").trim();
        let name = line_no_comment.split('=').next().unwrap_or("").trim();
        if RUNTIME_CRATES.contains(&name) {
            panic!("`{name}` must not appear in microtest_core [dependencies]; keep it in the microtest crate");
        }
    }
}
