//! CLI module for the microtest demo binary
//!
//! ## Commands
//!
//! - `demo [SCENARIO]` - Run one bundled scenario, or all of them
//! - `list` - List bundled scenarios
//!
//! Running the binary without a command runs every scenario.
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod scenarios;

use std::fmt;
use std::process;
use std::time::Instant;

use clap::{Parser, Subcommand};

use self::scenarios::{SCENARIOS, Scenario};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Minimal verification runner
#[derive(Parser, Debug)]
#[command(name = "microtest")]
#[command(version = VERSION)]
#[command(about = "Run the bundled microtest verification scenarios", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run verification scenarios
    Demo {
        /// Scenario to run (default: all)
        #[arg(value_name = "SCENARIO")]
        scenario: Option<String>,
        /// Stop on first scenario whose verdict is unexpected
        #[arg(short = 'x', long = "exitfirst")]
        stop_on_fail: bool,
    },

    /// List bundled scenarios
    List,
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Some(Command::Demo { scenario, stop_on_fail }) => run_demo(scenario.as_deref(), stop_on_fail),
        Some(Command::List) => {
            for scenario in SCENARIOS {
                println!("{:<12} {}", scenario.name, scenario.description);
            }
            Ok(ExitCode::SUCCESS)
        }
        None => run_demo(None, false),
    }
}

/// Select the scenarios named on the command line.
fn select(name: Option<&str>) -> CliResult<Vec<&'static Scenario>> {
    match name {
        None => Ok(SCENARIOS.iter().collect()),
        Some(name) => scenarios::find(name).map(|scenario| vec![scenario]).ok_or_else(|| {
            let known: Vec<&str> = SCENARIOS.iter().map(|scenario| scenario.name).collect();
            CliError::failure(format!(
                "Error: unknown scenario '{name}' (expected one of: {})",
                known.join(", ")
            ))
        }),
    }
}

/// Run scenarios and compare each verdict with the one it should reach.
fn run_demo(name: Option<&str>, stop_on_fail: bool) -> CliResult<ExitCode> {
    let selected = select(name)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|e| CliError::failure(format!("Error starting async runtime: {e}")))?;

    println!("collected {} scenario(s)", selected.len());
    let start = Instant::now();
    let mut unexpected = Vec::new();

    for scenario in &selected {
        let verdict = scenario.run(&runtime);
        tracing::debug!(scenario = scenario.name, ?verdict, "scenario finished");
        let ok = matches!(verdict, Ok(passed) if passed == scenario.expected);
        let status = if ok { "\x1b[32mOK\x1b[0m" } else { "\x1b[31mUNEXPECTED\x1b[0m" };
        println!("{} {}", scenario.name, status);

        if !ok {
            if let Err(err) = &verdict {
                println!("    {}", err.report().replace('\n', "\n    "));
            }
            unexpected.push(scenario.name);
            if stop_on_fail {
                break;
            }
        }
    }

    let elapsed = start.elapsed().as_secs_f64();
    let matched = selected.len() - unexpected.len();
    println!("====== {matched} matched, {} unexpected in {elapsed:.2}s ======", unexpected.len());

    if unexpected.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Err(CliError::failure(format!(
            "Error: unexpected verdicts: {}",
            unexpected.join(", ")
        )))
    }
}

// ============================================================================
// Tests
// ============================================================================
