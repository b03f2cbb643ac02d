//! Logging collaborator for reports and run warnings.
//!
//! The runner only decides *what* to say and at which level; sinks decide where it goes.

use std::cell::RefCell;
use std::rc::Rc;

/// Receives informational and warning-level messages.
pub trait ReportSink {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
}

/// Default sink: forwards to `tracing` under the `microtest` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn info(&self, message: &str) {
        tracing::info!(target: "microtest", "{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "microtest", "{message}");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
}

/// Sink that keeps every message in memory.
///
/// Clones share the same buffer, so a caller can hand one clone to a runner and read the records through another.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Rc<RefCell<Vec<LogRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.borrow().clone()
    }

    /// Messages logged at `level`, in order.
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.records
            .borrow()
            .iter()
            .filter(|record| record.level == level)
            .map(|record| record.message.clone())
            .collect()
    }

    fn push(&self, level: LogLevel, message: &str) {
        self.records.borrow_mut().push(LogRecord {
            level,
            message: message.to_string(),
        });
    }
}

impl ReportSink for MemorySink {
    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.push(LogLevel::Warn, message);
    }
}
