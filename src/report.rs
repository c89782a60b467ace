//! Severity reporting for pipeline stages.
//!
//! Every terminal subprocess status maps to exactly one report call:
//! `info` for success, `error` for a recorded-but-recoverable failure,
//! `fatal` for a failure that stops the pipeline. Fatal does not abort the
//! process in place; it returns an error value the caller propagates, so
//! the whole pipeline stays testable in-process and the binary owns the
//! exit code.
//!
//! When running under GitHub Actions, error-level messages are emitted as
//! `::error::` workflow commands so the runner surfaces them as step
//! annotations. Anywhere else they go to stderr.

use std::cell::Cell;
use std::env;
use std::fmt::Display;

/// Message severity understood by the CI facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Log line, continue.
    Info,
    /// Mark the step failed, continue.
    Error,
    /// Mark the step failed, stop the pipeline.
    Fatal,
}

/// Collects pass/fail state and routes messages to the CI facade.
pub struct Reporter {
    annotate: bool,
    failed: Cell<bool>,
}

impl Reporter {
    /// Detect the CI facade from the environment.
    pub fn from_env() -> Self {
        let annotate = env::var("GITHUB_ACTIONS")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);
        Self {
            annotate,
            failed: Cell::new(false),
        }
    }

    /// Plain stderr reporting, no workflow commands.
    pub fn plain() -> Self {
        Self {
            annotate: false,
            failed: Cell::new(false),
        }
    }

    /// Emit a log line and continue.
    pub fn info(&self, message: impl Display) {
        self.emit(Severity::Info, &message.to_string());
    }

    /// Record a failure but let the run continue.
    pub fn error(&self, message: impl Display) {
        self.failed.set(true);
        self.emit(Severity::Error, &message.to_string());
    }

    /// Record a failure and hand back the error that stops the pipeline.
    ///
    /// Callers propagate the returned value; nothing runs after it.
    pub fn fatal(&self, message: impl Display) -> anyhow::Error {
        let message = message.to_string();
        self.failed.set(true);
        self.emit(Severity::Fatal, &message);
        anyhow::anyhow!(message)
    }

    /// Whether any error- or fatal-severity report occurred.
    pub fn failed(&self) -> bool {
        self.failed.get()
    }

    /// Process exit code reflecting the recorded state.
    pub fn exit_code(&self) -> i32 {
        if self.failed() {
            1
        } else {
            0
        }
    }

    fn emit(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => println!("{message}"),
            Severity::Error | Severity::Fatal if self.annotate => {
                // Workflow command; the runner renders it as a step annotation.
                println!("::error::{}", escape_annotation(message));
            }
            Severity::Error | Severity::Fatal => eprintln!("error: {message}"),
        }
    }
}

/// Escape a message for use as workflow command data.
fn escape_annotation(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_does_not_mark_failed() {
        let rep = Reporter::plain();
        rep.info("downloading");
        assert!(!rep.failed());
        assert_eq!(rep.exit_code(), 0);
    }

    #[test]
    fn error_marks_failed_but_is_recoverable() {
        let rep = Reporter::plain();
        rep.error("manifest write failed");
        assert!(rep.failed());
        assert_eq!(rep.exit_code(), 1);
    }

    #[test]
    fn fatal_marks_failed_and_returns_the_message() {
        let rep = Reporter::plain();
        let err = rep.fatal("unsupported operating system: win32");
        assert!(rep.failed());
        assert_eq!(err.to_string(), "unsupported operating system: win32");
    }

    #[test]
    fn annotation_escaping_covers_workflow_command_data() {
        assert_eq!(
            escape_annotation("50% done\nnext line"),
            "50%25 done%0Anext line"
        );
    }
}
