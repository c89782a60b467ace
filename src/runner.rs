//! Shell execution for extract, build, and launch steps.
//!
//! Every step is a single `bash -c` invocation, blocking, with stdio
//! inherited so a human or log collector watching the parent process sees
//! live output. There is no timeout: a hung build blocks the pipeline,
//! which is an accepted property of the design.

use anyhow::{Context, Result};
use std::process::Command;

use crate::overlay::EnvOverlay;
use crate::report::Reporter;

/// Terminal state of one subprocess, consumed once by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResult {
    /// Exit code, or `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub diagnostic: Option<String>,
}

impl StageResult {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Run a shell script with the inherited environment plus `overlay`.
///
/// Overlay entries win on key collision. Errors only when the shell
/// itself cannot be spawned; a non-zero script exit is a normal
/// [`StageResult`].
pub fn run_shell(script: &str, overlay: Option<&EnvOverlay>) -> Result<StageResult> {
    let mut cmd = Command::new("bash");
    cmd.arg("-c").arg(script);
    if let Some(overlay) = overlay {
        overlay.apply(&mut cmd);
    }

    let status = cmd
        .status()
        .with_context(|| format!("spawning shell for '{script}'"))?;

    let diagnostic = status
        .code()
        .is_none()
        .then(|| "terminated by signal".to_string());
    Ok(StageResult {
        code: status.code(),
        diagnostic,
    })
}

/// Run one pipeline step and report its terminal status.
///
/// Exit 0 reports info and continues; anything else is fatal with the
/// originating exit code. Exactly one report per invocation.
pub fn run_step(
    rep: &Reporter,
    what: &str,
    script: &str,
    overlay: Option<&EnvOverlay>,
) -> Result<()> {
    let result = run_shell(script, overlay)?;
    if result.success() {
        rep.info(format!("{what}: done"));
        return Ok(());
    }

    let detail = match (&result.code, &result.diagnostic) {
        (Some(code), _) => format!("exit code {code}"),
        (None, Some(diagnostic)) => diagnostic.clone(),
        (None, None) => "unknown status".to_string(),
    };
    Err(rep.fatal(format!("{what} failed with {detail}")))
}
