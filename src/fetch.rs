//! Idempotent artifact download.
//!
//! A file that already exists at the destination is reused as-is; presence
//! is the only cache-hit signal. No size or checksum comparison happens,
//! so a stale or partially written file is indistinguishable from a good
//! one. Delete the scratch directory to force a clean fetch.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::report::Reporter;

/// Downloads URLs to local paths through an external transfer program.
///
/// The default program is `curl`; tests substitute a stub so transfer
/// attempts can be counted without network access.
pub struct Fetcher {
    transfer: PathBuf,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    pub fn new() -> Self {
        Self {
            transfer: PathBuf::from("curl"),
        }
    }

    /// Use an alternate transfer program with curl-compatible arguments.
    pub fn with_transfer_program(transfer: impl Into<PathBuf>) -> Self {
        Self {
            transfer: transfer.into(),
        }
    }

    /// Download `url` to `dest`, skipping the transfer when `dest` exists.
    pub fn fetch(&self, rep: &Reporter, url: &str, dest: &Path) -> Result<()> {
        if dest.exists() {
            rep.info(format!(
                "{} already exists, skipping download",
                dest.display()
            ));
            return Ok(());
        }

        let status = Command::new(&self.transfer)
            .arg("-fSL")
            .arg(url)
            .arg("-o")
            .arg(dest)
            .status()
            .with_context(|| {
                format!("running {} for '{url}'", self.transfer.display())
            })?;

        if status.success() {
            rep.info(format!("downloaded {}", dest.display()));
            Ok(())
        } else {
            Err(rep.fatal(format!(
                "downloading '{url}' failed with exit code {}",
                status.code().unwrap_or(-1)
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    /// Curl-compatible stub: logs the URL, creates the destination file.
    fn stub_transfer(dir: &Path, log: &Path, exit_code: i32) -> PathBuf {
        let script = dir.join("transfer.sh");
        fs::write(
            &script,
            format!(
                "#!/bin/sh\necho \"$2\" >> {}\n[ {exit_code} -eq 0 ] && touch \"$4\"\nexit {exit_code}\n",
                log.display()
            ),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[test]
    fn second_fetch_of_same_destination_skips_the_transfer() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("transfer.log");
        let fetcher = Fetcher::with_transfer_program(stub_transfer(dir.path(), &log, 0));
        let rep = Reporter::plain();
        let dest = dir.path().join("otp-x86_64-linux-gnu.tar.gz");

        fetcher.fetch(&rep, "https://example.com/a.tar.gz", &dest).unwrap();
        fetcher.fetch(&rep, "https://example.com/a.tar.gz", &dest).unwrap();

        let attempts = fs::read_to_string(&log).unwrap();
        assert_eq!(attempts.lines().count(), 1, "exactly one transfer attempt");
        assert!(dest.exists());
        assert!(!rep.failed());
    }

    #[test]
    fn transfer_failure_is_fatal_with_the_exit_code() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("transfer.log");
        let fetcher = Fetcher::with_transfer_program(stub_transfer(dir.path(), &log, 22));
        let rep = Reporter::plain();
        let dest = dir.path().join("image.qcow2.xz");

        let err = fetcher
            .fetch(&rep, "https://example.com/missing", &dest)
            .unwrap_err();
        assert!(err.to_string().contains("exit code 22"), "{err}");
        assert!(rep.failed());
        assert!(!dest.exists());
    }
}
