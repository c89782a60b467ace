//! Environment overlays contributed by provisioning stages.
//!
//! Each stage that installs something declares the search-path entries and
//! the root-directory variable the following stages need. Overlays merge by
//! concatenation in provisioning order (runtime, then compiler, then
//! hypervisor); the most recently set root-directory variable wins. A
//! published overlay is never mutated in place; consumers merge into a
//! fresh value.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Incremental environment modification for one or more stages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverlay {
    path_prepends: Vec<PathBuf>,
    root: Option<RootDir>,
}

/// A root-directory variable, e.g. `ERL_ROOTDIR`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootDir {
    pub var: String,
    pub dir: PathBuf,
}

impl EnvOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a search-path entry. Entries keep insertion order.
    pub fn prepend_path(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.path_prepends.push(dir.into());
        self
    }

    /// Set the root-directory variable, replacing any earlier one.
    pub fn set_root(&mut self, var: impl Into<String>, dir: impl Into<PathBuf>) -> &mut Self {
        self.root = Some(RootDir {
            var: var.into(),
            dir: dir.into(),
        });
        self
    }

    /// Concatenate another overlay onto this one.
    ///
    /// Path entries from `other` come after the existing ones; a root set
    /// in `other` overrides one set here.
    pub fn merge(&mut self, other: &EnvOverlay) -> &mut Self {
        self.path_prepends
            .extend(other.path_prepends.iter().cloned());
        if other.root.is_some() {
            self.root = other.root.clone();
        }
        self
    }

    /// Search-path entries in composition order.
    pub fn path_entries(&self) -> &[PathBuf] {
        &self.path_prepends
    }

    pub fn root(&self) -> Option<&RootDir> {
        self.root.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.path_prepends.is_empty() && self.root.is_none()
    }

    /// Full PATH value: the prepends, then the inherited search path.
    pub fn search_path(&self, inherited: Option<&str>) -> OsString {
        let entries = self
            .path_prepends
            .iter()
            .map(|p| p.as_os_str().to_os_string())
            .chain(inherited.map(OsString::from));
        // Entries come from version-derived scratch paths; none contain ':'.
        env::join_paths(entries).unwrap_or_default()
    }

    /// Apply this overlay on top of the inherited environment of `cmd`.
    ///
    /// Overlay entries win on key collision.
    pub fn apply(&self, cmd: &mut Command) {
        if !self.path_prepends.is_empty() {
            let inherited = env::var("PATH").ok();
            cmd.env("PATH", self.search_path(inherited.as_deref()));
        }
        if let Some(root) = &self.root {
            cmd.env(&root.var, &root.dir);
        }
    }
}

/// Convenience for a single-entry overlay.
pub fn path_entry(dir: impl AsRef<Path>) -> EnvOverlay {
    let mut overlay = EnvOverlay::new();
    overlay.prepend_path(dir.as_ref());
    overlay
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_provisioning_order() {
        let mut composed = EnvOverlay::new();
        composed.merge(&path_entry("/scratch/otp-26.2.1/usr/local/bin"));
        composed.merge(&path_entry("/scratch/elixir-1.16.0/bin"));
        composed.merge(&path_entry("/scratch/qemu-8.2.0/bin"));

        let entries: Vec<_> = composed
            .path_entries()
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            entries,
            [
                "/scratch/otp-26.2.1/usr/local/bin",
                "/scratch/elixir-1.16.0/bin",
                "/scratch/qemu-8.2.0/bin",
            ]
        );
    }

    #[test]
    fn later_root_overrides_earlier() {
        let mut first = EnvOverlay::new();
        first.set_root("ERL_ROOTDIR", "/scratch/otp-26.2.1/usr/local/lib/erlang");
        let mut second = EnvOverlay::new();
        second.set_root("ERL_ROOTDIR", "/scratch/otp-27.0/usr/local/lib/erlang");

        let mut composed = EnvOverlay::new();
        composed.merge(&first).merge(&second);
        assert_eq!(
            composed.root().map(|r| r.dir.clone()),
            Some(PathBuf::from("/scratch/otp-27.0/usr/local/lib/erlang"))
        );
    }

    #[test]
    fn search_path_appends_inherited_path() {
        let mut overlay = EnvOverlay::new();
        overlay.prepend_path("/a").prepend_path("/b");
        assert_eq!(
            overlay.search_path(Some("/usr/bin:/bin")),
            OsString::from("/a:/b:/usr/bin:/bin")
        );
    }

    #[test]
    fn empty_overlay_leaves_command_untouched() {
        let overlay = EnvOverlay::new();
        assert!(overlay.is_empty());
        let mut cmd = Command::new("true");
        overlay.apply(&mut cmd);
        assert_eq!(cmd.get_envs().count(), 0);
    }
}
