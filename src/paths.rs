//! Scratch-directory layout for provisioned artifacts.
//!
//! This module only defines WHERE things go, not HOW to get them. Every
//! path is derived from a component version, which is what makes re-runs
//! land on the same cache entries.

use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::locate::QEMU_TRIPLET;

/// Version-derived paths under one scratch directory.
#[derive(Debug, Clone)]
pub struct ScratchLayout {
    scratch: PathBuf,
}

impl ScratchLayout {
    pub fn new(scratch: impl Into<PathBuf>) -> Self {
        Self {
            scratch: scratch.into(),
        }
    }

    /// Per-user cache directory, falling back to the system temp dir.
    pub fn default_scratch() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(env::temp_dir)
            .join("guest-builder")
    }

    pub fn scratch(&self) -> &Path {
        &self.scratch
    }

    pub fn ensure_exists(&self) -> Result<()> {
        fs::create_dir_all(&self.scratch).with_context(|| {
            format!("creating scratch directory '{}'", self.scratch.display())
        })
    }

    /// Destination for a downloaded archive or image.
    pub fn archive(&self, filename: &str) -> PathBuf {
        self.scratch.join(filename)
    }

    /// Hypervisor archives are version-qualified locally so upgrading QEMU
    /// does not collide with a cached tarball of another version.
    pub fn hypervisor_archive(&self, version: &str) -> PathBuf {
        self.scratch
            .join(format!("qemu-{version}-{QEMU_TRIPLET}.tar.gz"))
    }

    pub fn runtime_root(&self, version: &str) -> PathBuf {
        self.scratch.join(format!("otp-{version}"))
    }

    /// Executables inside an unpacked runtime archive.
    pub fn runtime_bin(&self, version: &str) -> PathBuf {
        self.runtime_root(version).join("usr/local/bin")
    }

    /// Value for `ERL_ROOTDIR` inside an unpacked runtime archive.
    pub fn runtime_erlang_root(&self, version: &str) -> PathBuf {
        self.runtime_root(version).join("usr/local/lib/erlang")
    }

    pub fn compiler_root(&self, version: &str) -> PathBuf {
        self.scratch.join(format!("elixir-{version}"))
    }

    pub fn compiler_bin(&self, version: &str) -> PathBuf {
        self.compiler_root(version).join("bin")
    }

    pub fn hypervisor_root(&self, version: &str) -> PathBuf {
        self.scratch.join(format!("qemu-{version}"))
    }

    pub fn hypervisor_bin(&self, version: &str) -> PathBuf {
        self.hypervisor_root(version).join("bin")
    }

    pub fn manifest(&self) -> PathBuf {
        self.scratch.join("provision-manifest.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roots_are_version_derived() {
        let layout = ScratchLayout::new("/scratch");
        assert_eq!(
            layout.runtime_root("26.2.1"),
            PathBuf::from("/scratch/otp-26.2.1")
        );
        assert_eq!(
            layout.compiler_root("1.16.0"),
            PathBuf::from("/scratch/elixir-1.16.0")
        );
        assert_eq!(
            layout.hypervisor_root("8.2.0"),
            PathBuf::from("/scratch/qemu-8.2.0")
        );
    }

    #[test]
    fn runtime_paths_follow_the_archive_layout() {
        let layout = ScratchLayout::new("/scratch");
        assert_eq!(
            layout.runtime_bin("26.2.1"),
            PathBuf::from("/scratch/otp-26.2.1/usr/local/bin")
        );
        assert_eq!(
            layout.runtime_erlang_root("26.2.1"),
            PathBuf::from("/scratch/otp-26.2.1/usr/local/lib/erlang")
        );
    }

    #[test]
    fn hypervisor_archive_is_version_qualified() {
        let layout = ScratchLayout::new("/scratch");
        assert_eq!(
            layout.hypervisor_archive("8.2.0"),
            PathBuf::from("/scratch/qemu-8.2.0-x86_64-linux-gnu.tar.gz")
        );
    }
}
