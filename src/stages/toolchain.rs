//! Toolchain provisioning stages: runtime, compiler, hypervisor.
//!
//! Install roots are a convention derived from version strings (see
//! [`crate::paths::ScratchLayout`]), not discovered from the subprocesses.

use anyhow::Result;

use crate::locate;
use crate::overlay::EnvOverlay;
use crate::runner::run_step;
use crate::stages::{HostPlatform, Pipeline};

impl Pipeline<'_> {
    /// Fetch and unpack the precompiled Erlang/OTP runtime.
    pub(crate) fn provision_runtime(&mut self, host: HostPlatform) -> Result<()> {
        let version = self.config.erlang_version.clone();
        let resolved = locate::runtime(&version, host.os, host.arch)
            .map_err(|err| self.rep.fatal(err))?;

        self.rep
            .info(format!("Downloading Erlang/OTP from {}", resolved.url));
        let archive = self.layout.archive(&resolved.filename);
        self.fetcher.fetch(self.rep, &resolved.url, &archive)?;

        let root = self.layout.runtime_root(&version);
        run_step(
            self.rep,
            &format!("extracting Erlang/OTP {version}"),
            &format!(
                "mkdir -p '{0}' && tar -C '{0}' -xzf '{1}'",
                root.display(),
                archive.display()
            ),
            None,
        )?;

        let mut contrib = EnvOverlay::new();
        contrib
            .prepend_path(self.layout.runtime_bin(&version))
            .set_root("ERL_ROOTDIR", self.layout.runtime_erlang_root(&version));
        self.overlay.merge(&contrib);
        self.manifest
            .record("erlang", &version, &resolved.url, Some(root));
        Ok(())
    }

    /// Fetch the Elixir source archive and build it against the runtime.
    pub(crate) fn provision_compiler(&mut self) -> Result<()> {
        let version = self.config.elixir_version.clone();
        let resolved = locate::compiler(&version);

        self.rep.info(format!("Downloading Elixir {version}"));
        let archive = self.layout.archive(&resolved.filename);
        self.fetcher.fetch(self.rep, &resolved.url, &archive)?;

        let root = self.layout.compiler_root(&version);
        run_step(
            self.rep,
            &format!("extracting Elixir {version}"),
            &format!(
                "mkdir -p '{0}' && tar -C '{0}' -xzf '{1}' --strip-components 1",
                root.display(),
                archive.display()
            ),
            None,
        )?;

        // The build needs the runtime on PATH plus its own bin dir for the
        // mix bootstrap steps.
        let mut contrib = EnvOverlay::new();
        contrib.prepend_path(self.layout.compiler_bin(&version));
        let mut build_overlay = self.overlay.clone();
        build_overlay.merge(&contrib);

        run_step(
            self.rep,
            &format!("building Elixir {version}"),
            &format!(
                "cd '{}' && make clean compile && mix local.hex --force && mix local.rebar --force",
                root.display()
            ),
            Some(&build_overlay),
        )?;

        self.overlay.merge(&contrib);
        self.manifest
            .record("elixir", &version, &resolved.url, Some(root));
        Ok(())
    }

    /// Fetch and unpack the precompiled QEMU build.
    pub(crate) fn provision_hypervisor(&mut self) -> Result<()> {
        let version = self.config.qemu_version.clone();
        let resolved = locate::hypervisor(&version);

        self.rep.info(format!("Downloading QEMU {version}"));
        let archive = self.layout.hypervisor_archive(&version);
        self.fetcher.fetch(self.rep, &resolved.url, &archive)?;

        let root = self.layout.hypervisor_root(&version);
        run_step(
            self.rep,
            &format!("extracting QEMU {version}"),
            &format!(
                "mkdir -p '{0}' && tar -C '{0}' -xzf '{1}'",
                root.display(),
                archive.display()
            ),
            None,
        )?;

        let mut contrib = EnvOverlay::new();
        contrib.prepend_path(self.layout.hypervisor_bin(&version));
        self.overlay.merge(&contrib);
        self.manifest
            .record("qemu", &version, &resolved.url, Some(root));
        Ok(())
    }
}
