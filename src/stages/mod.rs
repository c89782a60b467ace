//! The provisioning pipeline.
//!
//! Stages run strictly in sequence; each one resolves, fetches, unpacks or
//! builds, then contributes its environment overlay for the stages after
//! it. Every stage returns `Result`, so the first fatal error aborts the
//! rest of the pipeline structurally: nothing resolves, fetches, or runs
//! past it.

pub mod guest;
pub mod toolchain;

use anyhow::Result;
use std::fmt;

use crate::config::ProvisionConfig;
use crate::fetch::Fetcher;
use crate::manifest::ProvisionManifest;
use crate::overlay::EnvOverlay;
use crate::paths::ScratchLayout;
use crate::report::Reporter;

/// Pipeline states, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ProvisionRuntime,
    ProvisionCompiler,
    ProvisionHypervisor,
    ResolveGuestImage,
    FetchGuestImage,
    LaunchGuest,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::ProvisionRuntime => "provision-runtime",
            Stage::ProvisionCompiler => "provision-compiler",
            Stage::ProvisionHypervisor => "provision-hypervisor",
            Stage::ResolveGuestImage => "resolve-guest-image",
            Stage::FetchGuestImage => "fetch-guest-image",
            Stage::LaunchGuest => "launch-guest",
        };
        write!(f, "{label}")
    }
}

/// Host platform the toolchain is provisioned for.
///
/// Resolved once before the first stage; the locators never detect
/// anything themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostPlatform {
    pub os: &'static str,
    pub arch: &'static str,
}

/// Gate on the host OS and pin the toolchain architecture.
///
/// Only x86_64 runtime builds are published for linux hosts, so the
/// detected CPU is ignored there.
pub fn host_platform_for(rep: &Reporter, host_os: &str) -> Result<HostPlatform> {
    match host_os {
        "linux" => Ok(HostPlatform {
            os: "linux",
            arch: "x86_64",
        }),
        "windows" => Err(rep.fatal("Windows is not supported yet.")),
        "macos" => Err(rep.fatal("macOS is not supported yet.")),
        other => Err(rep.fatal(format!("unsupported operating system: {other}"))),
    }
}

/// Sequential orchestrator over one scratch directory.
pub struct Pipeline<'a> {
    pub(crate) config: ProvisionConfig,
    pub(crate) layout: ScratchLayout,
    pub(crate) rep: &'a Reporter,
    pub(crate) fetcher: Fetcher,
    /// Union of the overlays contributed by completed stages.
    pub(crate) overlay: EnvOverlay,
    pub(crate) manifest: ProvisionManifest,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: ProvisionConfig, rep: &'a Reporter) -> Self {
        Self::with_fetcher(config, rep, Fetcher::new())
    }

    /// Construct with an alternate fetcher (tests stub the transfer here).
    pub fn with_fetcher(config: ProvisionConfig, rep: &'a Reporter, fetcher: Fetcher) -> Self {
        let scratch = config
            .scratch_dir
            .clone()
            .unwrap_or_else(ScratchLayout::default_scratch);
        Self {
            config,
            layout: ScratchLayout::new(scratch),
            rep,
            fetcher,
            overlay: EnvOverlay::new(),
            manifest: ProvisionManifest::new(),
        }
    }

    /// The environment composed so far.
    pub fn overlay(&self) -> &EnvOverlay {
        &self.overlay
    }

    /// Run every stage in order, stopping at the first fatal error.
    pub fn run(&mut self) -> Result<()> {
        let host = host_platform_for(self.rep, std::env::consts::OS)?;
        self.layout.ensure_exists()?;

        self.begin(Stage::ProvisionRuntime);
        self.provision_runtime(host)?;
        self.begin(Stage::ProvisionCompiler);
        self.provision_compiler()?;
        self.begin(Stage::ProvisionHypervisor);
        self.provision_hypervisor()?;

        self.begin(Stage::ResolveGuestImage);
        let image = guest::resolve_guest_source(self.rep, &self.config)?;
        self.begin(Stage::FetchGuestImage);
        let image_path = self.fetch_guest_image(&image)?;
        self.begin(Stage::LaunchGuest);
        self.launch_guest(&image_path)?;

        // Informational only; a failed write must not fail the launch.
        if let Err(err) = self.manifest.write(&self.layout.manifest()) {
            self.rep
                .error(format!("recording provision manifest failed: {err:#}"));
        }
        Ok(())
    }

    fn begin(&self, stage: Stage) {
        self.rep.info(format!("[{stage}]"));
    }
}
