//! Toolchain and guest-image provisioning for QEMU-backed test VMs.
//!
//! This crate provisions the ephemeral environment a CI job needs to boot
//! a FreeBSD guest under QEMU and drive it from Elixir:
//!
//! - **Artifact location** - pure resolvers from (component, version, os,
//!   arch) to download URL and filename, including the guest image's
//!   version-epoch split and per-architecture alias table
//! - **Idempotent fetch** - existing files short-circuit the transfer
//! - **Unpack/build steps** - host shell invocations with a composed
//!   environment overlay
//! - **Stage orchestration** - runtime, compiler, hypervisor, guest image,
//!   launch, aborting on the first fatal error
//!
//! # Architecture
//!
//! ```text
//! locate ──▶ fetch ──▶ runner ──▶ overlay ──▶ next stage / launch
//!    │                                │
//!    └── pure tables, no I/O          └── PATH prepends + ERL_ROOTDIR
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use guest_builder::config::ProvisionConfig;
//! use guest_builder::report::Reporter;
//! use guest_builder::stages::Pipeline;
//!
//! let mut config = ProvisionConfig::default();
//! config.apply_env_inputs();
//! let rep = Reporter::from_env();
//! Pipeline::new(config, &rep).run()?;
//! ```

pub mod config;
pub mod fetch;
pub mod locate;
pub mod manifest;
pub mod overlay;
pub mod paths;
pub mod preflight;
pub mod report;
pub mod runner;
pub mod stages;

pub use config::ProvisionConfig;
pub use locate::ResolvedArtifact;
pub use overlay::EnvOverlay;
pub use report::{Reporter, Severity};
pub use stages::{Pipeline, Stage};
