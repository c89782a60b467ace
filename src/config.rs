//! Provisioning configuration.
//!
//! Defaults cover the pinned toolchain the pipeline was built around; a
//! TOML file can override any of them, and CI inputs (the `INPUT_*`
//! environment contract used by GitHub Actions) override the file. An
//! empty input value means "not provided", matching the Actions runner.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Fully resolved pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionConfig {
    pub erlang_version: String,
    pub elixir_version: String,
    pub qemu_version: String,
    /// Guest OS selector; only "freebsd" is configured today.
    pub guest_os: String,
    pub guest_version: String,
    pub guest_arch: String,
    /// Explicit image URL; when set, guest-image resolution is skipped.
    pub image_url: Option<String>,
    pub scratch_dir: Option<PathBuf>,
    /// Guest driver script handed to `elixir -no-halt`.
    pub driver: PathBuf,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            erlang_version: "26.2.1".to_string(),
            elixir_version: "1.16.0".to_string(),
            qemu_version: "8.2.0".to_string(),
            guest_os: "freebsd".to_string(),
            guest_version: "latest".to_string(),
            guest_arch: "amd64".to_string(),
            image_url: None,
            scratch_dir: None,
            driver: PathBuf::from("qemu.exs"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    toolchain: Option<ToolchainToml>,
    guest: Option<GuestToml>,
    scratch_dir: Option<String>,
    driver: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ToolchainToml {
    erlang: Option<String>,
    elixir: Option<String>,
    qemu: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GuestToml {
    os: Option<String>,
    version: Option<String>,
    arch: Option<String>,
    image_url: Option<String>,
}

impl ProvisionConfig {
    /// Load a config file over the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read_to_string(path)
            .with_context(|| format!("reading config '{}'", path.display()))?;
        Self::from_toml_str(&bytes)
            .with_context(|| format!("parsing config '{}'", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let parsed: ConfigToml = toml::from_str(raw)?;
        let mut config = Self::default();

        if let Some(toolchain) = parsed.toolchain {
            apply_version(&mut config.erlang_version, toolchain.erlang, "toolchain.erlang")?;
            apply_version(&mut config.elixir_version, toolchain.elixir, "toolchain.elixir")?;
            apply_version(&mut config.qemu_version, toolchain.qemu, "toolchain.qemu")?;
        }
        if let Some(guest) = parsed.guest {
            if let Some(os) = guest.os {
                apply_normalized(&mut config.guest_os, &os, "guest.os")?;
            }
            apply_version(&mut config.guest_version, guest.version, "guest.version")?;
            if let Some(arch) = guest.arch {
                apply_normalized(&mut config.guest_arch, &arch, "guest.arch")?;
            }
            config.image_url = guest.image_url.and_then(non_empty);
        }
        config.scratch_dir = parsed.scratch_dir.and_then(non_empty).map(PathBuf::from);
        if let Some(driver) = parsed.driver.and_then(non_empty) {
            config.driver = PathBuf::from(driver);
        }

        Ok(config)
    }

    /// Apply CI input overrides through a lookup, `INPUT_*`-style.
    ///
    /// The lookup receives the uppercased `INPUT_<NAME>` key. Blank values
    /// are treated as absent.
    pub fn apply_input_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let input = |name: &str| lookup(&format!("INPUT_{name}")).and_then(non_empty);

        if let Some(os) = input("OS") {
            self.guest_os = os.to_ascii_lowercase();
        }
        if let Some(version) = input("VERSION") {
            self.guest_version = version;
        }
        if let Some(arch) = input("ARCH") {
            self.guest_arch = arch;
        }
        if let Some(url) = input("OS_IMAGE_URL") {
            self.image_url = Some(url);
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_inputs(&mut self) {
        self.apply_input_overrides(|key| env::var(key).ok());
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn apply_version(slot: &mut String, value: Option<String>, field: &str) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    match non_empty(value) {
        Some(version) => {
            *slot = version;
            Ok(())
        }
        None => bail!("invalid config: {field} must not be empty"),
    }
}

fn apply_normalized(slot: &mut String, value: &str, field: &str) -> Result<()> {
    let trimmed = value.trim().to_ascii_lowercase();
    if trimmed.is_empty() {
        bail!("invalid config: {field} must not be empty");
    }
    *slot = trimmed;
    Ok(())
}
