//! Provisioning manifest.
//!
//! Records what a run resolved and where it was installed, as one JSON
//! document in the scratch directory. The manifest is informational: a
//! failed write is reported as a recoverable error and the run continues.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// One provisioned component or fetched image.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentRecord {
    pub name: String,
    pub version: String,
    pub url: String,
    /// Unpacked install root; absent for artifacts used in place.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_root: Option<PathBuf>,
}

/// Everything one pipeline run provisioned.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionManifest {
    pub created: String,
    pub components: Vec<ComponentRecord>,
}

impl ProvisionManifest {
    pub fn new() -> Self {
        let created = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| String::new());
        Self {
            created,
            components: Vec::new(),
        }
    }

    pub fn record(
        &mut self,
        name: &str,
        version: &str,
        url: &str,
        install_root: Option<PathBuf>,
    ) {
        self.components.push(ComponentRecord {
            name: name.to_string(),
            version: version.to_string(),
            url: url.to_string(),
            install_root,
        });
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serializing manifest")?;
        fs::write(path, json)
            .with_context(|| format!("writing manifest '{}'", path.display()))
    }
}

impl Default for ProvisionManifest {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn manifest_records_one_entry_per_component() {
        let mut manifest = ProvisionManifest::new();
        manifest.record(
            "erlang",
            "26.2.1",
            "https://example.com/otp.tar.gz",
            Some(PathBuf::from("/scratch/otp-26.2.1")),
        );
        manifest.record(
            "freebsd-image",
            "14.0",
            "https://example.com/image.qcow2.xz",
            None,
        );

        let dir = tempdir().unwrap();
        let path = dir.path().join("provision-manifest.json");
        manifest.write(&path).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let components = parsed["components"].as_array().unwrap();
        assert_eq!(components.len(), 2);
        assert_eq!(components[0]["name"], "erlang");
        assert_eq!(components[0]["install_root"], "/scratch/otp-26.2.1");
        assert!(components[1].get("install_root").is_none());
        assert!(!parsed["created"].as_str().unwrap().is_empty());
    }
}
