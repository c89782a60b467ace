//! FreeBSD guest-image resolution.
//!
//! The upstream image repository is inconsistent in two ways this module
//! has to absorb: the archive location changes once a release rotates out
//! of the supported set, and each architecture uses different naming per
//! URL field. Both are expressed as finite tables so a new release or
//! architecture is a data change.

use super::ResolvedArtifact;

/// What `version = "latest"` currently resolves to.
const LATEST_RELEASE: &str = "14.0";

/// Releases still served from the primary mirror, under a `Latest/`
/// subdirectory. Everything else comes from the ftp archive. Membership is
/// a set lookup, not a version comparison.
const CURRENT_RELEASES: &[&str] = &["14.0", "13.2", "12.4"];

const RELEASES_BASE: &str = "https://download.freebsd.org/releases/VM-IMAGES";
const ARCHIVE_BASE: &str = "http://ftp-archive.freebsd.org/pub/FreeBSD-Archive/old-releases/VM-IMAGES";

/// Per-architecture naming used by the image repository.
///
/// `os_arch` is empty for architectures that carry no separate OS-name
/// token in the image filename (the x86 family).
#[derive(Debug, Clone, Copy)]
pub struct ArchAlias {
    pub key: &'static str,
    pub url_arch: &'static str,
    pub os_arch: &'static str,
    pub instruction_set: &'static str,
}

/// Canonical architecture keys accepted for guest images.
pub const ARCH_ALIASES: &[ArchAlias] = &[
    ArchAlias { key: "amd64", url_arch: "amd64", os_arch: "", instruction_set: "amd64" },
    ArchAlias { key: "x86_64", url_arch: "amd64", os_arch: "", instruction_set: "amd64" },
    ArchAlias { key: "i386", url_arch: "i386", os_arch: "", instruction_set: "i386" },
    ArchAlias { key: "aarch64", url_arch: "aarch64", os_arch: "arm64", instruction_set: "aarch64" },
    ArchAlias { key: "riscv64", url_arch: "riscv64", os_arch: "riscv", instruction_set: "riscv64" },
];

/// Architecture key with no alias table entry.
///
/// Deliberately a distinct raised error rather than the uniform fatal
/// report: the orchestrator catches it at the resolve boundary and
/// converts it there.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown architecture: {0}")]
pub struct UnknownArch(pub String);

/// Look up the alias entry for a canonical architecture key.
pub fn alias(arch: &str) -> Result<&'static ArchAlias, UnknownArch> {
    ARCH_ALIASES
        .iter()
        .find(|entry| entry.key == arch)
        .ok_or_else(|| UnknownArch(arch.to_string()))
}

/// Resolve the download URL and filename for a FreeBSD VM image.
///
/// `"latest"` is rewritten to the newest current release before the epoch
/// partition is applied.
pub fn image(version: &str, arch: &str) -> Result<ResolvedArtifact, UnknownArch> {
    let version = if version == "latest" {
        LATEST_RELEASE
    } else {
        version
    };

    let (base_url, subdir) = if CURRENT_RELEASES.contains(&version) {
        (format!("{RELEASES_BASE}/{version}-RELEASE"), "Latest")
    } else {
        (format!("{ARCHIVE_BASE}/{version}-RELEASE"), "")
    };

    let alias = alias(arch)?;

    let os_arch_segment = if alias.os_arch.is_empty() {
        String::new()
    } else {
        format!("{}-", alias.os_arch)
    };
    let filename = format!(
        "FreeBSD-{version}-RELEASE-{os_arch_segment}{}.qcow2.xz",
        alias.instruction_set
    );

    let subdir_segment = if subdir.is_empty() {
        String::new()
    } else {
        format!("{subdir}/")
    };
    Ok(ResolvedArtifact {
        url: format!("{base_url}/{}/{subdir_segment}{filename}", alias.url_arch),
        filename,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_alias_resolves_to_a_wellformed_filename() {
        for entry in ARCH_ALIASES {
            let resolved = image("14.0", entry.key).unwrap();
            let expected = if entry.os_arch.is_empty() {
                format!("FreeBSD-14.0-RELEASE-{}.qcow2.xz", entry.instruction_set)
            } else {
                format!(
                    "FreeBSD-14.0-RELEASE-{}-{}.qcow2.xz",
                    entry.os_arch, entry.instruction_set
                )
            };
            assert_eq!(resolved.filename, expected, "alias {}", entry.key);
            assert!(resolved.url.ends_with(&expected), "alias {}", entry.key);
        }
    }

    #[test]
    fn amd64_omits_the_os_name_segment() {
        let resolved = image("14.0", "amd64").unwrap();
        assert_eq!(resolved.filename, "FreeBSD-14.0-RELEASE-amd64.qcow2.xz");
        assert_eq!(
            resolved.url,
            "https://download.freebsd.org/releases/VM-IMAGES/14.0-RELEASE/amd64/Latest/FreeBSD-14.0-RELEASE-amd64.qcow2.xz"
        );
    }

    #[test]
    fn aarch64_keeps_the_os_name_segment() {
        let resolved = image("14.0", "aarch64").unwrap();
        assert_eq!(
            resolved.filename,
            "FreeBSD-14.0-RELEASE-arm64-aarch64.qcow2.xz"
        );
        assert!(resolved.url.contains("/aarch64/Latest/"));
    }

    #[test]
    fn latest_is_an_alias_for_the_newest_current_release() {
        for entry in ARCH_ALIASES {
            assert_eq!(
                image("latest", entry.key).unwrap(),
                image("14.0", entry.key).unwrap()
            );
        }
    }

    #[test]
    fn current_releases_use_the_releases_base_with_latest_subdir() {
        for version in CURRENT_RELEASES {
            let resolved = image(version, "amd64").unwrap();
            assert!(resolved.url.starts_with(RELEASES_BASE), "{version}");
            assert!(resolved.url.contains("/Latest/"), "{version}");
        }
    }

    #[test]
    fn archived_releases_use_the_archive_base_without_subdir() {
        let resolved = image("12.1", "amd64").unwrap();
        assert_eq!(
            resolved.url,
            "http://ftp-archive.freebsd.org/pub/FreeBSD-Archive/old-releases/VM-IMAGES/12.1-RELEASE/amd64/FreeBSD-12.1-RELEASE-amd64.qcow2.xz"
        );
    }

    #[test]
    fn unmapped_architecture_is_a_raised_error() {
        let err = image("14.0", "sparc64").unwrap_err();
        assert_eq!(err, UnknownArch("sparc64".to_string()));
        assert_eq!(err.to_string(), "unknown architecture: sparc64");
    }
}
