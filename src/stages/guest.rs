//! Guest-image resolution, fetch, and launch.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::config::ProvisionConfig;
use crate::locate::{self, guest, ResolvedArtifact};
use crate::report::Reporter;
use crate::runner::run_step;
use crate::stages::Pipeline;

/// Decide where the guest image comes from.
///
/// An explicit image URL skips resolution entirely; the filename is then
/// derived from the URL path. Otherwise the guest OS selector picks the
/// resolver. The guest resolver raises [`guest::UnknownArch`] instead of
/// reporting; this is the boundary where it becomes fatal.
pub fn resolve_guest_source(rep: &Reporter, config: &ProvisionConfig) -> Result<ResolvedArtifact> {
    if let Some(url) = &config.image_url {
        let filename = locate::filename_from_url(url).map_err(|err| rep.fatal(err))?;
        rep.info(format!("Using custom image URL: {url}"));
        return Ok(ResolvedArtifact {
            url: url.clone(),
            filename,
        });
    }

    match config.guest_os.as_str() {
        "freebsd" => match guest::image(&config.guest_version, &config.guest_arch) {
            Ok(resolved) => {
                rep.info(format!("Using image URL: {}", resolved.url));
                Ok(resolved)
            }
            Err(err) => Err(rep.fatal(err)),
        },
        other => Err(rep.fatal(format!("unknown guest OS: {other}"))),
    }
}

impl Pipeline<'_> {
    /// Download the guest image into the scratch cache.
    pub(crate) fn fetch_guest_image(&mut self, resolved: &ResolvedArtifact) -> Result<PathBuf> {
        self.rep.info(format!(
            "Downloading {} image from {}",
            self.config.guest_os, resolved.url
        ));
        let dest = self.layout.archive(&resolved.filename);
        self.fetcher.fetch(self.rep, &resolved.url, &dest)?;
        self.manifest.record(
            &format!("{}-image", self.config.guest_os),
            &self.config.guest_version,
            &resolved.url,
            None,
        );
        Ok(dest)
    }

    /// Hand the image to the opaque guest driver with the full overlay.
    ///
    /// The driver contract is positional and exit-status-only:
    /// `<driver> <os> <arch> <image>`.
    pub(crate) fn launch_guest(&self, image: &Path) -> Result<()> {
        self.rep.info("Starting VM");
        run_step(
            self.rep,
            "starting VM",
            &format!(
                "elixir -no-halt '{}' {} {} '{}'",
                self.config.driver.display(),
                self.config.guest_os,
                self.config.guest_arch,
                image.display()
            ),
            Some(&self.overlay),
        )
    }
}
