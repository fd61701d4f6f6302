//! The download, extract and promote pipeline.
//!
//! ```text
//! CheckExisting --(present)--> Done
//!       |
//!       v
//! Downloading -> Extracting -> Promoting -> Done
//! ```
//!
//! The versioned directory only ever appears through a single `rename` of a
//! fully extracted tree, so a failed run never leaves a half-written install
//! under its final name.

use crate::core::archive::ArchiveFormat;
use crate::core::download::Downloader;
use crate::core::platform::Platform;
use crate::core::version::normalize;
use crate::error::{GetgoError, Result};
use crate::utils::fs;
use std::path::{Path, PathBuf};

/// Name of the single top-level directory inside every Go release archive.
pub const PAYLOAD_DIR: &str = "go";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed(PathBuf),
    AlreadyInstalled(PathBuf),
}

impl InstallOutcome {
    pub fn versioned_dir(&self) -> &Path {
        match self {
            InstallOutcome::Installed(dir) | InstallOutcome::AlreadyInstalled(dir) => dir,
        }
    }
}

pub struct InstallPipeline<'a> {
    downloader: &'a Downloader,
    download_base_url: &'a str,
    platform: &'a Platform,
}

impl<'a> InstallPipeline<'a> {
    pub fn new(downloader: &'a Downloader, download_base_url: &'a str, platform: &'a Platform) -> Self {
        Self {
            downloader,
            download_base_url,
            platform,
        }
    }

    pub fn archive_url(&self, version: &str) -> String {
        self.platform.archive_url(self.download_base_url, version)
    }

    /// Final location of `version` under `install_root`, e.g. `<root>/go1.23.1`.
    pub fn versioned_dir(&self, version: &str, install_root: &Path) -> PathBuf {
        install_root.join(normalize::to_dir_name(version))
    }

    pub fn is_installed(&self, version: &str, install_root: &Path) -> bool {
        self.versioned_dir(version, install_root).exists()
    }

    pub fn install(&self, version: &str, install_root: &Path) -> Result<InstallOutcome> {
        let version = normalize::to_plain_version(version);
        let versioned_dir = self.versioned_dir(&version, install_root);

        if versioned_dir.exists() {
            log::debug!("{} already present, skipping", versioned_dir.display());
            return Ok(InstallOutcome::AlreadyInstalled(versioned_dir));
        }

        fs::ensure_dir_exists(install_root)?;

        let format = self.platform.archive_format();
        let archive = self.download(&version, format)?;

        // Extract next to the destination so the final rename stays on one filesystem.
        let staging = tempfile::Builder::new()
            .prefix(".getgo-extract")
            .tempdir_in(install_root)?;
        log::debug!("staging extraction in {}", staging.path().display());
        format.extract(&archive, staging.path())?;

        promote(&staging.path().join(PAYLOAD_DIR), &versioned_dir)?;

        if let Err(e) = staging.close() {
            log::warn!("failed to remove staging directory: {e}");
        }
        if let Err(e) = archive.close() {
            log::warn!("failed to remove downloaded archive: {e}");
        }

        Ok(InstallOutcome::Installed(versioned_dir))
    }

    /// Fetch the release archive into a uniquely named temp file. The file is
    /// deleted when the returned handle drops.
    fn download(&self, version: &str, format: ArchiveFormat) -> Result<tempfile::TempPath> {
        let url = self.archive_url(version);
        let archive = tempfile::Builder::new()
            .prefix(&format!("go{version}.{}-{}.", self.platform.os, self.platform.arch))
            .suffix(&format!(".{}", format.extension()))
            .tempfile()?
            .into_temp_path();

        log::debug!("downloading {url} to {}", archive.display());
        self.downloader.fetch(&url, &archive)?;
        Ok(archive)
    }
}

/// Move a fully extracted tree into its final location with one rename.
pub fn promote(extracted: &Path, versioned_dir: &Path) -> Result<()> {
    if !extracted.is_dir() {
        return Err(GetgoError::MissingPayload {
            path: extracted.to_path_buf(),
        });
    }

    // Something may have appeared since the presence check.
    fs::remove_path(versioned_dir)?;

    if let Some(parent) = versioned_dir.parent() {
        fs::ensure_dir_exists(parent)?;
    }

    log::debug!(
        "promoting {} to {}",
        extracted.display(),
        versioned_dir.display()
    );
    std::fs::rename(extracted, versioned_dir)?;
    Ok(())
}
