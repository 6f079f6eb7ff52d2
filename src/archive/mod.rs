//! Archive installation.
//!
//! Extracts a downloaded release archive over the installation directory and
//! deletes the archive afterwards. The format is inferred from the file name
//! alone; no magic-byte sniffing is done.
//!
//! | Extension            | Format                    |
//! |----------------------|---------------------------|
//! | `.tar.xz`, `.txz`    | [`ArchiveFormat::TarXz`]  |
//! | `.tar.gz`, `.tgz`    | [`ArchiveFormat::TarGz`]  |
//! | `.zip`               | [`ArchiveFormat::Zip`]    |
//!
//! Extraction overwrites existing files. Entries whose path would leave the
//! installation directory abort the extraction.

mod tarball;
mod zipfile;

pub use self::tarball::{TarCompression, TarExtractor};
pub use self::zipfile::ZipExtractor;

use crate::core::{Result, UpdaterError};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Something that can unpack an archive file into a directory.
///
/// Implementations are blocking and are run on a blocking worker thread.
pub trait Extractor: Send + Sync {
    /// Unpack `archive` into `destination`, which already exists.
    fn extract(&self, archive: &Path, destination: &Path) -> io::Result<()>;
}

/// Archive formats understood by the installer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// xz-compressed tarball (Linux releases)
    TarXz,
    /// gzip-compressed tarball
    TarGz,
    /// zip archive (Windows and macOS releases)
    Zip,
}

impl ArchiveFormat {
    /// Infer the format from a file name.
    ///
    /// ```rust
    /// use trilium_updater::archive::ArchiveFormat;
    ///
    /// assert_eq!(ArchiveFormat::from_file_name("trilium-linux-x64.tar.xz"), Some(ArchiveFormat::TarXz));
    /// assert_eq!(ArchiveFormat::from_file_name("trilium-windows-x64.ZIP"), Some(ArchiveFormat::Zip));
    /// assert_eq!(ArchiveFormat::from_file_name("trilium-linux-x64.rar"), None);
    /// ```
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".tar.xz") || lower.ends_with(".txz") {
            Some(Self::TarXz)
        } else if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if lower.ends_with(".zip") {
            Some(Self::Zip)
        } else {
            None
        }
    }

    /// Build the extractor for this format.
    #[must_use]
    pub fn extractor(self, overwrite: bool) -> Box<dyn Extractor> {
        match self {
            Self::TarXz => Box::new(TarExtractor::new(TarCompression::Xz, overwrite)),
            Self::TarGz => Box::new(TarExtractor::new(TarCompression::Gzip, overwrite)),
            Self::Zip => Box::new(ZipExtractor::new(overwrite)),
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TarXz => "tar.xz",
            Self::TarGz => "tar.gz",
            Self::Zip => "zip",
        })
    }
}

/// Knobs for [`install_archive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallOptions {
    /// Replace files that already exist in the installation directory.
    pub overwrite: bool,
    /// Fail when the archive cannot be deleted after extraction.
    pub strict_cleanup: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            overwrite: true,
            strict_cleanup: false,
        }
    }
}

/// Result of a successful installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    /// Format the archive was extracted as.
    pub format: ArchiveFormat,
    /// Whether the archive file was deleted.
    pub archive_removed: bool,
}

/// Extract `archive_dir/name` into `install_dir`, then delete the archive.
///
/// # Errors
///
/// - [`UpdaterError::UnsupportedFormat`] when the extension is not recognised;
///   the archive is left untouched
/// - [`UpdaterError::Filesystem`] when `install_dir` cannot be created, or
///   when the archive cannot be deleted and `strict_cleanup` is set
/// - [`UpdaterError::Extraction`] for anything that goes wrong while unpacking
pub async fn install_archive(
    name: &str,
    archive_dir: &Path,
    install_dir: &Path,
    options: InstallOptions,
) -> Result<InstallOutcome> {
    let format = ArchiveFormat::from_file_name(name).ok_or_else(|| UpdaterError::UnsupportedFormat {
        file: name.to_string(),
    })?;
    let archive = archive_dir.join(name);

    fs::create_dir_all(install_dir)
        .await
        .map_err(|e| UpdaterError::filesystem("create directory", install_dir, e))?;

    debug!("Detected {format} archive, overwrite = {}", options.overwrite);
    info!("Extracting {name} into {}...", install_dir.display());
    extract_blocking(format, archive.clone(), install_dir.to_path_buf(), options.overwrite).await?;
    info!("Extraction successful !");

    let archive_removed = remove_archive(&archive, options.strict_cleanup).await?;

    Ok(InstallOutcome {
        format,
        archive_removed,
    })
}

async fn extract_blocking(
    format: ArchiveFormat,
    archive: PathBuf,
    destination: PathBuf,
    overwrite: bool,
) -> Result<()> {
    let source = archive.clone();
    let result = tokio::task::spawn_blocking(move || {
        format.extractor(overwrite).extract(&source, &destination)
    })
    .await;

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(UpdaterError::extraction(archive, e)),
        Err(join_error) => Err(UpdaterError::extraction(
            archive,
            io::Error::other(format!("extraction task failed: {join_error}")),
        )),
    }
}

async fn remove_archive(archive: &Path, strict: bool) -> Result<bool> {
    info!("Deleting archive {}", archive.display());
    match fs::remove_file(archive).await {
        Ok(()) => {
            debug!("Deleted {}", archive.display());
            Ok(true)
        }
        Err(e) if strict => Err(UpdaterError::filesystem("remove", archive, e)),
        Err(e) => {
            warn!("Could not remove {}: {e}", archive.display());
            Ok(false)
        }
    }
}
