//! Zip extraction.
//!
//! Entries are written one by one rather than through `ZipArchive::extract`,
//! which refuses to replace symlinks left by a previous install (the macOS
//! `.app` bundles are full of them).

use super::Extractor;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;
use zip::read::ZipFile;
use zip::result::ZipError;

/// Extracts zip archives.
#[derive(Debug, Clone, Copy)]
pub struct ZipExtractor {
    overwrite: bool,
}

impl ZipExtractor {
    /// Create a zip extractor.
    #[must_use]
    pub const fn new(overwrite: bool) -> Self {
        Self {
            overwrite,
        }
    }
}

impl Extractor for ZipExtractor {
    fn extract(&self, archive: &Path, destination: &Path) -> io::Result<()> {
        let file = BufReader::new(File::open(archive)?);
        let mut zip = ZipArchive::new(file).map_err(zip_to_io)?;
        let root = destination.canonicalize()?;

        if !self.overwrite {
            for i in 0..zip.len() {
                let entry = zip.by_index(i).map_err(zip_to_io)?;
                if entry.is_dir() {
                    continue;
                }
                let relative = enclosed_path(&entry)?;
                if fs::symlink_metadata(root.join(&relative)).is_ok() {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("{} already exists", relative.display()),
                    ));
                }
            }
        }

        for i in 0..zip.len() {
            let mut entry = zip.by_index(i).map_err(zip_to_io)?;
            let relative = enclosed_path(&entry)?;
            let target = root.join(&relative);

            if entry.is_dir() {
                remove_non_directory(&target)?;
                fs::create_dir_all(&target)?;
                continue;
            }

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
                // A symlink from an earlier entry must not lead writes outside the root.
                if !parent.canonicalize()?.starts_with(&root) {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("{} resolves outside {}", relative.display(), root.display()),
                    ));
                }
            }
            remove_non_directory(&target)?;

            if entry.is_symlink() {
                let mut link = String::new();
                entry.read_to_string(&mut link)?;
                create_symlink(&link, &target)?;
            } else {
                let mut out = File::create(&target)?;
                io::copy(&mut entry, &mut out)?;
                set_mode(&target, entry.unix_mode())?;
            }
        }

        debug!("Unpacked {} zip entries into {}", zip.len(), destination.display());
        Ok(())
    }
}

fn enclosed_path<R: Read>(entry: &ZipFile<'_, R>) -> io::Result<PathBuf> {
    entry.enclosed_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidData, format!("entry {} escapes the destination", entry.name()))
    })
}

/// Remove a file or symlink at `path` so the entry can take its place.
fn remove_non_directory(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if !meta.is_dir() => fs::remove_file(path),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn create_symlink(link: &str, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(link, target)
}

// Windows needs privileges for symlinks; store the link text as a file.
#[cfg(not(unix))]
fn create_symlink(link: &str, target: &Path) -> io::Result<()> {
    fs::write(target, link)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: Option<u32>) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    match mode {
        Some(mode) => fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777)),
        None => Ok(()),
    }
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: Option<u32>) -> io::Result<()> {
    Ok(())
}

fn zip_to_io(error: ZipError) -> io::Error {
    match error {
        ZipError::Io(e) => e,
        other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
    }
}
