//! Tarball extraction (xz and gzip).

use super::Extractor;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use tar::Archive;
use tracing::debug;
use xz2::read::XzDecoder;

/// Compression wrapped around the tar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TarCompression {
    /// `.tar.xz`
    Xz,
    /// `.tar.gz`
    Gzip,
}

/// Extracts compressed tarballs.
#[derive(Debug, Clone, Copy)]
pub struct TarExtractor {
    compression: TarCompression,
    overwrite: bool,
}

impl TarExtractor {
    /// Create an extractor for the given compression.
    #[must_use]
    pub const fn new(compression: TarCompression, overwrite: bool) -> Self {
        Self {
            compression,
            overwrite,
        }
    }

    fn unpack<R: Read>(&self, reader: R, destination: &Path) -> io::Result<()> {
        let mut archive = Archive::new(reader);
        archive.set_overwrite(self.overwrite);
        archive.set_preserve_permissions(true);
        archive.set_preserve_mtime(true);

        let mut count = 0usize;
        for entry in archive.entries()? {
            let mut entry = entry?;
            let path = entry.path()?.into_owned();
            if !entry.unpack_in(destination)? {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("entry '{}' escapes the installation directory", path.display()),
                ));
            }
            count += 1;
        }

        debug!("Unpacked {count} tar entries into {}", destination.display());
        Ok(())
    }
}

impl Extractor for TarExtractor {
    fn extract(&self, archive: &Path, destination: &Path) -> io::Result<()> {
        let file = BufReader::new(File::open(archive)?);
        match self.compression {
            TarCompression::Xz => self.unpack(XzDecoder::new(file), destination),
            TarCompression::Gzip => self.unpack(GzDecoder::new(file), destination),
        }
    }
}
