//! Test fixtures for release archives and GitHub API payloads.

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde_json::json;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use xz2::write::XzEncoder;
use zip::write::SimpleFileOptions;

/// Build an uncompressed tarball holding `files` as regular files.
fn tar_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, data) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, path, *data)
            .unwrap_or_else(|e| panic!("Failed to add {path} to tarball: {e}"));
    }
    builder.into_inner().unwrap_or_else(|e| panic!("Failed to finish tarball: {e}"))
}

/// Build a `.tar.xz` archive in memory.
pub fn tar_xz_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut encoder = XzEncoder::new(Vec::new(), 6);
    encoder.write_all(&tar_bytes(files)).unwrap_or_else(|e| panic!("xz encoding failed: {e}"));
    encoder.finish().unwrap_or_else(|e| panic!("xz encoding failed: {e}"))
}

/// Build a `.tar.gz` archive in memory.
pub fn tar_gz_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar_bytes(files)).unwrap_or_else(|e| panic!("gzip encoding failed: {e}"));
    encoder.finish().unwrap_or_else(|e| panic!("gzip encoding failed: {e}"))
}

/// Build a `.zip` archive in memory.
pub fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (path, data) in files {
        writer
            .start_file(*path, SimpleFileOptions::default())
            .unwrap_or_else(|e| panic!("Failed to add {path} to zip: {e}"));
        writer.write_all(data).unwrap_or_else(|e| panic!("Failed to write {path}: {e}"));
    }
    writer.finish().unwrap_or_else(|e| panic!("Failed to finish zip: {e}")).into_inner()
}

/// Build a `.zip` shaped like a macOS `.app` bundle: a directory, an
/// executable and a `Trilium.app/Versions/Current -> A` symlink.
pub fn app_bundle_zip_bytes() -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    writer
        .add_directory("Trilium.app/Versions/A/", options)
        .unwrap_or_else(|e| panic!("Failed to add directory: {e}"));
    writer
        .start_file("Trilium.app/Versions/A/lib", options.unix_permissions(0o755))
        .unwrap_or_else(|e| panic!("Failed to add lib: {e}"));
    writer.write_all(b"framework v2").unwrap_or_else(|e| panic!("Failed to write lib: {e}"));
    writer
        .add_symlink("Trilium.app/Versions/Current", "A", options)
        .unwrap_or_else(|e| panic!("Failed to add symlink: {e}"));
    writer.finish().unwrap_or_else(|e| panic!("Failed to finish zip: {e}")).into_inner()
}

/// A release archive with a known file listing.
#[derive(Clone, Debug)]
pub struct ArchiveFixture {
    /// Asset file name, e.g. `trilium-linux-x64-0.63.7.tar.xz`
    pub name: String,
    /// Archive bytes as served by the download host
    pub bytes: Vec<u8>,
    /// Files the archive expands to
    pub files: Vec<(String, Vec<u8>)>,
}

impl ArchiveFixture {
    fn build(name: &str, files: &[(&str, &[u8])], encode: fn(&[(&str, &[u8])]) -> Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            bytes: encode(files),
            files: files.iter().map(|(p, d)| ((*p).to_string(), d.to_vec())).collect(),
        }
    }

    /// Linux desktop build (`tar.xz`)
    pub fn linux() -> Self {
        Self::build(
            "trilium-linux-x64-0.63.7.tar.xz",
            &[
                ("trilium-linux-x64/trilium", b"#!/bin/sh\necho trilium\n"),
                ("trilium-linux-x64/resources/app.asar", b"linux app v0.63.7"),
            ],
            tar_xz_bytes,
        )
    }

    /// Windows desktop build (`zip`)
    pub fn windows() -> Self {
        Self::build(
            "trilium-windows-x64-0.63.7.zip",
            &[
                ("trilium-windows-x64/trilium.exe", b"MZ trilium"),
                ("trilium-windows-x64/resources/app.asar", b"windows app v0.63.7"),
            ],
            zip_bytes,
        )
    }

    /// macOS desktop build (`zip`)
    pub fn mac() -> Self {
        Self::build(
            "trilium-mac-x64-0.63.7.zip",
            &[
                ("Trilium Notes.app/Contents/Info.plist", b"<plist/>"),
                ("Trilium Notes.app/Contents/Resources/app.asar", b"mac app v0.63.7"),
            ],
            zip_bytes,
        )
    }

    /// The build for the platform the tests run on.
    pub fn for_host() -> Self {
        if cfg!(windows) {
            Self::windows()
        } else if cfg!(target_os = "macos") {
            Self::mac()
        } else {
            Self::linux()
        }
    }

    /// Write the archive into `dir` under its asset name.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(&self.name);
        fs::write(&path, &self.bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Check that every file of the archive exists under `dir` with the right content.
    pub fn assert_extracted_in(&self, dir: &Path) {
        for (path, expected) in &self.files {
            let actual = fs::read(dir.join(path)).unwrap_or_else(|e| panic!("{path} was not extracted: {e}"));
            assert_eq!(&actual, expected, "content mismatch for {path}");
        }
    }
}

/// `releases/latest` JSON for the given asset names, ids starting at 1.
pub fn release_json(tag: &str, asset_names: &[&str]) -> String {
    let assets: Vec<_> = asset_names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            json!({
                "id": i + 1,
                "name": name,
                "browser_download_url": format!("https://github.com/zadam/trilium/releases/download/{tag}/{name}"),
                "size": 0,
                "state": "uploaded",
            })
        })
        .collect();

    json!({
        "tag_name": tag,
        "name": tag,
        "draft": false,
        "prerelease": false,
        "assets": assets,
    })
    .to_string()
}

/// The asset list of a real Trilium release, desktop and server builds mixed.
pub const TRILIUM_ASSETS: &[&str] = &[
    "trilium-linux-x64-0.63.7.tar.xz",
    "trilium-linux-x64-0.63.7.zip",
    "trilium-linux-x64-server-0.63.7.tar.xz",
    "trilium-mac-x64-0.63.7.zip",
    "trilium-windows-x64-0.63.7.zip",
];
