//! Common test utilities for the trilium-updater integration tests
//!
//! Wraps a `mockito` server that plays both the GitHub API and the download
//! host, so a whole update can run against localhost.

// Not every test file uses every helper
#![allow(dead_code)]

use mockito::{Mock, Server, ServerGuard};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use trilium_updater::config::UpdaterConfig;
use trilium_updater::test_utils::{ArchiveFixture, TRILIUM_ASSETS, release_json};

/// Release tag served by [`MockGitHub`].
pub const RELEASE_TAG: &str = "v0.63.7";

const LATEST_PATH: &str = "/repos/zadam/trilium/releases/latest";

/// A fake GitHub serving one release of `zadam/trilium`.
pub struct MockGitHub {
    pub server: ServerGuard,
    mocks: Vec<Mock>,
}

impl MockGitHub {
    /// Start a server for async tests.
    pub async fn start() -> Self {
        Self {
            server: Server::new_async().await,
            mocks: Vec::new(),
        }
    }

    /// Start a server for blocking tests (e.g. ones spawning the binary).
    pub fn start_blocking() -> Self {
        Self {
            server: Server::new(),
            mocks: Vec::new(),
        }
    }

    /// Base URL to use as `api_url`.
    pub fn url(&self) -> String {
        self.server.url()
    }

    /// Updater configuration pointing at this server and installing into `install_dir`.
    pub fn config(&self, install_dir: &Path) -> UpdaterConfig {
        UpdaterConfig {
            api_url: self.url(),
            install_dir: install_dir.to_path_buf(),
            ..UpdaterConfig::default()
        }
    }

    /// Serve the full Trilium asset list, with `archive` as the downloadable
    /// build for its asset name. Expects `runs` complete update runs.
    pub async fn serve_release(&mut self, archive: &ArchiveFixture, runs: usize) {
        let id = asset_id(&archive.name);
        let download_path = format!("/download/{}", archive.name);
        let location = format!("{}{download_path}", self.url());

        let latest = self
            .server
            .mock("GET", LATEST_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(release_json(RELEASE_TAG, TRILIUM_ASSETS))
            .expect(runs)
            .create_async()
            .await;
        let redirect = self
            .server
            .mock("GET", format!("/repos/zadam/trilium/releases/assets/{id}").as_str())
            .with_status(302)
            .with_header("location", &location)
            .expect(runs)
            .create_async()
            .await;
        let download = self
            .server
            .mock("GET", download_path.as_str())
            .with_status(200)
            .with_header("content-type", "application/octet-stream")
            .with_body(&archive.bytes)
            .expect(runs)
            .create_async()
            .await;

        self.mocks.extend([latest, redirect, download]);
    }

    /// Blocking variant of [`serve_release`](Self::serve_release).
    pub fn serve_release_blocking(&mut self, archive: &ArchiveFixture) {
        let id = asset_id(&archive.name);
        let download_path = format!("/download/{}", archive.name);
        let location = format!("{}{download_path}", self.url());

        let latest = self
            .server
            .mock("GET", LATEST_PATH)
            .with_status(200)
            .with_body(release_json(RELEASE_TAG, TRILIUM_ASSETS))
            .create();
        let redirect = self
            .server
            .mock("GET", format!("/repos/zadam/trilium/releases/assets/{id}").as_str())
            .with_status(302)
            .with_header("location", &location)
            .create();
        let download = self
            .server
            .mock("GET", download_path.as_str())
            .with_status(200)
            .with_body(&archive.bytes)
            .create();

        self.mocks.extend([latest, redirect, download]);
    }

    /// Serve a release whose assets are exactly `names`.
    pub async fn serve_assets(&mut self, names: &[&str]) {
        let mock = self
            .server
            .mock("GET", LATEST_PATH)
            .with_status(200)
            .with_body(release_json(RELEASE_TAG, names))
            .create_async()
            .await;
        self.mocks.push(mock);
    }

    /// Answer the latest-release endpoint with `status`.
    pub async fn fail_latest(&mut self, status: usize) {
        let mock = self
            .server
            .mock("GET", LATEST_PATH)
            .with_status(status)
            .with_body(r#"{"message":"Not Found"}"#)
            .create_async()
            .await;
        self.mocks.push(mock);
    }

    /// Blocking variant of [`fail_latest`](Self::fail_latest).
    pub fn fail_latest_blocking(&mut self, status: usize) {
        let mock = self
            .server
            .mock("GET", LATEST_PATH)
            .with_status(status)
            .with_body(r#"{"message":"Not Found"}"#)
            .create();
        self.mocks.push(mock);
    }

    /// Check that every mock was hit as often as expected.
    pub async fn verify(&self) {
        for mock in &self.mocks {
            mock.assert_async().await;
        }
    }
}

/// Asset id that [`release_json`] assigns to `name`.
pub fn asset_id(name: &str) -> usize {
    TRILIUM_ASSETS
        .iter()
        .position(|asset| *asset == name)
        .map(|i| i + 1)
        .unwrap_or_else(|| panic!("{name} is not part of the mock release"))
}

/// Relative path -> content for every file below `root`.
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, Vec<u8>>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let relative = path.strip_prefix(root).unwrap().to_path_buf();
                out.insert(relative, fs::read(&path).unwrap());
            }
        }
    }

    let mut out = BTreeMap::new();
    walk(root, root, &mut out);
    out
}

/// Write an empty configuration file so tests never pick up the user's own.
pub fn empty_config(dir: &Path) -> PathBuf {
    let path = dir.join("updater.toml");
    fs::write(&path, "").unwrap();
    path
}
