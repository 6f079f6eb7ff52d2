//! Release discovery on the hosting service.
//!
//! Talks to the GitHub REST API to find the newest published release of the
//! configured repository, picks the asset built for the current platform and
//! turns it into a URL the [`Downloader`](crate::download::Downloader) can fetch.
//!
//! # Asset Selection
//!
//! Trilium publishes desktop and server builds side by side:
//!
//! ```text
//! trilium-linux-x64-0.63.7.tar.xz          <- desktop, selected on linux
//! trilium-linux-x64-server-0.63.7.tar.xz   <- server, never selected
//! trilium-windows-x64-0.63.7.zip
//! trilium-mac-x64-0.63.7.zip
//! ```
//!
//! The first asset, in the order the service lists them, whose name starts
//! with `<repo>-<platform>` and does not contain `server` wins. See
//! [`select_asset`].


use crate::config::UpdaterConfig;
use crate::core::{Result, UpdaterError};
use crate::platform::PlatformTag;
use crate::utils::http;
use reqwest::Client;
use reqwest::header::{ACCEPT, LOCATION};
use serde::Deserialize;
use tracing::{debug, info};

const GITHUB_JSON: &str = "application/vnd.github+json";
const OCTET_STREAM: &str = "application/octet-stream";

/// A published release as returned by `GET /repos/{owner}/{repo}/releases/latest`.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    /// Git tag of the release (e.g. `v0.63.7`).
    pub tag_name: String,
    /// Display name, if the release has one.
    #[serde(default)]
    pub name: Option<String>,
    /// Files attached to the release, in service order.
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// One downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    /// Numeric asset id, used to resolve the download URL.
    pub id: u64,
    /// File name of the asset.
    pub name: String,
    /// Public download page URL.
    pub browser_download_url: String,
    /// Size in bytes, when reported.
    #[serde(default)]
    pub size: u64,
}

/// The asset chosen for this platform with a fetchable URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    /// Tag of the release the asset belongs to.
    pub release_tag: String,
    /// File name of the asset; also the local archive name.
    pub name: String,
    /// URL that serves the raw bytes.
    pub url: String,
}

/// Pick the asset for `platform` out of a release's asset list.
///
/// Returns the first asset whose name starts with `"<project>-<platform>"` and
/// does not contain `"server"`. Later matches are ignored.
///
/// ```rust
/// use trilium_updater::platform::PlatformTag;
/// use trilium_updater::release::{ReleaseAsset, select_asset};
///
/// let asset = |id, name: &str| ReleaseAsset {
///     id,
///     name: name.to_string(),
///     browser_download_url: String::new(),
///     size: 0,
/// };
/// let assets = vec![
///     asset(1, "trilium-linux-x64.tar.xz"),
///     asset(2, "trilium-linux-server-x64.tar.xz"),
///     asset(3, "trilium-windows-x64.zip"),
/// ];
///
/// let chosen = select_asset(&assets, "trilium", PlatformTag::Linux).unwrap();
/// assert_eq!(chosen.name, "trilium-linux-x64.tar.xz");
/// ```
#[must_use]
pub fn select_asset<'a>(
    assets: &'a [ReleaseAsset],
    project: &str,
    platform: PlatformTag,
) -> Option<&'a ReleaseAsset> {
    let prefix = format!("{project}-{platform}");
    let mut candidates = assets
        .iter()
        .filter(|asset| asset.name.starts_with(&prefix) && !asset.name.contains("server"));

    let selected = candidates.next()?;

    let ignored: Vec<&str> = candidates.map(|asset| asset.name.as_str()).collect();
    if !ignored.is_empty() {
        debug!("Selected {} and ignored other matching assets: {}", selected.name, ignored.join(", "));
    }

    Some(selected)
}

/// Client for the release endpoints of one repository.
pub struct ReleaseClient {
    client: Client,
    no_redirect: Client,
    api_base: String,
    owner: String,
    repo: String,
}

impl ReleaseClient {
    /// Build a client for the repository named in `config`.
    pub fn new(config: &UpdaterConfig) -> Result<Self> {
        Ok(Self {
            client: http::build_client(config)?,
            no_redirect: http::build_no_redirect_client(config)?,
            api_base: config.api_base().to_string(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
        })
    }

    /// API URL of the latest release.
    #[must_use]
    pub fn latest_release_url(&self) -> String {
        format!("{}/repos/{}/{}/releases/latest", self.api_base, self.owner, self.repo)
    }

    /// API URL of a single release asset.
    #[must_use]
    pub fn asset_url(&self, asset_id: u64) -> String {
        format!("{}/repos/{}/{}/releases/assets/{asset_id}", self.api_base, self.owner, self.repo)
    }

    /// Fetch the most recent published release.
    ///
    /// # Errors
    ///
    /// - [`UpdaterError::Network`] when the API cannot be reached
    /// - [`UpdaterError::Service`] on a non-2xx answer (404 when the
    ///   repository has no release) or an undecodable body
    pub async fn latest_release(&self) -> Result<Release> {
        let url = self.latest_release_url();
        debug!("GET {url}");

        let response = self.client.get(&url).header(ACCEPT, GITHUB_JSON).send().await.map_err(
            |source| UpdaterError::Network {
                url: url.clone(),
                source,
            },
        )?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpdaterError::Service {
                url,
                status: Some(status.as_u16()),
                reason: format!("HTTP {status}{}", github_message(&body)),
            });
        }

        response.json::<Release>().await.map_err(|e| UpdaterError::Service {
            url,
            status: Some(status.as_u16()),
            reason: format!("unexpected release payload: {e}"),
        })
    }

    /// Turn an asset into a URL that serves its raw bytes.
    ///
    /// GitHub answers the asset endpoint with a redirect to short-lived storage
    /// when asked for `application/octet-stream`. The redirect target is
    /// returned. A direct 2xx answer means the endpoint serves the bytes
    /// itself, so the endpoint URL is returned.
    pub async fn resolve_download_url(&self, asset: &ReleaseAsset) -> Result<String> {
        let url = self.asset_url(asset.id);
        debug!("GET {url} (resolving download location)");

        let response = self.no_redirect.get(&url).header(ACCEPT, OCTET_STREAM).send().await.map_err(
            |source| UpdaterError::Network {
                url: url.clone(),
                source,
            },
        )?;

        let status = response.status();
        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .ok_or_else(|| UpdaterError::Service {
                    url: url.clone(),
                    status: Some(status.as_u16()),
                    reason: "redirect without a usable Location header".to_string(),
                })?;

            let resolved = response.url().join(location).map_err(|e| UpdaterError::Service {
                url: url.clone(),
                status: Some(status.as_u16()),
                reason: format!("invalid redirect target '{location}': {e}"),
            })?;
            return Ok(resolved.to_string());
        }

        if status.is_success() {
            return Ok(url);
        }

        let body = response.text().await.unwrap_or_default();
        Err(UpdaterError::Service {
            url,
            status: Some(status.as_u16()),
            reason: format!("HTTP {status}{}", github_message(&body)),
        })
    }

    /// Find the latest release asset for `platform` and resolve its URL.
    ///
    /// # Errors
    ///
    /// Besides the errors of [`latest_release`](Self::latest_release) and
    /// [`resolve_download_url`](Self::resolve_download_url), fails with
    /// [`UpdaterError::AssetNotFound`] when no asset matches.
    pub async fn resolve_asset(&self, platform: PlatformTag) -> Result<ResolvedAsset> {
        info!("Fetching latest release asset list...");
        let release = self.latest_release().await?;
        debug!(
            "Latest release {} lists {} asset(s)",
            release.tag_name,
            release.assets.len()
        );

        info!("Looking for relevant asset...");
        let asset = select_asset(&release.assets, &self.repo, platform).ok_or_else(|| {
            UpdaterError::AssetNotFound {
                project: self.repo.clone(),
                platform: platform.to_string(),
            }
        })?;
        info!("Found {} in release {}", asset.name, release.tag_name);

        info!("Getting download url");
        let url = self.resolve_download_url(asset).await?;

        let name = asset.name.clone();
        Ok(ResolvedAsset {
            release_tag: release.tag_name,
            name,
            url,
        })
    }
}

/// Extract GitHub's `{"message": ...}` error text, formatted as a suffix.
fn github_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .map(|message| format!(": {message}"))
        .unwrap_or_default()
}
