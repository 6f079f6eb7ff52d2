use crate::common::{MockGitHub, RELEASE_TAG, asset_id, snapshot};
use anyhow::Result;
use tempfile::TempDir;
use trilium_updater::config::UpdaterConfig;
use trilium_updater::core::UpdaterError;
use trilium_updater::pipeline::Updater;
use trilium_updater::platform::PlatformTag;
use trilium_updater::test_utils::{ArchiveFixture, TRILIUM_ASSETS, init_test_logging};

/// A full run downloads, extracts and removes the archive.
#[tokio::test]
async fn test_full_update_installs_release() -> Result<()> {
    init_test_logging(None);
    let archive = ArchiveFixture::for_host();
    let mut github = MockGitHub::start().await;
    github.serve_release(&archive, 1).await;

    let install = TempDir::new()?;
    let report = Updater::new(github.config(install.path())).run().await?;

    assert_eq!(report.platform, PlatformTag::detect());
    assert_eq!(report.release_tag, RELEASE_TAG);
    assert_eq!(report.asset_name, archive.name);
    assert_eq!(report.bytes, archive.bytes.len() as u64);
    assert!(report.extracted);
    assert!(report.archive_removed);
    assert!(report.url.ends_with(&format!("/download/{}", archive.name)));

    archive.assert_extracted_in(install.path());
    assert!(!install.path().join(&archive.name).exists(), "archive should be removed");
    github.verify().await;
    Ok(())
}

/// Running the update twice leaves the same files behind as running it once.
#[tokio::test]
async fn test_second_run_is_idempotent() -> Result<()> {
    init_test_logging(None);
    let archive = ArchiveFixture::for_host();
    let mut github = MockGitHub::start().await;
    github.serve_release(&archive, 2).await;

    let install = TempDir::new()?;
    std::fs::write(install.path().join("document.db"), b"user data")?;
    let updater = Updater::new(github.config(install.path()));

    updater.run().await?;
    let after_first = snapshot(install.path());
    updater.run().await?;
    let after_second = snapshot(install.path());

    assert_eq!(after_first, after_second);
    assert_eq!(std::fs::read(install.path().join("document.db"))?, b"user data");
    github.verify().await;
    Ok(())
}

/// Files from an older version are replaced by the new release.
#[tokio::test]
async fn test_update_overwrites_previous_version() -> Result<()> {
    let archive = ArchiveFixture::for_host();
    let mut github = MockGitHub::start().await;
    github.serve_release(&archive, 1).await;

    let install = TempDir::new()?;
    for (path, _) in &archive.files {
        let target = install.path().join(path);
        std::fs::create_dir_all(target.parent().unwrap())?;
        std::fs::write(&target, b"previous version")?;
    }

    Updater::new(github.config(install.path())).run().await?;

    archive.assert_extracted_in(install.path());
    Ok(())
}

/// With extraction disabled the run stops after the download and keeps the archive.
#[tokio::test]
async fn test_download_only_keeps_archive() -> Result<()> {
    let archive = ArchiveFixture::for_host();
    let mut github = MockGitHub::start().await;
    github.serve_release(&archive, 1).await;

    let install = TempDir::new()?;
    let config = UpdaterConfig {
        perform_extraction: false,
        ..github.config(install.path())
    };
    let report = Updater::new(config).run().await?;

    assert!(!report.extracted);
    assert!(!report.archive_removed);
    assert_eq!(report.archive_path, install.path().join(&archive.name));
    assert_eq!(std::fs::read(&report.archive_path)?, archive.bytes);
    assert_eq!(snapshot(install.path()).len(), 1, "only the archive should exist");
    Ok(())
}

/// A separate download directory holds the archive only until extraction.
#[tokio::test]
async fn test_separate_download_directory() -> Result<()> {
    let archive = ArchiveFixture::for_host();
    let mut github = MockGitHub::start().await;
    github.serve_release(&archive, 1).await;

    let install = TempDir::new()?;
    let downloads = TempDir::new()?;
    let config = UpdaterConfig {
        download_dir: Some(downloads.path().join("trilium-updates")),
        ..github.config(&install.path().join("trilium"))
    };
    let report = Updater::new(config).run().await?;

    assert_eq!(report.archive_path, downloads.path().join("trilium-updates").join(&archive.name));
    assert!(!report.archive_path.exists());
    archive.assert_extracted_in(&install.path().join("trilium"));
    Ok(())
}

/// Only server builds for this platform means there is nothing to install.
#[tokio::test]
async fn test_no_matching_asset() -> Result<()> {
    let mut github = MockGitHub::start().await;
    let server_build = format!("trilium-{}-x64-server-0.63.7.tar.xz", PlatformTag::detect());
    github.serve_assets(&[server_build.as_str(), "trilium-android-arm64.apk"]).await;

    let install = TempDir::new()?;
    let err = Updater::new(github.config(install.path())).run().await.unwrap_err();

    assert!(matches!(err, UpdaterError::AssetNotFound { .. }), "got {err:?}");
    assert!(snapshot(install.path()).is_empty());
    Ok(())
}

/// A repository without releases is reported as a service error.
#[tokio::test]
async fn test_repository_without_releases() -> Result<()> {
    let mut github = MockGitHub::start().await;
    github.fail_latest(404).await;

    let install = TempDir::new()?;
    let err = Updater::new(github.config(install.path())).run().await.unwrap_err();

    assert!(matches!(err, UpdaterError::Service { status: Some(404), .. }), "got {err:?}");
    Ok(())
}

/// A failing download host leaves no archive behind and extracts nothing.
#[tokio::test]
async fn test_failed_download_leaves_install_untouched() -> Result<()> {
    let archive = ArchiveFixture::for_host();
    let mut github = MockGitHub::start().await;
    github.serve_assets(TRILIUM_ASSETS).await;
    let id = asset_id(&archive.name);
    let location = format!("{}/download/{}", github.url(), archive.name);
    let _redirect = github
        .server
        .mock("GET", format!("/repos/zadam/trilium/releases/assets/{id}").as_str())
        .with_status(302)
        .with_header("location", &location)
        .create_async()
        .await;
    let _download = github
        .server
        .mock("GET", format!("/download/{}", archive.name).as_str())
        .with_status(503)
        .create_async()
        .await;

    let install = TempDir::new()?;
    std::fs::write(install.path().join("document.db"), b"user data")?;
    let err = Updater::new(github.config(install.path())).run().await.unwrap_err();

    assert!(matches!(err, UpdaterError::Download { .. }), "got {err:?}");
    assert_eq!(snapshot(install.path()).len(), 1);
    Ok(())
}

/// `check` resolves the asset without downloading it.
#[tokio::test]
async fn test_check_does_not_download() -> Result<()> {
    let archive = ArchiveFixture::for_host();
    let mut github = MockGitHub::start().await;
    github.serve_assets(TRILIUM_ASSETS).await;
    let id = asset_id(&archive.name);
    let location = format!("{}/download/{}", github.url(), archive.name);
    let _redirect = github
        .server
        .mock("GET", format!("/repos/zadam/trilium/releases/assets/{id}").as_str())
        .with_status(302)
        .with_header("location", &location)
        .create_async()
        .await;
    let download = github
        .server
        .mock("GET", format!("/download/{}", archive.name).as_str())
        .expect(0)
        .create_async()
        .await;

    let install = TempDir::new()?;
    let (platform, asset) = Updater::new(github.config(install.path())).check().await?;

    assert_eq!(platform, PlatformTag::detect());
    assert_eq!(asset.name, archive.name);
    assert_eq!(asset.url, location);
    download.assert_async().await;
    Ok(())
}
