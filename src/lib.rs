//! Trilium updater - fetch and install the latest Trilium Notes release
//!
//! A self-update utility for Trilium desktop installations. It asks GitHub for
//! the latest published release, picks the archive built for the running
//! operating system, downloads it, extracts it over the installation directory
//! and removes the downloaded archive.
//!
//! # Pipeline
//!
//! ```text
//! detect platform -> resolve asset -> download -> extract -> remove archive
//! ```
//!
//! Stages run strictly in sequence and the first failure ends the run. See
//! [`pipeline::Updater`].
//!
//! # Modules
//!
//! - [`platform`] - operating system detection
//! - [`release`] - GitHub release lookup and asset selection
//! - [`download`] - streaming archive download
//! - [`archive`] - `tar.xz`, `tar.gz` and `zip` extraction
//! - [`pipeline`] - the stages wired together
//! - [`config`] - configuration file and defaults
//! - [`core`] - error types and pipeline stages
//! - [`cli`] - command-line interface
//! - [`utils`] - HTTP clients and progress bars
//!
//! # Example
//!
//! ```rust,no_run
//! use trilium_updater::config::UpdaterConfig;
//! use trilium_updater::pipeline::Updater;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = UpdaterConfig {
//!     install_dir: "../".into(),
//!     ..UpdaterConfig::default()
//! };
//! let report = Updater::new(config).run().await?;
//! println!("installed {}", report.release_tag);
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod cli;
pub mod config;
pub mod core;
pub mod download;
pub mod pipeline;
pub mod platform;
pub mod release;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
