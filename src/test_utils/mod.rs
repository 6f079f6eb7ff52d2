//! Test utilities for the Trilium updater
//!
//! Helpers shared by unit tests and the integration test suite: in-memory
//! release archives, GitHub API payloads and one-time logging setup.
//!
//! Available under `cfg(test)` and with the `test-utils` feature, which the
//! integration tests enable through the self dev-dependency.
//!
//! # Example
//!
//! ```rust,ignore
//! use trilium_updater::test_utils::{ArchiveFixture, release_json};
//!
//! let archive = ArchiveFixture::linux();
//! let body = release_json("v0.63.7", &[archive.name.as_str()]);
//! assert!(body.contains("trilium-linux-x64"));
//! ```

pub mod fixtures;

pub use fixtures::{ArchiveFixture, app_bundle_zip_bytes, TRILIUM_ASSETS, release_json, tar_gz_bytes, tar_xz_bytes, zip_bytes};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, tests run without a subscriber.
///
/// ```bash
/// RUST_LOG=trilium_updater=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
