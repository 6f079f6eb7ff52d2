//! Progress indicators for long-running operations.
//!
//! A thin wrapper over `indicatif` so every bar shares the same styling and
//! can be switched off in one place. Bars draw to stderr and never interfere
//! with the log lines written to stdout.
//!
//! Progress is hidden when the caller asks for it (`--no-progress`,
//! `TRILIUM_UPDATER_NO_PROGRESS`, `--quiet`), in which case every operation on
//! the bar is a no-op.
//!
//! # Examples
//!
//! ```rust
//! use trilium_updater::utils::progress::ProgressBar;
//!
//! let progress = ProgressBar::download(Some(1024), false);
//! progress.set_prefix("trilium-linux-x64.tar.xz");
//! progress.inc(512);
//! progress.inc(512);
//! progress.finish_and_clear();
//! ```

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};
use std::time::Duration;

/// A progress bar with consistent styling.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Create a byte-counting bar for a download.
    ///
    /// With a known length the bar shows bytes and ETA. Without one it falls
    /// back to a spinner that still counts bytes. A hidden bar draws nothing.
    #[must_use]
    pub fn download(total_bytes: Option<u64>, hidden: bool) -> Self {
        if hidden {
            return Self {
                inner: IndicatifBar::hidden(),
            };
        }

        let bar = match total_bytes {
            Some(len) => {
                let bar = IndicatifBar::new(len);
                bar.set_style(ProgressStyle::download());
                bar
            }
            None => {
                let bar = IndicatifBar::new_spinner();
                bar.set_style(ProgressStyle::bytes_spinner());
                bar.enable_steady_tick(Duration::from_millis(100));
                bar
            }
        };
        Self {
            inner: bar,
        }
    }

    /// Set the label shown before the bar.
    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.inner.set_prefix(prefix.into());
    }

    /// Advance the bar.
    pub fn inc(&self, delta: u64) {
        self.inner.inc(delta);
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    /// Remove the bar from the terminal.
    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }

    /// Stop the bar and leave it where it is, e.g. after a failure.
    pub fn abandon(&self) {
        self.inner.abandon();
    }
}

/// Predefined styles.
pub struct ProgressStyle;

impl ProgressStyle {
    /// Style for transfers with a known size.
    ///
    /// ```text
    /// trilium-linux-x64.tar.xz [━━━━━━━━━━━━━━━╸━━━━━━━━━━━━━━━━━━━━━━━━] 41.2MiB/108.6MiB (00:12)
    /// ```
    #[must_use]
    pub fn download() -> IndicatifStyle {
        IndicatifStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap_or_else(|_| IndicatifStyle::default_bar())
            .progress_chars("━╸━")
    }

    /// Style for transfers without a `Content-Length`.
    #[must_use]
    pub fn bytes_spinner() -> IndicatifStyle {
        IndicatifStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.cyan} {bytes} ({bytes_per_sec})")
            .unwrap_or_else(|_| IndicatifStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
    }
}
