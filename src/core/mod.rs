//! Core types shared by every stage of the update pipeline.
//!
//! - [`error`] holds the typed [`UpdaterError`] and the user-facing [`ErrorContext`]
//! - [`Stage`] names the pipeline state the updater is in, for logging and reporting

pub mod error;

pub use error::{ErrorContext, UpdaterError, user_friendly_error};

use std::fmt;

/// Result type used throughout the library.
pub type Result<T, E = UpdaterError> = std::result::Result<T, E>;

/// Position of a run in the update state machine.
///
/// Runs move strictly forward: `Start -> PlatformDetected -> AssetResolved ->
/// Downloaded -> Extracted -> CleanedUp -> Done`. A failure at any stage ends
/// the run. When extraction is disabled the run goes from `Downloaded`
/// straight to `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing has happened yet
    Start,
    /// The platform tag is known
    PlatformDetected,
    /// A release asset was selected and its URL resolved
    AssetResolved,
    /// The archive is fully written to disk
    Downloaded,
    /// The archive contents are in the installation directory
    Extracted,
    /// The downloaded archive was removed (or removal was reported)
    CleanedUp,
    /// The run finished successfully
    Done,
}

impl Stage {
    /// Human readable description of the work that leads out of this stage.
    #[must_use]
    pub const fn next_step(self) -> &'static str {
        match self {
            Self::Start => "detecting the platform",
            Self::PlatformDetected => "resolving the release asset",
            Self::AssetResolved => "downloading the archive",
            Self::Downloaded => "extracting the archive",
            Self::Extracted => "removing the archive",
            Self::CleanedUp | Self::Done => "finishing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::PlatformDetected => "platform-detected",
            Self::AssetResolved => "asset-resolved",
            Self::Downloaded => "downloaded",
            Self::Extracted => "extracted",
            Self::CleanedUp => "cleaned-up",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}
