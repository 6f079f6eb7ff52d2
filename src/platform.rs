//! Platform detection for release asset selection.
//!
//! Trilium names its release archives `trilium-<platform>-<arch>-<version>.<ext>`
//! where `<platform>` is one of `windows`, `mac` or `linux`. This module maps the
//! host operating system onto that tag.

use std::fmt;
use tracing::info;

/// Operating system tag as it appears in release asset names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformTag {
    /// Microsoft Windows
    Windows,
    /// macOS
    Mac,
    /// Linux and any operating system without a dedicated build
    Linux,
}

impl PlatformTag {
    /// Detect the platform of the running process.
    ///
    /// Never fails: operating systems without a dedicated build fall back to
    /// [`PlatformTag::Linux`].
    #[must_use]
    pub fn detect() -> Self {
        let platform = Self::from_os(std::env::consts::OS);
        match platform {
            Self::Windows => info!("Windows OS detected"),
            Self::Mac => info!("macOS detected"),
            Self::Linux => info!("Linux detected"),
        }
        platform
    }

    /// Map an operating system identifier to a platform tag.
    ///
    /// Accepts the values of [`std::env::consts::OS`] and the `darwin` alias.
    ///
    /// ```rust
    /// use trilium_updater::platform::PlatformTag;
    ///
    /// assert_eq!(PlatformTag::from_os("windows"), PlatformTag::Windows);
    /// assert_eq!(PlatformTag::from_os("macos"), PlatformTag::Mac);
    /// assert_eq!(PlatformTag::from_os("freebsd"), PlatformTag::Linux);
    /// ```
    #[must_use]
    pub fn from_os(os: &str) -> Self {
        match os {
            "windows" => Self::Windows,
            "macos" | "darwin" => Self::Mac,
            _ => Self::Linux,
        }
    }

    /// The tag used in asset names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Mac => "mac",
            Self::Linux => "linux",
        }
    }
}

impl fmt::Display for PlatformTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
