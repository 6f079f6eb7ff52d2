//! Error handling for the Trilium updater
//!
//! The error system follows two rules:
//! 1. **Strongly-typed errors** ([`UpdaterError`]) for programmatic callers of the library
//! 2. **User-friendly messages** ([`ErrorContext`]) with actionable suggestions for the CLI
//!
//! # Error Categories
//!
//! - **Hosting service**: [`UpdaterError::Network`], [`UpdaterError::Service`],
//!   [`UpdaterError::AssetNotFound`]
//! - **Transfer**: [`UpdaterError::Download`]
//! - **Local storage**: [`UpdaterError::Filesystem`]
//! - **Archives**: [`UpdaterError::UnsupportedFormat`], [`UpdaterError::Extraction`]
//! - **Run control**: [`UpdaterError::Config`], [`UpdaterError::Cancelled`]
//!
//! Every error is fatal to the pipeline. There is no retry and no rollback of
//! an extraction that already happened.
//!
//! # Examples
//!
//! ```rust,no_run
//! use trilium_updater::core::{UpdaterError, user_friendly_error};
//!
//! let err = UpdaterError::AssetNotFound {
//!     project: "trilium".to_string(),
//!     platform: "linux".to_string(),
//! };
//! user_friendly_error(anyhow::Error::from(err)).display();
//! ```

use colored::Colorize;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Every failure the update pipeline can report.
#[derive(Error, Debug)]
pub enum UpdaterError {
    /// The hosting service or a download host could not be reached at all.
    #[error("Network error while contacting {url}")]
    Network {
        /// The URL that was being requested
        url: String,
        /// Transport-level cause
        #[source]
        source: reqwest::Error,
    },

    /// The hosting service answered, but with an error or an unusable response.
    ///
    /// A repository without any published release surfaces here as a 404.
    #[error("Release service error for {url}: {reason}")]
    Service {
        /// The API URL that was requested
        url: String,
        /// HTTP status, when the failure came from a response
        status: Option<u16>,
        /// What was wrong with the response
        reason: String,
    },

    /// No asset of the latest release matches `<project>-<platform>` (excluding server builds).
    #[error("No release asset found for project '{project}' on platform '{platform}'")]
    AssetNotFound {
        /// Repository name used as the asset prefix
        project: String,
        /// Platform tag used as the second part of the prefix
        platform: String,
    },

    /// The archive download itself failed (non-2xx status or broken transfer).
    #[error("Failed to download {url}: {reason}")]
    Download {
        /// Download URL
        url: String,
        /// Status line or transport failure description
        reason: String,
    },

    /// Creating, writing or deleting a local file failed.
    #[error("Failed to {operation} {}", path.display())]
    Filesystem {
        /// Short verb phrase, e.g. "create" or "remove"
        operation: String,
        /// The file involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The archive extension is not one of the supported formats.
    #[error("Unsupported archive format: {file}")]
    UnsupportedFormat {
        /// The file name whose extension was not recognised
        file: String,
    },

    /// The archive exists but could not be fully extracted.
    #[error("Failed to extract {}", archive.display())]
    Extraction {
        /// Archive being extracted
        archive: PathBuf,
        /// Underlying cause (corrupt data, disk full, permission denied, ...)
        #[source]
        source: io::Error,
    },

    /// The configuration file is unreadable or holds invalid values.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// The run was interrupted before it finished.
    #[error("Update cancelled")]
    Cancelled,

    /// Anything that does not fit the categories above.
    #[error("{message}")]
    Other {
        /// Full error message including its cause chain
        message: String,
    },
}

impl UpdaterError {
    /// Shorthand for a [`UpdaterError::Filesystem`] error.
    pub fn filesystem(
        operation: impl Into<String>,
        path: impl Into<PathBuf>,
        source: io::Error,
    ) -> Self {
        Self::Filesystem {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Shorthand for a [`UpdaterError::Extraction`] error.
    pub fn extraction(archive: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Extraction {
            archive: archive.into(),
            source,
        }
    }
}

/// An [`UpdaterError`] enriched with a suggestion and details for the terminal.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: UpdaterError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context with no suggestion or details.
    #[must_use]
    pub const fn new(error: UpdaterError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Attach a suggestion for resolving the error.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach extra detail about what went wrong.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colours.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] suitable for showing to the user.
///
/// Known [`UpdaterError`]s get tailored suggestions. Anything else is wrapped
/// in [`UpdaterError::Other`] with the full cause chain, so nothing is lost.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let chain = cause_chain(&error);

    match error.downcast::<UpdaterError>() {
        Ok(updater_error) => {
            let context = create_error_context(updater_error);
            if context.details.is_none() && !chain.is_empty() {
                context.with_details(chain)
            } else {
                context
            }
        }
        Err(error) => {
            let permission_denied = error
                .downcast_ref::<io::Error>()
                .is_some_and(|io_error| io_error.kind() == io::ErrorKind::PermissionDenied);
            if permission_denied {
                return ErrorContext::new(UpdaterError::Other {
                    message: error.to_string(),
                })
                .with_suggestion(
                    "Check that you can write to the installation directory, or run with elevated permissions",
                );
            }

            let mut message = error.to_string();
            if !chain.is_empty() {
                message.push_str("\n\n");
                message.push_str(&chain);
            }
            ErrorContext::new(UpdaterError::Other {
                message,
            })
        }
    }
}

fn cause_chain(error: &anyhow::Error) -> String {
    let causes: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
    if causes.is_empty() {
        return String::new();
    }

    let mut message = String::from("Caused by:");
    for (i, cause) in causes.iter().enumerate() {
        message.push_str(&format!("\n  {}: {}", i + 1, cause));
    }
    message
}

fn create_error_context(error: UpdaterError) -> ErrorContext {
    match &error {
        UpdaterError::Network { .. } => ErrorContext::new(error)
            .with_suggestion("Check your internet connection and any proxy settings, then run the updater again"),

        UpdaterError::Service { status: Some(404), .. } => ErrorContext::new(error)
            .with_suggestion("Verify the repository owner and name; the project may have no published release yet"),

        UpdaterError::Service { status: Some(403 | 429), .. } => ErrorContext::new(error)
            .with_suggestion("The GitHub API rate limit may have been reached. Wait a while and try again"),

        UpdaterError::Service { .. } => ErrorContext::new(error)
            .with_suggestion("The release service returned an unexpected response. Try again later"),

        UpdaterError::AssetNotFound { project, platform } => {
            let details = format!(
                "Assets are matched by the prefix '{project}-{platform}'; server builds are skipped"
            );
            ErrorContext::new(error)
                .with_suggestion("The latest release may not ship a build for this platform yet")
                .with_details(details)
        }

        UpdaterError::Download { .. } => ErrorContext::new(error)
            .with_suggestion("Run the updater again; if it keeps failing, download the release manually"),

        UpdaterError::Filesystem { source, .. }
            if source.kind() == io::ErrorKind::PermissionDenied =>
        {
            ErrorContext::new(error)
                .with_suggestion("Check ownership of the installation directory or run with elevated permissions")
        }

        UpdaterError::Filesystem { .. } => ErrorContext::new(error)
            .with_suggestion("Check that the directory exists and that there is enough free disk space"),

        UpdaterError::UnsupportedFormat { .. } => ErrorContext::new(error)
            .with_suggestion("Supported archives are .tar.xz, .tar.gz and .zip")
            .with_details("The release asset name decides which extractor is used"),

        UpdaterError::Extraction { source, .. } => {
            let details = format!("Underlying cause: {source}");
            ErrorContext::new(error)
                .with_suggestion("The download may be corrupt. Run the updater again")
                .with_details(details)
        }

        UpdaterError::Config { .. } => ErrorContext::new(error)
            .with_suggestion("Fix the configuration file or remove it to fall back to the defaults"),

        UpdaterError::Cancelled | UpdaterError::Other { .. } => ErrorContext::new(error),
    }
}
