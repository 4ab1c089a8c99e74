//! Error types for the bvm CLI.
//!
//! Most functions return `anyhow::Result` and attach context as errors bubble
//! up. The variants of [`BvmError`] mark the failures a caller may want to
//! tell apart (an unknown distribution, a release that does not exist, an
//! inconsistent catalog) and are recovered with `downcast_ref`.

use std::path::PathBuf;
use thiserror::Error;

use crate::platform::Platform;

/// Domain errors raised by the release resolution and installation engine.
#[derive(Debug, Error)]
pub enum BvmError {
    /// The distribution identifier is not one of `bun`, `deno`, `node`
    /// (or `nodejs`) and `tailwind`.
    #[error("invalid distribution: {name}")]
    InvalidDistribution {
        /// The identifier that was rejected.
        name: String,
    },

    /// The current platform has no entry in a handler's tables.
    #[error("unsupported platform: {platform}")]
    InvalidPlatform {
        /// The platform that was rejected.
        platform: Platform,
    },

    /// The requested tag (or "latest") is absent from the catalog or from
    /// the installed set.
    #[error("version {version} not found")]
    ReleaseNotFound {
        /// The tag as it was looked up.
        version: String,
    },

    /// The release is already installed and no force flag was given.
    #[error("version {tag} already installed")]
    AlreadyInstalled {
        /// Directory name of the installed release.
        tag: String,
    },

    /// A version directory scheduled for removal does not exist.
    #[error("directory {} not found", path.display())]
    DirectoryNotFound {
        /// The directory that was expected.
        path: PathBuf,
    },

    /// More than one asset of a single catalog envelope matched the platform.
    #[error("catalog integrity error: release {tag} has {matches} assets matching the platform")]
    CatalogIntegrity {
        /// Tag of the offending envelope.
        tag: String,
        /// Number of matching assets.
        matches: usize,
    },

    /// An HTTP request completed with a non-success status.
    #[error("HTTP error {status}: {url}")]
    HttpStatus {
        /// The numeric status code.
        status: u16,
        /// The requested URL.
        url: String,
    },

    /// A config line without a `key=value` separator.
    #[error("invalid config file line: {line}")]
    ConfigParse {
        /// The offending line.
        line: String,
    },
}

impl BvmError {
    /// Creates a new `InvalidDistribution` error.
    #[must_use]
    pub fn invalid_distribution(name: impl Into<String>) -> Self {
        Self::InvalidDistribution { name: name.into() }
    }

    /// Creates a new `InvalidPlatform` error.
    #[must_use]
    pub const fn invalid_platform(platform: Platform) -> Self {
        Self::InvalidPlatform { platform }
    }

    /// Creates a new `ReleaseNotFound` error.
    #[must_use]
    pub fn release_not_found(version: impl Into<String>) -> Self {
        Self::ReleaseNotFound {
            version: version.into(),
        }
    }

    /// Creates a new `AlreadyInstalled` error.
    #[must_use]
    pub fn already_installed(tag: impl Into<String>) -> Self {
        Self::AlreadyInstalled { tag: tag.into() }
    }

    /// Creates a new `DirectoryNotFound` error.
    #[must_use]
    pub fn directory_not_found(path: impl Into<PathBuf>) -> Self {
        Self::DirectoryNotFound { path: path.into() }
    }

    /// Creates a new `CatalogIntegrity` error.
    #[must_use]
    pub fn catalog_integrity(tag: impl Into<String>, matches: usize) -> Self {
        Self::CatalogIntegrity {
            tag: tag.into(),
            matches,
        }
    }

    /// Creates a new `HttpStatus` error.
    #[must_use]
    pub fn http_status(status: u16, url: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            url: url.into(),
        }
    }

    /// Creates a new `ConfigParse` error.
    #[must_use]
    pub fn config_parse(line: impl Into<String>) -> Self {
        Self::ConfigParse { line: line.into() }
    }
}
