//! Release and catalog record types.
//!
//! A [`Release`] is what the rest of bvm works with. It comes either from a
//! remote catalog, in which case it carries a download URL and real
//! timestamps, or from an installed directory, in which case the name and tag
//! are the directory name and the timestamps are meaningless.
//!
//! [`ReleaseEnvelope`] and [`Asset`] mirror the GitHub releases API payload:
//!
//! ```json
//! [
//!   {
//!     "name": "bun v1.0.0",
//!     "tag_name": "bun-v1.0.0",
//!     "prerelease": false,
//!     "draft": false,
//!     "created_at": "2025-01-17T15:35:19Z",
//!     "published_at": "2025-01-17T15:35:19Z",
//!     "assets": [
//!       {
//!         "name": "bun-linux-x64.zip",
//!         "browser_download_url": "https://github.com/.../bun-linux-x64.zip",
//!         "created_at": "2025-01-17T15:35:19Z",
//!         "updated_at": "2025-01-17T15:35:19Z",
//!         "size": 12345,
//!         "content_type": "application/zip",
//!         "state": "uploaded"
//!       }
//!     ]
//!   }
//! ]
//! ```
//!
//! The API sends `null` for unset strings (a release without a title has
//! `"name": null`); those decode to empty strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A release of one distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// Display name.
    pub name: String,
    /// Source-provided version identifier.
    pub tag_name: String,
    /// Artifact URL; empty for installed releases.
    pub download_url: String,
    /// Creation time of the matched asset.
    pub created_at: DateTime<Utc>,
    /// Last update time of the matched asset.
    pub updated_at: DateTime<Utc>,
}

impl Release {
    /// Builds a release from catalog metadata.
    #[must_use]
    pub fn remote(
        name: impl Into<String>,
        tag_name: impl Into<String>,
        download_url: impl Into<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            tag_name: tag_name.into(),
            download_url: download_url.into(),
            created_at,
            updated_at,
        }
    }

    /// Synthesizes a release for an installed directory.
    #[must_use]
    pub fn local(directory_name: impl Into<String>) -> Self {
        let tag_name = directory_name.into();
        Self {
            name: tag_name.clone(),
            tag_name,
            download_url: String::new(),
            created_at: DateTime::default(),
            updated_at: DateTime::default(),
        }
    }

    /// Returns whether this release was synthesized from the install root.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.download_url.is_empty()
    }

    /// Last path segment of the download URL.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.download_url
            .rsplit('/')
            .next()
            .unwrap_or(&self.download_url)
    }
}

/// One downloadable file attached to a catalog envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Asset {
    /// File name, matched against the handler's platform table.
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// Direct download URL.
    #[serde(deserialize_with = "null_as_default")]
    pub browser_download_url: String,
    /// Upload time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Size in bytes.
    pub size: u64,
    /// MIME type reported by the catalog.
    #[serde(deserialize_with = "null_as_default")]
    pub content_type: String,
    /// Upload state (`uploaded`, `open`).
    #[serde(deserialize_with = "null_as_default")]
    pub state: String,
}

/// One release record of a GitHub-style catalog page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseEnvelope {
    /// Display name.
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// Tag the release was cut from.
    #[serde(deserialize_with = "null_as_default")]
    pub tag_name: String,
    /// Pre-release flag.
    pub prerelease: bool,
    /// Draft flag.
    pub draft: bool,
    /// Downloadable files.
    pub assets: Vec<Asset>,
    /// Creation time of the release.
    pub created_at: DateTime<Utc>,
    /// Publication time, absent for drafts.
    pub published_at: Option<DateTime<Utc>>,
}

/// Decodes `null` as the type's default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
