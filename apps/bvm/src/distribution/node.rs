//! Node.js handler.
//!
//! Node has no release API with asset lists. Releases are read from the
//! `{registry}/dist` directory listing, one line per version:
//!
//! ```text
//! <a href="v20.11.0/">v20.11.0/</a>                                         09-Jan-2024 23:03                   -
//! ```
//!
//! and the download URL is computed from the tag and platform. Because there
//! are no assets, every asset name is considered a platform match.
//!
//! Archives keep their top-level folder (`node-v20.11.0-linux-x64/`), so the
//! executables live under `{dir}/{dir}-{platform suffix}`.

use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

use super::{Distribution, DistributionHandler, bare_tag, link_into_root, table_entry};
use crate::activation;
use crate::catalog::CatalogClient;
use crate::paths::InstallRoot;
use crate::platform::Platform;
use crate::release::Release;

/// Default download host.
pub const DEFAULT_REGISTRY: &str = "https://nodejs.org";

const PREFIX: &str = "node-";

/// Archive file name suffix per platform, after `node-{tag}-`.
const ARCHIVE_SUFFIXES: [(Platform, &str); 4] = [
    (Platform::WindowsAmd64, "win-x64.zip"),
    (Platform::LinuxAmd64, "linux-x64.tar.gz"),
    (Platform::LinuxAarch64, "linux-arm64.tar.gz"),
    (Platform::MacAmd64, "darwin-x64.tar.gz"),
];

/// Top-level archive folder suffix per platform, after `node-{tag}-`.
const ROOT_SUFFIXES: [(Platform, &str); 4] = [
    (Platform::WindowsAmd64, "win-x64"),
    (Platform::LinuxAmd64, "linux-x64"),
    (Platform::LinuxAarch64, "linux-arm64"),
    (Platform::MacAmd64, "darwin-x64"),
];

/// Listing timestamp styles, nodejs.org's first. Mirrors vary.
const TIMESTAMP_FORMATS: [&str; 3] = ["%d-%b-%Y %H:%M", "%Y-%m-%d %H:%M", "%d-%m-%Y %H:%M"];

static LISTING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a href="(v\d+\.\d+\.\d+)/">(v\d+\.\d+\.\d+)/</a>\s+([\w-]+\s+\d+:\d+)\s+-"#)
        .expect("valid regex pattern")
});

static DIRECTORY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^node-v(\d+\.\d+\.\d+)$").expect("valid regex pattern"));

/// Handler for Node.js.
#[derive(Debug, Clone, Copy, Default)]
pub struct Node;

impl Node {
    /// Folder inside a version directory that holds the unpacked archive.
    fn archive_root(
        paths: &InstallRoot,
        platform: Platform,
        directory_name: &str,
    ) -> Result<PathBuf> {
        let suffix = table_entry(&ROOT_SUFFIXES, platform)?;
        Ok(paths
            .version_dir(directory_name)
            .join(format!("{directory_name}-{suffix}")))
    }

    /// Entries of `bin/` inside the unpacked archive, sorted by name.
    fn bin_entries(
        paths: &InstallRoot,
        platform: Platform,
        directory_name: &str,
    ) -> Result<Vec<PathBuf>> {
        let bin = Self::archive_root(paths, platform, directory_name)?.join("bin");
        let mut entries = std::fs::read_dir(&bin)
            .with_context(|| format!("Failed to read directory: {}", bin.display()))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()
            .with_context(|| format!("Failed to read directory entry in {}", bin.display()))?;
        entries.sort();
        Ok(entries)
    }
}

/// Parses the `/dist` listing into releases for `platform`.
///
/// A line whose timestamp matches none of the known styles still yields a
/// release, stamped with the zero time.
///
/// # Errors
///
/// Returns an error if the platform has no Node build.
pub fn parse_listing(listing: &str, registry: &str, platform: Platform) -> Result<Vec<Release>> {
    let suffix = table_entry(&ARCHIVE_SUFFIXES, platform)?;
    let registry = registry.trim().trim_end_matches('/');

    let mut releases = Vec::new();
    for line in listing.lines() {
        let Some(captures) = LISTING_PATTERN.captures(line) else {
            continue;
        };
        let tag = &captures[1];
        let name = &captures[2];
        let stamp = &captures[3];

        let timestamp = parse_timestamp(stamp).unwrap_or_else(|| {
            tracing::debug!("Unrecognized timestamp {stamp:?} for Node {tag}");
            DateTime::default()
        });

        let url = format!("{registry}/dist/{tag}/node-{tag}-{suffix}");
        releases.push(Release::remote(name, tag, url, timestamp, timestamp));
    }

    Ok(releases)
}

fn parse_timestamp(stamp: &str) -> Option<DateTime<Utc>> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(stamp, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[async_trait]
impl DistributionHandler for Node {
    fn distribution(&self) -> Distribution {
        Distribution::Node
    }

    async fn retrieve_releases(
        &self,
        client: &CatalogClient,
        platform: Platform,
        registry: Option<&str>,
    ) -> Result<Vec<Release>> {
        let registry = registry
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(DEFAULT_REGISTRY);
        let url = format!("{}/dist", registry.trim().trim_end_matches('/'));
        let listing = client.get_text(&url).await?;
        parse_listing(&listing, registry, platform)
    }

    fn is_platform_match(&self, _platform: Platform, _asset_name: &str) -> bool {
        true
    }

    fn normalize_tag(&self, raw: &str) -> String {
        bare_tag(raw, PREFIX)
    }

    fn normalize_directory_name(&self, tag: &str) -> String {
        format!("{PREFIX}{}", self.normalize_tag(tag))
    }

    fn directory_pattern(&self) -> &'static Regex {
        &DIRECTORY_PATTERN
    }

    fn executable_paths(
        &self,
        paths: &InstallRoot,
        platform: Platform,
        directory_name: &str,
    ) -> Result<Vec<PathBuf>> {
        if platform.is_windows() {
            let root = Self::archive_root(paths, platform, directory_name)?;
            return Ok(vec![root.join("node.exe")]);
        }
        Self::bin_entries(paths, platform, directory_name)
    }

    fn activate(
        &self,
        paths: &InstallRoot,
        platform: Platform,
        directory_name: &str,
        include_all: bool,
    ) -> Result<Vec<String>> {
        let mut activated = Vec::new();

        if platform.is_windows() && include_all {
            let root = Self::archive_root(paths, platform, directory_name)?;
            let entries = std::fs::read_dir(&root)
                .with_context(|| format!("Failed to read directory: {}", root.display()))?;
            for entry in entries {
                let entry = entry.context("Failed to read directory entry")?;
                let name = entry.file_name();
                let Some(name) = name.to_str() else {
                    continue;
                };
                if name == "node.exe" {
                    continue;
                }
                activation::copy_only(&entry.path(), &paths.link_path(name))?;
                activated.push(name.to_string());
            }
        }

        for source in self.executable_paths(paths, platform, directory_name)? {
            activated.push(link_into_root(paths, &source, None)?);
        }

        Ok(activated)
    }
}
