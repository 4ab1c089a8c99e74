//! Bun handler. Releases come from `oven-sh/bun` as one zip per platform,
//! each holding a single folder with the `bun` executable.

use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;

use super::{Distribution, DistributionHandler, prefixed_tag, table_entry, table_match};
use crate::catalog::CatalogClient;
use crate::paths::InstallRoot;
use crate::platform::Platform;
use crate::release::Release;

const OWNER: &str = "oven-sh";
const REPO: &str = "bun";
const PREFIX: &str = "bun-";

const ASSETS: [(Platform, &str); 4] = [
    (Platform::WindowsAmd64, "bun-windows-x64.zip"),
    (Platform::LinuxAmd64, "bun-linux-x64.zip"),
    (Platform::LinuxAarch64, "bun-linux-aarch64.zip"),
    (Platform::MacAmd64, "bun-darwin-x64.zip"),
];

/// Folder inside the zip that holds the executable.
const ARCHIVE_ROOTS: [(Platform, &str); 4] = [
    (Platform::WindowsAmd64, "bun-windows-x64"),
    (Platform::LinuxAmd64, "bun-linux-x64"),
    (Platform::LinuxAarch64, "bun-linux-aarch64"),
    (Platform::MacAmd64, "bun-darwin-x64"),
];

static DIRECTORY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^bun-v(\d+\.\d+\.\d+)$").expect("valid regex pattern"));

/// Handler for Bun.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bun;

#[async_trait]
impl DistributionHandler for Bun {
    fn distribution(&self) -> Distribution {
        Distribution::Bun
    }

    async fn retrieve_releases(
        &self,
        client: &CatalogClient,
        platform: Platform,
        _registry: Option<&str>,
    ) -> Result<Vec<Release>> {
        client
            .retrieve_releases(OWNER, REPO, |name| self.is_platform_match(platform, name))
            .await
    }

    fn is_platform_match(&self, platform: Platform, asset_name: &str) -> bool {
        table_match(&ASSETS, platform, asset_name)
    }

    fn normalize_tag(&self, raw: &str) -> String {
        prefixed_tag(raw, PREFIX)
    }

    fn normalize_directory_name(&self, tag: &str) -> String {
        self.normalize_tag(tag)
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
        let root = table_entry(&ARCHIVE_ROOTS, platform)?;
        let exe = format!("bun{}", platform.executable_extension());
        Ok(vec![paths.version_dir(directory_name).join(root).join(exe)])
    }
}
