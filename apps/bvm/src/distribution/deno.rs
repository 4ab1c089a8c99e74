//! Deno handler. Releases come from `denoland/deno`; each zip holds the bare
//! `deno` executable.

use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;

use super::{Distribution, DistributionHandler, bare_tag, table_entry, table_match};
use crate::catalog::CatalogClient;
use crate::paths::InstallRoot;
use crate::platform::Platform;
use crate::release::Release;

const OWNER: &str = "denoland";
const REPO: &str = "deno";
const PREFIX: &str = "deno-";

const ASSETS: [(Platform, &str); 4] = [
    (Platform::WindowsAmd64, "deno-x86_64-pc-windows-msvc.zip"),
    (Platform::LinuxAmd64, "deno-x86_64-unknown-linux-gnu.zip"),
    (Platform::LinuxAarch64, "deno-aarch64-unknown-linux-gnu.zip"),
    (Platform::MacAmd64, "deno-x86_64-apple-darwin.zip"),
];

static DIRECTORY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^deno-v(\d+\.\d+\.\d+)$").expect("valid regex pattern"));

/// Handler for Deno.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deno;

#[async_trait]
impl DistributionHandler for Deno {
    fn distribution(&self) -> Distribution {
        Distribution::Deno
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
        table_entry(&ASSETS, platform)?;
        let exe = format!("deno{}", platform.executable_extension());
        Ok(vec![paths.version_dir(directory_name).join(exe)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_tag_drops_prefix() {
        assert_eq!(Deno.normalize_tag("1.46.3"), "v1.46.3");
        assert_eq!(Deno.normalize_tag("v1.46.3"), "v1.46.3");
        assert_eq!(Deno.normalize_tag("deno-v1.46.3"), "v1.46.3");
        assert_eq!(Deno.normalize_tag("deno-1.46.3"), "v1.46.3");
    }

    #[test]
    fn directory_name_is_prefixed() {
        assert_eq!(Deno.normalize_directory_name("v1.46.3"), "deno-v1.46.3");
        assert_eq!(Deno.normalize_directory_name("1.46.3"), "deno-v1.46.3");
        assert_eq!(Deno.normalize_directory_name("deno-v1.46.3"), "deno-v1.46.3");
    }

    #[test]
    fn platform_match_uses_target_triples() {
        assert!(Deno.is_platform_match(Platform::LinuxAmd64, "deno-x86_64-unknown-linux-gnu.zip"));
        assert!(Deno.is_platform_match(Platform::MacAmd64, "DENO-X86_64-APPLE-DARWIN.ZIP"));
        assert!(!Deno.is_platform_match(Platform::MacAmd64, "deno-aarch64-apple-darwin.zip"));
        assert!(!Deno.is_platform_match(Platform::LinuxAmd64, "denort-x86_64-unknown-linux-gnu.zip"));
    }

    #[test]
    fn executable_is_at_directory_root() {
        let paths = InstallRoot::with_root(PathBuf::from("/opt/bvm"));

        assert_eq!(
            Deno.executable_paths(&paths, Platform::LinuxAarch64, "deno-v1.46.3")
                .unwrap(),
            vec![PathBuf::from("/opt/bvm/deno-v1.46.3/deno")]
        );
        assert_eq!(
            Deno.executable_paths(&paths, Platform::WindowsAmd64, "deno-v1.46.3")
                .unwrap(),
            vec![PathBuf::from("/opt/bvm/deno-v1.46.3/deno.exe")]
        );
    }
}
