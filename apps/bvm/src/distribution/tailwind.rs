//! Tailwind CSS standalone CLI handler.
//!
//! `tailwindlabs/tailwindcss` publishes bare executables rather than
//! archives, so the downloaded file lands in the version directory under its
//! asset name and is linked as `tailwindcss`.

use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;

use super::{Distribution, DistributionHandler, bare_tag, link_into_root, table_entry, table_match};
use crate::catalog::CatalogClient;
use crate::paths::InstallRoot;
use crate::platform::Platform;
use crate::release::Release;

const OWNER: &str = "tailwindlabs";
const REPO: &str = "tailwindcss";
const PREFIX: &str = "tw-";

const ASSETS: [(Platform, &str); 4] = [
    (Platform::WindowsAmd64, "tailwindcss-windows-x64.exe"),
    (Platform::LinuxAmd64, "tailwindcss-linux-x64"),
    (Platform::LinuxAarch64, "tailwindcss-linux-arm64"),
    (Platform::MacAmd64, "tailwindcss-macos-x64"),
];

static DIRECTORY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^tw-v(\d+\.\d+\.\d+)$").expect("valid regex pattern"));

/// Handler for the Tailwind CSS CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tailwind;

#[async_trait]
impl DistributionHandler for Tailwind {
    fn distribution(&self) -> Distribution {
        Distribution::Tailwind
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
        let asset = table_entry(&ASSETS, platform)?;
        Ok(vec![paths.version_dir(directory_name).join(asset)])
    }

    fn activate(
        &self,
        paths: &InstallRoot,
        platform: Platform,
        directory_name: &str,
        _include_all: bool,
    ) -> Result<Vec<String>> {
        let link_name = format!("tailwindcss{}", platform.executable_extension());
        let mut activated = Vec::new();
        for source in self.executable_paths(paths, platform, directory_name)? {
            activated.push(link_into_root(paths, &source, Some(&link_name))?);
        }
        Ok(activated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;

    #[test]
    fn normalize_tag_and_directory_name_diverge() {
        assert_eq!(Tailwind.normalize_tag("tw-v3.4.1"), "v3.4.1");
        assert_eq!(Tailwind.normalize_tag("3.4.1"), "v3.4.1");
        assert_eq!(Tailwind.normalize_directory_name("v3.4.1"), "tw-v3.4.1");
        assert_eq!(Tailwind.normalize_directory_name("tw-v3.4.1"), "tw-v3.4.1");
    }

    #[test]
    fn platform_match_uses_raw_executable_names() {
        assert!(Tailwind.is_platform_match(Platform::LinuxAarch64, "tailwindcss-linux-arm64"));
        assert!(Tailwind.is_platform_match(
            Platform::WindowsAmd64,
            "TailwindCSS-Windows-X64.exe"
        ));
        assert!(!Tailwind.is_platform_match(Platform::MacAmd64, "tailwindcss-macos-arm64"));
    }

    #[test]
    fn executable_path_is_asset_name() {
        let paths = InstallRoot::with_root(PathBuf::from("/opt/bvm"));
        assert_eq!(
            Tailwind
                .executable_paths(&paths, Platform::MacAmd64, "tw-v3.4.1")
                .unwrap(),
            vec![PathBuf::from("/opt/bvm/tw-v3.4.1/tailwindcss-macos-x64")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn activate_links_under_generic_name() {
        let temp = TempDir::new().unwrap();
        let paths = InstallRoot::with_root(temp.path().to_path_buf());
        let exe = temp.path().join("tw-v3.4.1/tailwindcss-linux-x64");
        std::fs::create_dir_all(exe.parent().unwrap()).unwrap();
        std::fs::write(&exe, b"tw").unwrap();

        let names = Tailwind
            .activate(&paths, Platform::LinuxAmd64, "tw-v3.4.1", false)
            .unwrap();

        assert_eq!(names, ["tailwindcss"]);
        assert_eq!(
            std::fs::read_link(temp.path().join("tailwindcss")).unwrap(),
            exe
        );
    }
}
