//! Distribution handlers.
//!
//! Each supported runtime has a handler that knows where its releases are
//! published, which artifact fits each platform, how its tags and install
//! directories are named, and which executables to activate. Handlers are
//! stateless unit structs reached through [`handler_for`].
//!
//! Tags and directory names follow different conventions on purpose:
//!
//! | Distribution | `normalize_tag("1.2.3")` | directory name |
//! |--------------|--------------------------|----------------|
//! | Bun          | `bun-v1.2.3`             | `bun-v1.2.3`   |
//! | Deno         | `v1.2.3`                 | `deno-v1.2.3`  |
//! | Node         | `v1.2.3`                 | `node-v1.2.3`  |
//! | Tailwind     | `v1.2.3`                 | `tw-v1.2.3`    |

mod bun;
mod deno;
pub mod node;
mod tailwind;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;

pub use bun::Bun;
pub use deno::Deno;
pub use node::Node;
pub use tailwind::Tailwind;

use crate::activation;
use crate::catalog::CatalogClient;
use crate::errors::BvmError;
use crate::installed;
use crate::paths::InstallRoot;
use crate::platform::Platform;
use crate::release::Release;

/// Runtime managed by bvm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Distribution {
    /// Bun (`oven-sh/bun`)
    Bun,
    /// Deno (`denoland/deno`)
    Deno,
    /// Node.js (`nodejs.org/dist`)
    Node,
    /// Tailwind CSS standalone CLI (`tailwindlabs/tailwindcss`)
    Tailwind,
}

impl Distribution {
    /// Every distribution, in display order.
    pub const ALL: [Self; 4] = [Self::Bun, Self::Deno, Self::Node, Self::Tailwind];

    /// Canonical identifier accepted on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bun => "bun",
            Self::Deno => "deno",
            Self::Node => "node",
            Self::Tailwind => "tailwind",
        }
    }
}

impl FromStr for Distribution {
    type Err = BvmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bun" => Ok(Self::Bun),
            "deno" => Ok(Self::Deno),
            "node" | "nodejs" => Ok(Self::Node),
            "tailwind" => Ok(Self::Tailwind),
            _ => Err(BvmError::invalid_distribution(s)),
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-runtime knowledge used by every command.
#[async_trait]
pub trait DistributionHandler: Send + Sync {
    /// The distribution this handler serves.
    fn distribution(&self) -> Distribution;

    /// Lists the releases available for `platform`, in catalog order.
    ///
    /// `registry` replaces the default download host where the handler
    /// supports mirrors.
    async fn retrieve_releases(
        &self,
        client: &CatalogClient,
        platform: Platform,
        registry: Option<&str>,
    ) -> Result<Vec<Release>>;

    /// Whether `asset_name` is this distribution's artifact for `platform`.
    fn is_platform_match(&self, platform: Platform, asset_name: &str) -> bool;

    /// Canonical catalog tag for user input. Idempotent.
    fn normalize_tag(&self, raw: &str) -> String;

    /// Install directory name for a tag or user input.
    fn normalize_directory_name(&self, tag: &str) -> String;

    /// Anchored pattern for install directory names, capturing the version.
    fn directory_pattern(&self) -> &'static Regex;

    /// Files inside an installed version that activation exposes.
    ///
    /// # Errors
    ///
    /// Returns [`BvmError::InvalidPlatform`] for platforms the handler has no
    /// build for, or an I/O error if a directory listing is needed and fails.
    fn executable_paths(
        &self,
        paths: &InstallRoot,
        platform: Platform,
        directory_name: &str,
    ) -> Result<Vec<PathBuf>>;

    /// Makes an installed version the one found at the install root.
    ///
    /// Returns the file names placed at the root.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform is unsupported or a link or copy
    /// cannot be made.
    fn activate(
        &self,
        paths: &InstallRoot,
        platform: Platform,
        directory_name: &str,
        _include_all: bool,
    ) -> Result<Vec<String>> {
        let mut activated = Vec::new();
        for source in self.executable_paths(paths, platform, directory_name)? {
            activated.push(link_into_root(paths, &source, None)?);
        }
        Ok(activated)
    }

    /// Installed releases of this distribution.
    ///
    /// # Errors
    ///
    /// Returns an error if the install root cannot be read.
    fn get_installed_releases(&self, paths: &InstallRoot) -> Result<Vec<Release>> {
        installed::scan(paths, self.directory_pattern())
    }

    /// Deletes the install directory for `tag`.
    ///
    /// Returns `false` and logs a warning when there is nothing to delete.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be deleted.
    fn remove(&self, paths: &InstallRoot, tag: &str) -> Result<bool> {
        let dir = paths.version_dir(&self.normalize_directory_name(tag));
        if !dir.is_dir() {
            tracing::warn!("{}", BvmError::directory_not_found(&dir));
            return Ok(false);
        }
        std::fs::remove_dir_all(&dir)
            .with_context(|| format!("Failed to remove directory: {}", dir.display()))?;
        Ok(true)
    }
}

static BUN: Bun = Bun;
static DENO: Deno = Deno;
static NODE: Node = Node;
static TAILWIND: Tailwind = Tailwind;

/// Returns the handler for a distribution.
#[must_use]
pub fn handler_for(distribution: Distribution) -> &'static dyn DistributionHandler {
    match distribution {
        Distribution::Bun => &BUN,
        Distribution::Deno => &DENO,
        Distribution::Node => &NODE,
        Distribution::Tailwind => &TAILWIND,
    }
}

/// Links `source` into the install root, under `link_name` or its own file
/// name. Returns the name used.
pub(crate) fn link_into_root(
    paths: &InstallRoot,
    source: &Path,
    link_name: Option<&str>,
) -> Result<String> {
    let name = match link_name {
        Some(name) => name.to_string(),
        None => source
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Invalid executable path: {}", source.display()))?
            .to_string(),
    };
    activation::link_only(source, &paths.link_path(&name))?;
    Ok(name)
}

/// `bun-`-style tags: the prefix is part of the canonical tag.
pub(crate) fn prefixed_tag(raw: &str, prefix: &str) -> String {
    if raw.starts_with(prefix) {
        raw.to_string()
    } else if raw.starts_with('v') {
        format!("{prefix}{raw}")
    } else {
        format!("{prefix}v{raw}")
    }
}

/// `v`-style tags: any distribution prefix is dropped and a `v` ensured.
pub(crate) fn bare_tag(raw: &str, prefix: &str) -> String {
    if raw.starts_with('v') {
        return raw.to_string();
    }
    let stripped = raw.strip_prefix(prefix).unwrap_or(raw);
    if stripped.starts_with('v') {
        stripped.to_string()
    } else {
        format!("v{stripped}")
    }
}

/// Case-insensitive lookup in a per-platform asset table.
pub(crate) fn table_match(table: &[(Platform, &str)], platform: Platform, asset_name: &str) -> bool {
    table
        .iter()
        .any(|(p, name)| *p == platform && name.eq_ignore_ascii_case(asset_name))
}

/// Entry of a per-platform table, or `InvalidPlatform`.
pub(crate) fn table_entry<'a>(
    table: &[(Platform, &'a str)],
    platform: Platform,
) -> Result<&'a str, BvmError> {
    table
        .iter()
        .find(|(p, _)| *p == platform)
        .map(|(_, name)| *name)
        .ok_or(BvmError::invalid_platform(platform))
}
