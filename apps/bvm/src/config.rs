//! Persisted bvm configuration.
//!
//! The config lives in `.config.ini` at the install root as newline-delimited
//! `key=value` pairs:
//!
//! ```text
//! proxy=http://127.0.0.1:7890
//! node_registry=https://npmmirror.com/mirrors/node
//! bun_version=bun-v1.1.38
//! node_version=node-v20.11.0
//! ```
//!
//! Unknown keys are ignored when reading. Only non-empty fields are written
//! back.

use std::path::Path;

use anyhow::{Context, Result};

use crate::distribution::Distribution;
use crate::errors::BvmError;

/// Config file name within the install root.
pub const CONFIG_FILE: &str = ".config.ini";

const PROXY_KEY: &str = "proxy";
const NODE_REGISTRY_KEY: &str = "node_registry";
const NPM_REGISTRY_KEY: &str = "npm_registry";
const BUN_VERSION_KEY: &str = "bun_version";
const DENO_VERSION_KEY: &str = "deno_version";
const NODE_VERSION_KEY: &str = "node_version";
const TAILWIND_VERSION_KEY: &str = "tailwind_version";

/// In-memory view of `.config.ini`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// HTTP(S) proxy applied to every request.
    pub proxy: String,
    /// Mirror replacing `https://nodejs.org` for Node releases.
    pub node_registry: String,
    /// npm registry mirror, persisted for the user's tooling.
    pub npm_registry: String,
    /// Active Bun directory name.
    pub bun_version: String,
    /// Active Deno directory name.
    pub deno_version: String,
    /// Active Node directory name.
    pub node_version: String,
    /// Active Tailwind directory name.
    pub tailwind_version: String,
}

impl Config {
    /// Loads the config file, returning defaults when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a line has no `=`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Ok(Self::parse(&content)?)
    }

    /// Parses config file content.
    ///
    /// # Errors
    ///
    /// Returns [`BvmError::ConfigParse`] for a non-blank line without `=`.
    pub fn parse(content: &str) -> Result<Self, BvmError> {
        let mut config = Self::default();

        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| BvmError::config_parse(line))?;

            let slot = match key {
                PROXY_KEY => &mut config.proxy,
                NODE_REGISTRY_KEY => &mut config.node_registry,
                NPM_REGISTRY_KEY => &mut config.npm_registry,
                BUN_VERSION_KEY => &mut config.bun_version,
                DENO_VERSION_KEY => &mut config.deno_version,
                NODE_VERSION_KEY => &mut config.node_version,
                TAILWIND_VERSION_KEY => &mut config.tailwind_version,
                _ => continue,
            };
            *slot = value.to_string();
        }

        Ok(config)
    }

    /// Serializes the non-empty fields, one `key=value` per line.
    #[must_use]
    pub fn render(&self) -> String {
        let fields = [
            (PROXY_KEY, &self.proxy),
            (NODE_REGISTRY_KEY, &self.node_registry),
            (NPM_REGISTRY_KEY, &self.npm_registry),
            (BUN_VERSION_KEY, &self.bun_version),
            (DENO_VERSION_KEY, &self.deno_version),
            (NODE_VERSION_KEY, &self.node_version),
            (TAILWIND_VERSION_KEY, &self.tailwind_version),
        ];

        fields
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| format!("{key}={value}\n"))
            .collect()
    }

    /// Writes the config back in full.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render())
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Returns the active directory name for a distribution, if any.
    #[must_use]
    pub fn active_version(&self, distribution: Distribution) -> Option<&str> {
        let value = match distribution {
            Distribution::Bun => &self.bun_version,
            Distribution::Deno => &self.deno_version,
            Distribution::Node => &self.node_version,
            Distribution::Tailwind => &self.tailwind_version,
        };
        (!value.is_empty()).then_some(value.as_str())
    }

    /// Records the active directory name for a distribution.
    pub fn set_active_version(&mut self, distribution: Distribution, directory_name: &str) {
        let slot = match distribution {
            Distribution::Bun => &mut self.bun_version,
            Distribution::Deno => &mut self.deno_version,
            Distribution::Node => &mut self.node_version,
            Distribution::Tailwind => &mut self.tailwind_version,
        };
        *slot = directory_name.to_string();
    }

    /// Returns the registry override a handler should use, if any.
    #[must_use]
    pub fn registry_for(&self, distribution: Distribution) -> Option<&str> {
        match distribution {
            Distribution::Node if !self.node_registry.is_empty() => Some(&self.node_registry),
            _ => None,
        }
    }

    /// Returns the configured proxy, if any.
    #[must_use]
    pub fn proxy(&self) -> Option<&str> {
        let proxy = self.proxy.trim();
        (!proxy.is_empty()).then_some(proxy)
    }
}
