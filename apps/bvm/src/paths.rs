//! Install-root layout.
//!
//! Everything bvm manages lives in a single directory, by default the one
//! holding the `bvm` executable so that activated links resolve on the same
//! `PATH` entry. `BVM_HOME` relocates it.
//!
//! ## Directory Structure
//!
//! ```text
//! <root>/                     # Directory of the bvm executable (or BVM_HOME)
//!   bvm                       # The tool itself
//!   .config.ini               # Persisted configuration
//!   bun                       # Activated links, one per executable
//!   node -> node-v20.11.0/node-v20.11.0-linux-x64/bin/node
//!   bun-v1.1.38/              # One directory per installed version
//!   deno-v1.46.3/
//!   node-v20.11.0/
//!   downloads/                # Artifacts in flight, removed after extraction
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::CONFIG_FILE;

/// Environment variable overriding the install root.
pub const BVM_HOME_ENV: &str = "BVM_HOME";

/// Resolved install-root paths.
#[derive(Debug, Clone)]
pub struct InstallRoot {
    /// Root directory holding versions, links and the config.
    pub root: PathBuf,
    /// Directory for downloads in progress.
    pub downloads: PathBuf,
}

impl InstallRoot {
    /// Resolves the install root.
    ///
    /// The root is `BVM_HOME` when set, otherwise the directory containing the
    /// running executable.
    ///
    /// # Errors
    ///
    /// Returns an error if the executable path cannot be determined.
    pub fn new() -> Result<Self> {
        let root = match std::env::var_os(BVM_HOME_ENV) {
            Some(home) if !home.is_empty() => PathBuf::from(home),
            _ => {
                let exe = std::env::current_exe()
                    .context("Cannot determine the bvm executable path. Set BVM_HOME.")?;
                exe.parent()
                    .map(Path::to_path_buf)
                    .context("The bvm executable has no parent directory. Set BVM_HOME.")?
            }
        };
        Ok(Self::with_root(root))
    }

    /// Creates paths for a known root directory.
    #[must_use = "returns new paths instance without side effects"]
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            downloads: root.join("downloads"),
            root,
        }
    }

    /// Path of the config file.
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Directory of an installed version.
    #[must_use]
    pub fn version_dir(&self, directory_name: &str) -> PathBuf {
        self.root.join(directory_name)
    }

    /// Whether a version directory exists.
    #[must_use]
    pub fn is_installed(&self, directory_name: &str) -> bool {
        self.version_dir(directory_name).is_dir()
    }

    /// Where an activated executable is linked or copied to.
    #[must_use]
    pub fn link_path(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Where a downloaded artifact is stored before extraction.
    #[must_use]
    pub fn download_path(&self, file_name: &str) -> PathBuf {
        self.downloads.join(file_name)
    }

    /// Names of every directory directly under the root, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be read.
    pub fn directory_names(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.root)
            .with_context(|| format!("Failed to read directory: {}", self.root.display()))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();
            if path.is_dir()
                && let Some(name) = path.file_name().and_then(|n| n.to_str())
            {
                names.push(name.to_string());
            }
        }

        names.sort();
        Ok(names)
    }

    /// Creates the root and downloads directories.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.root, &self.downloads] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;

    #[test]
    fn with_root_derives_layout() {
        let paths = InstallRoot::with_root(PathBuf::from("/opt/bvm"));

        assert_eq!(paths.downloads, PathBuf::from("/opt/bvm/downloads"));
        assert_eq!(paths.config_file(), PathBuf::from("/opt/bvm/.config.ini"));
        assert_eq!(
            paths.version_dir("bun-v1.1.38"),
            PathBuf::from("/opt/bvm/bun-v1.1.38")
        );
        assert_eq!(paths.link_path("bun"), PathBuf::from("/opt/bvm/bun"));
        assert_eq!(
            paths.download_path("bun-linux-x64.zip"),
            PathBuf::from("/opt/bvm/downloads/bun-linux-x64.zip")
        );
    }

    #[test]
    fn directory_names_lists_only_directories_sorted() {
        let temp = TempDir::new().unwrap();
        let paths = InstallRoot::with_root(temp.path().to_path_buf());
        std::fs::create_dir(temp.path().join("node-v20.11.0")).unwrap();
        std::fs::create_dir(temp.path().join("bun-v1.0.0")).unwrap();
        std::fs::write(temp.path().join("bun"), b"binary").unwrap();

        assert_eq!(
            paths.directory_names().unwrap(),
            vec!["bun-v1.0.0".to_string(), "node-v20.11.0".to_string()]
        );
    }

    #[test]
    fn directory_names_empty_for_missing_root() {
        let temp = TempDir::new().unwrap();
        let paths = InstallRoot::with_root(temp.path().join("absent"));
        assert!(paths.directory_names().unwrap().is_empty());
    }

    #[test]
    fn ensure_directories_creates_downloads() {
        let temp = TempDir::new().unwrap();
        let paths = InstallRoot::with_root(temp.path().join("root"));

        paths.ensure_directories().unwrap();

        assert!(paths.root.is_dir());
        assert!(paths.downloads.is_dir());
        assert!(!paths.is_installed("bun-v1.0.0"));
    }
}
