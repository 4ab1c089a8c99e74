//! Command implementations for the bvm CLI.
//!
//! - [`install`] - Download and unpack a release
//! - [`list`] - List installed or available releases
//! - [`use_cmd`] - Activate an installed release
//! - [`uninstall`] - Delete an installed release
//! - [`show`] - Print the configuration summary
//!
//! Every command runs against a [`Context`] built once at startup. It carries
//! the detected platform, the install root, the loaded config and the HTTP
//! client, so nothing below this layer reads process-wide state.

pub mod install;
pub mod list;
pub mod show;
pub mod uninstall;
pub mod use_cmd;

use anyhow::Result;

use crate::catalog::CatalogClient;
use crate::config::Config;
use crate::distribution::{Distribution, DistributionHandler, handler_for};
use crate::paths::InstallRoot;
use crate::platform::Platform;

/// State shared by one command invocation.
#[derive(Debug)]
pub struct Context {
    /// Detected platform; never `Unknown`.
    pub platform: Platform,
    /// Install-root layout.
    pub paths: InstallRoot,
    /// Configuration loaded at startup.
    pub config: Config,
    /// HTTP client honouring the configured proxy.
    pub client: CatalogClient,
    /// Distribution selected with `--distribution`.
    pub distribution: Distribution,
    /// Whether `--silent` was given.
    pub silent: bool,
}

impl Context {
    /// Detects the platform, resolves the install root and loads the config.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform is unsupported, the install root
    /// cannot be determined, the config is malformed, or the HTTP client
    /// cannot be built.
    pub fn load(distribution: Distribution, silent: bool) -> Result<Self> {
        let platform = Platform::detect().require_known()?;
        let paths = InstallRoot::new()?;
        let config = Config::load(&paths.config_file())?;
        let client = CatalogClient::new(config.proxy())?;

        Ok(Self {
            platform,
            paths,
            config,
            client,
            distribution,
            silent,
        })
    }

    /// Handler for the selected distribution.
    #[must_use]
    pub fn handler(&self) -> &'static dyn DistributionHandler {
        handler_for(self.distribution)
    }

    /// Registry override for the selected distribution.
    #[must_use]
    pub fn registry(&self) -> Option<&str> {
        self.config.registry_for(self.distribution)
    }
}
