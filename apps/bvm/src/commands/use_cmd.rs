//! Use command for the bvm CLI.
//!
//! Activates an installed release by linking its executables into the
//! install root and records it as the active version in the config.
//!
//! ## Usage
//!
//! ```bash
//! bvm use 1.1.38                # Activate bun-v1.1.38
//! bvm use v20.11.0 -d node      # Activate node-v20.11.0
//! bvm use v20.11.0 -d node -a   # Windows: also copy npm, npx, node_modules
//! ```

use anyhow::Result;
use clap::Args;

use super::Context;
use crate::conflict::{detect_path_conflicts, format_conflict_warning};
use crate::errors::BvmError;

/// Arguments for the use command.
#[derive(Args, Debug)]
pub struct UseArgs {
    /// Installed version to activate (e.g. "1.1.38" or "bun-v1.1.38").
    pub version: String,

    /// Also bring the files shipped next to the executable into the root.
    #[clap(short, long)]
    pub all: bool,
}

/// Executes the use command.
///
/// # Process
///
/// 1. Verify the version is installed
/// 2. Link its executables into the install root
/// 3. Save it as the active version
/// 4. Warn if another installation shadows it on `PATH`
///
/// # Errors
///
/// Returns an error if:
/// - The version is not installed
/// - A link or copy cannot be made
/// - The config file cannot be written
pub fn execute(ctx: &mut Context, args: &UseArgs) -> Result<()> {
    let handler = ctx.handler();
    let directory_name = handler.normalize_directory_name(&args.version);

    let installed = handler.get_installed_releases(&ctx.paths)?;
    if !installed.iter().any(|r| r.tag_name == directory_name) {
        tracing::info!(
            "Run 'bvm install {} -d {}' to install it first.",
            args.version,
            ctx.distribution
        );
        return Err(BvmError::release_not_found(directory_name).into());
    }

    if ctx.config.active_version(ctx.distribution) == Some(directory_name.as_str()) {
        tracing::info!("{directory_name} is already active, relinking.");
    }

    let activated = handler.activate(&ctx.paths, ctx.platform, &directory_name, args.all)?;
    tracing::debug!("Activated entries: {}", activated.join(", "));

    ctx.config.set_active_version(ctx.distribution, &directory_name);
    ctx.config.save(&ctx.paths.config_file())?;

    tracing::info!("Now using {directory_name}.");

    let conflicts = detect_path_conflicts(&ctx.paths.root, &activated);
    if !conflicts.is_empty() {
        tracing::warn!("{}", format_conflict_warning(&conflicts));
    }

    Ok(())
}
