//! Install command for the bvm CLI.
//!
//! Downloads a release and unpacks it into its version directory. Installing
//! does not activate; run `bvm use` afterwards.
//!
//! ## Usage
//!
//! ```bash
//! bvm install latest               # Newest Bun release
//! bvm install 1.46.3 -d deno       # Specific Deno release
//! bvm install v20.11.0 -d node -f  # Reinstall over an existing copy
//! ```

use anyhow::Result;
use clap::Args;

use super::Context;
use crate::archive::{extract_archive, set_executable_permissions};
use crate::distribution::DistributionHandler;
use crate::download::download_file;
use crate::errors::BvmError;
use crate::release::Release;

/// Arguments for the install command.
#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Version to install (e.g. "1.1.38", "v1.1.38" or "latest").
    #[clap(default_value = "latest")]
    pub version: String,

    /// Remove an existing installation of the same version first.
    #[clap(short, long)]
    pub force: bool,
}

/// Executes the install command.
///
/// # Process
///
/// 1. Fetch the release catalog for the selected distribution
/// 2. Pick the requested release, or the newest for "latest"
/// 3. Skip (or with `--force`, remove) an existing installation
/// 4. Download, extract and mark executables
///
/// # Errors
///
/// Returns an error if:
/// - The catalog cannot be fetched
/// - The version is not in the catalog
/// - Download or extraction fails
pub async fn execute(ctx: &Context, args: &InstallArgs) -> Result<()> {
    let handler = ctx.handler();

    tracing::info!("Fetching {} releases...", handler.distribution());
    let releases = handler
        .retrieve_releases(&ctx.client, ctx.platform, ctx.registry())
        .await?;

    let release = select_release(handler, &releases, &args.version)?;
    let directory_name = handler.normalize_directory_name(&release.tag_name);
    if let Some(warning) = unlisted_directory_warning(handler, &directory_name) {
        tracing::warn!("{warning}");
    }

    if ctx.paths.is_installed(&directory_name) {
        if !args.force {
            tracing::warn!("{}", BvmError::already_installed(&directory_name));
            return Ok(());
        }
        tracing::info!("Removing existing {directory_name}...");
        handler.remove(&ctx.paths, &directory_name)?;
    }

    ctx.paths.ensure_directories()?;

    let archive_path = ctx.paths.download_path(release.file_name());
    tracing::info!("Downloading {}...", release.download_url);
    download_file(&ctx.client, &release.download_url, &archive_path, !ctx.silent).await?;

    tracing::info!("Extracting...");
    let version_dir = ctx.paths.version_dir(&directory_name);
    extract_archive(&release.download_url, &archive_path, &version_dir)?;

    let executables = handler.executable_paths(&ctx.paths, ctx.platform, &directory_name)?;
    set_executable_permissions(&executables)?;

    std::fs::remove_file(&archive_path).ok();

    tracing::info!("{directory_name} installed successfully.");
    tracing::info!(
        "Run 'bvm use {} -d {}' to activate it.",
        release.tag_name,
        ctx.distribution
    );

    Ok(())
}

/// Picks the release named by `version`.
///
/// `latest` is the remote release with the greatest `created_at`; the
/// earliest entry wins ties. Anything else is normalized and matched against
/// tags, first match wins.
///
/// # Errors
///
/// Returns [`BvmError::ReleaseNotFound`] if nothing matches.
pub fn select_release<'a>(
    handler: &dyn DistributionHandler,
    releases: &'a [Release],
    version: &str,
) -> Result<&'a Release, BvmError> {
    if version.eq_ignore_ascii_case("latest") {
        return releases
            .iter()
            .filter(|r| !r.is_local())
            .reduce(|best, r| if r.created_at > best.created_at { r } else { best })
            .ok_or_else(|| BvmError::release_not_found(version));
    }

    let tag = handler.normalize_tag(version);
    releases
        .iter()
        .find(|r| r.tag_name == tag)
        .ok_or_else(|| BvmError::release_not_found(tag))
}

/// Warning for a release whose directory `list` and `use` will not see,
/// such as Bun's rolling `canary` tag.
fn unlisted_directory_warning(
    handler: &dyn DistributionHandler,
    directory_name: &str,
) -> Option<String> {
    if handler.directory_pattern().is_match(directory_name) {
        return None;
    }
    Some(format!(
        "{directory_name} is not a versioned release; 'bvm list' and 'bvm use' will not \
         recognize it. Install an explicit version instead."
    ))
}
