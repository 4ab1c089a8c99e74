//! List command for the bvm CLI.
//!
//! Without flags, lists installed releases of the selected distribution and
//! marks the active one. With `--all`, lists every release the catalog
//! offers for this platform and marks the installed ones.
//!
//! ## Output Format
//!
//! ```text
//!   bun-v1.0.0
//! * bun-v1.1.38
//! ```
//!
//! With `--all`:
//!
//! ```text
//!   bun-v1.0.0     2023-09-08
//! * bun-v1.1.38    2024-11-29
//! ```

use anyhow::Result;
use clap::Args;

use super::Context;
use crate::distribution::DistributionHandler;
use crate::installed;
use crate::paths::InstallRoot;
use crate::release::Release;

/// Arguments for the list command.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// List releases available for download instead of installed ones.
    #[clap(short, long)]
    pub all: bool,
}

/// Executes the list command.
///
/// # Errors
///
/// Returns an error if the install root cannot be read or, with `--all`,
/// the catalog cannot be fetched.
pub async fn execute(ctx: &Context, args: &ListArgs) -> Result<()> {
    let handler = ctx.handler();

    let lines = if args.all {
        tracing::info!("Fetching {} releases...", ctx.distribution);
        let mut releases = handler
            .retrieve_releases(&ctx.client, ctx.platform, ctx.registry())
            .await?;
        if releases.is_empty() {
            tracing::info!("No {} releases available for {}.", ctx.distribution, ctx.platform);
            return Ok(());
        }
        render_remote(handler, &ctx.paths, &mut releases)
    } else {
        let mut releases = handler.get_installed_releases(&ctx.paths)?;
        if releases.is_empty() {
            tracing::info!("No {} versions installed.", ctx.distribution);
            tracing::info!("Run 'bvm install latest -d {}' to install one.", ctx.distribution);
            return Ok(());
        }
        let active = ctx.config.active_version(ctx.distribution);
        render_installed(handler, &mut releases, active)
    };

    for line in lines {
        println!("{line}");
    }

    Ok(())
}

/// Installed releases sorted by version, the active one marked with `*`.
fn render_installed(
    handler: &dyn DistributionHandler,
    releases: &mut [Release],
    active: Option<&str>,
) -> Vec<String> {
    installed::sort_by_version(releases, handler.directory_pattern());
    releases
        .iter()
        .map(|release| {
            let marker = if active == Some(release.tag_name.as_str()) {
                "*"
            } else {
                " "
            };
            format!("{marker} {}", release.tag_name)
        })
        .collect()
}

/// Remote releases oldest first, installed ones marked with `*`.
fn render_remote(
    handler: &dyn DistributionHandler,
    paths: &InstallRoot,
    releases: &mut [Release],
) -> Vec<String> {
    releases.sort_by_key(|r| r.created_at);
    let width = releases.iter().map(|r| r.tag_name.len()).max().unwrap_or(0);
    releases
        .iter()
        .map(|release| {
            let installed = paths.is_installed(&handler.normalize_directory_name(&release.tag_name));
            let marker = if installed { "*" } else { " " };
            format!(
                "{marker} {:<width$}    {}",
                release.tag_name,
                release.created_at.format("%Y-%m-%d")
            )
        })
        .collect()
}
