//! Uninstall command for the bvm CLI.
//!
//! ## Usage
//!
//! ```bash
//! bvm uninstall 1.1.38             # Remove bun-v1.1.38
//! bvm uninstall v1.46.3 -d deno    # Remove deno-v1.46.3
//! ```
//!
//! Removing a version that is not installed only prints a warning. Removing
//! the active version leaves its links at the install root dangling until
//! another version is activated.

use anyhow::Result;
use clap::Args;

use super::Context;

/// Arguments for the uninstall command.
#[derive(Args, Debug)]
pub struct UninstallArgs {
    /// Version to remove (e.g. "1.1.38" or "tw-v3.4.1").
    pub version: String,
}

/// Executes the uninstall command.
///
/// # Errors
///
/// Returns an error if the version directory exists but cannot be deleted.
pub fn execute(ctx: &Context, args: &UninstallArgs) -> Result<()> {
    let handler = ctx.handler();
    let directory_name = handler.normalize_directory_name(&args.version);

    if !handler.remove(&ctx.paths, &directory_name)? {
        return Ok(());
    }

    tracing::info!("{directory_name} uninstalled.");

    if ctx.config.active_version(ctx.distribution) == Some(directory_name.as_str()) {
        tracing::warn!(
            "{directory_name} was the active {} version; its links now point nowhere. \
             Run 'bvm use <version> -d {}' to activate another one.",
            ctx.distribution,
            ctx.distribution
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context;
    use crate::distribution::Distribution;
    use crate::platform::Platform;
    use assert_fs::TempDir;

    #[test]
    fn uninstall_removes_version_directory() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("tw-v3.4.1")).unwrap();
        std::fs::write(temp.path().join("tw-v3.4.1/tailwindcss-linux-x64"), b"").unwrap();
        std::fs::create_dir_all(temp.path().join("tw-v3.4.0")).unwrap();
        let ctx = context(
            temp.path(),
            "http://127.0.0.1:9",
            Distribution::Tailwind,
            Platform::LinuxAmd64,
        );

        execute(
            &ctx,
            &UninstallArgs {
                version: "3.4.1".to_string(),
            },
        )
        .unwrap();

        assert!(!temp.path().join("tw-v3.4.1").exists());
        assert!(temp.path().join("tw-v3.4.0").exists());
    }

    #[test]
    fn uninstall_of_missing_version_succeeds() {
        let temp = TempDir::new().unwrap();
        let ctx = context(
            temp.path(),
            "http://127.0.0.1:9",
            Distribution::Node,
            Platform::LinuxAmd64,
        );

        execute(
            &ctx,
            &UninstallArgs {
                version: "v20.11.0".to_string(),
            },
        )
        .unwrap();
    }

    #[test]
    fn uninstall_of_active_version_keeps_config() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("bun-v1.1.38")).unwrap();
        let mut ctx = context(
            temp.path(),
            "http://127.0.0.1:9",
            Distribution::Bun,
            Platform::LinuxAmd64,
        );
        ctx.config.set_active_version(Distribution::Bun, "bun-v1.1.38");

        execute(
            &ctx,
            &UninstallArgs {
                version: "bun-v1.1.38".to_string(),
            },
        )
        .unwrap();

        assert!(!temp.path().join("bun-v1.1.38").exists());
        assert_eq!(ctx.config.active_version(Distribution::Bun), Some("bun-v1.1.38"));
    }
}
