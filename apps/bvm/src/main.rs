#![warn(clippy::pedantic)]

//! # bvm
//!
//! A version manager for the Bun, Deno, Node.js and Tailwind CSS runtimes.
//!
//! Every version lives in its own directory under the install root (the
//! directory holding the `bvm` executable, or `BVM_HOME`). Activating a
//! version links its executables into the install root, so putting that
//! directory on `PATH` is all the shell setup needed.
//!
//! ## Subcommands
//!
//! - `install` - Download and unpack a release
//! - `list` - List installed releases, or with `--all` the available ones
//! - `use` - Activate an installed release
//! - `uninstall` - Delete an installed release
//!
//! Without a subcommand, bvm prints its configuration.
//!
//! ## Examples
//!
//! ```bash
//! bvm install latest
//! bvm use 1.1.38
//! bvm install 20.11.0 -d node && bvm use 20.11.0 -d node
//! bvm list --all -d deno
//! ```

mod activation;
mod archive;
mod catalog;
mod commands;
mod config;
mod conflict;
mod distribution;
mod download;
mod errors;
mod installed;
mod paths;
mod platform;
mod release;

use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{Context, install, list, show, uninstall, use_cmd};
use distribution::Distribution;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
const LOG_ENV: &str = "BVM_LOG";

/// Version manager for Bun, Deno, Node.js and Tailwind CSS.
#[derive(Parser)]
#[command(
    name = "bvm",
    author,
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BVM_GIT_COMMIT"), ")"),
    about = "Install and switch between Bun, Deno, Node.js and Tailwind CSS versions",
    after_help = "\
DISTRIBUTIONS:
    bun (default), deno, node (alias: nodejs), tailwind

ENVIRONMENT VARIABLES:
    BVM_HOME          Install root (default: directory of the bvm executable)
    BVM_LOG           Log filter, e.g. 'debug' (default: info)
    BVM_GITHUB_API    GitHub API base URL (default: https://api.github.com)"
)]
pub struct Cli {
    /// Runtime to operate on.
    #[clap(short, long, global = true, default_value = "bun")]
    pub distribution: String,

    /// Suppress log output and the download progress line.
    #[clap(short, long, global = true, action = clap::ArgAction::SetTrue)]
    pub silent: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands for the bvm CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Download and unpack a release.
    ///
    /// Installs "latest" when no version is given. An installed version is
    /// left alone unless --force is set.
    Install(install::InstallArgs),

    /// List installed releases.
    ///
    /// The active version is marked with '*'. With --all, lists the releases
    /// available for this platform and marks the installed ones.
    List(list::ListArgs),

    /// Activate an installed release.
    ///
    /// Links the release's executables into the install root and records it
    /// as the active version.
    Use(use_cmd::UseArgs),

    /// Delete an installed release.
    Uninstall(uninstall::UninstallArgs),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let exit_code = handle_error(&e);
        std::process::exit(exit_code);
    }
}

/// Prints an error and returns the exit code.
fn handle_error(e: &anyhow::Error) -> i32 {
    eprintln!("Error: {e:?}");
    1
}

/// Installs the stderr log subscriber.
fn init_tracing(silent: bool) {
    let filter = if silent {
        EnvFilter::new("off")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.silent);

    let distribution = Distribution::from_str(&cli.distribution)?;
    let mut ctx = Context::load(distribution, cli.silent)?;
    tracing::debug!(
        "platform={} root={} distribution={}",
        ctx.platform,
        ctx.paths.root.display(),
        ctx.distribution
    );

    match cli.command {
        Some(Commands::Install(args)) => install::execute(&ctx, &args).await,
        Some(Commands::List(args)) => list::execute(&ctx, &args).await,
        Some(Commands::Use(args)) => use_cmd::execute(&mut ctx, &args),
        Some(Commands::Uninstall(args)) => uninstall::execute(&ctx, &args),
        None => {
            show::execute(&ctx);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from(["bvm", "install", "20.11.0", "-d", "nodejs", "-s", "-f"])
            .unwrap();

        assert_eq!(cli.distribution, "nodejs");
        assert!(cli.silent);
        assert!(matches!(
            cli.command,
            Some(Commands::Install(ref args)) if args.version == "20.11.0" && args.force
        ));
    }

    #[test]
    fn install_defaults_to_latest_and_distribution_to_bun() {
        let cli = Cli::try_parse_from(["bvm", "install"]).unwrap();

        assert_eq!(cli.distribution, "bun");
        assert!(matches!(
            cli.command,
            Some(Commands::Install(ref args)) if args.version == "latest" && !args.force
        ));
    }

    #[test]
    fn use_requires_version() {
        assert!(Cli::try_parse_from(["bvm", "use"]).is_err());
        let cli = Cli::try_parse_from(["bvm", "use", "v1.46.3", "--all", "-d", "deno"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Use(ref args)) if args.version == "v1.46.3" && args.all
        ));
    }

    #[test]
    fn no_subcommand_is_accepted() {
        let cli = Cli::try_parse_from(["bvm", "-d", "tailwind"]).unwrap();
        assert!(cli.command.is_none());
    }
}
