//! Configuration summary, printed when bvm runs without a subcommand.
//!
//! ```text
//! Install root:   /opt/bvm
//! Platform:       linux-amd64
//! Proxy:          (none)
//! Node registry:  https://nodejs.org
//! NPM registry:   (default)
//!
//! Active versions:
//!   bun       bun-v1.1.38
//!   deno      (none)
//!   node      node-v20.11.0
//!   tailwind  (none)
//! ```

use super::Context;
use crate::config::Config;
use crate::distribution::{Distribution, node};
use crate::paths::InstallRoot;
use crate::platform::Platform;

/// Prints the configuration summary.
pub fn execute(ctx: &Context) {
    for line in render(&ctx.paths, ctx.platform, &ctx.config) {
        println!("{line}");
    }
}

fn render(paths: &InstallRoot, platform: Platform, config: &Config) -> Vec<String> {
    let or = |value: &str, fallback: &str| {
        if value.is_empty() {
            fallback.to_string()
        } else {
            value.to_string()
        }
    };

    let mut lines = vec![
        format!("Install root:   {}", paths.root.display()),
        format!("Platform:       {platform}"),
        format!("Proxy:          {}", config.proxy().unwrap_or("(none)")),
        format!(
            "Node registry:  {}",
            or(&config.node_registry, node::DEFAULT_REGISTRY)
        ),
        format!("NPM registry:   {}", or(&config.npm_registry, "(default)")),
        String::new(),
        "Active versions:".to_string(),
    ];

    for distribution in Distribution::ALL {
        let active = config.active_version(distribution).unwrap_or("(none)");
        lines.push(format!("  {:<10}{active}", distribution.as_str()));
    }

    lines
}
