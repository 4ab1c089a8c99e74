//! PATH shadowing detection.
//!
//! After `bvm use`, an activated executable only takes effect if the install
//! root wins the `PATH` lookup. When another installation of the same runtime
//! comes first, bvm warns instead of failing.

use std::path::{Path, PathBuf};

/// An activated executable that resolves elsewhere on `PATH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConflict {
    /// File name of the executable (e.g. `node`, `bun.exe`).
    pub binary: String,
    /// Where `PATH` lookup finds it.
    pub found: PathBuf,
    /// The activated entry at the install root.
    pub expected: PathBuf,
}

/// Checks each activated file name against `PATH`.
#[must_use]
pub fn detect_path_conflicts(root: &Path, binaries: &[String]) -> Vec<PathConflict> {
    detect_with(root, binaries, |name| which::which(name).ok())
}

fn detect_with<F>(root: &Path, binaries: &[String], resolve: F) -> Vec<PathConflict>
where
    F: Fn(&str) -> Option<PathBuf>,
{
    binaries
        .iter()
        .filter_map(|binary| {
            let expected = root.join(binary);
            let found = resolve(binary)?;
            if found == expected || !expected.exists() {
                return None;
            }
            // `which` may return the canonical path of the same entry.
            if let (Ok(a), Ok(b)) = (found.canonicalize(), expected.canonicalize())
                && a == b
            {
                return None;
            }
            Some(PathConflict {
                binary: binary.clone(),
                found,
                expected,
            })
        })
        .collect()
}

/// Formats a warning for the given conflicts; empty when there are none.
#[must_use]
pub fn format_conflict_warning(conflicts: &[PathConflict]) -> String {
    if conflicts.is_empty() {
        return String::new();
    }

    let mut lines = vec!["PATH conflict detected".to_string()];

    for conflict in conflicts {
        lines.push(format!(
            "  '{}' found at: {}",
            conflict.binary,
            conflict.found.display()
        ));
        lines.push(format!("  Activated at:    {}", conflict.expected.display()));
    }

    if let Some(parent) = conflicts.first().and_then(|c| c.expected.parent()) {
        lines.push(format!(
            "  Put {} before other entries in PATH to use the activated version.",
            parent.display()
        ));
    }

    lines.join("\n")
}
