//! Activation primitives.
//!
//! Activating a version places its executables at the install root, either as
//! symbolic links into the version directory or as copies. Both primitives
//! clear whatever occupies the destination first, so repeated activation
//! leaves exactly one entry. A failed symlink is reported, never replaced by a
//! copy.

use std::path::Path;

use anyhow::{Context, Result, bail};

/// Replaces `dest` with a symbolic link to `source`.
///
/// # Errors
///
/// Returns an error if `source` does not exist, the existing destination
/// cannot be removed, or the platform refuses to create the link.
pub fn link_only(source: &Path, dest: &Path) -> Result<()> {
    if source.symlink_metadata().is_err() {
        bail!(
            "Activation source not found: {}. The installation may be incomplete.",
            source.display()
        );
    }

    remove_existing(dest)?;
    create_link(source, dest)
}

/// Replaces `dest` with a copy of `source`, recursing into directories.
///
/// # Errors
///
/// Returns an error if `source` does not exist or any copy fails.
pub fn copy_only(source: &Path, dest: &Path) -> Result<()> {
    let metadata = source
        .symlink_metadata()
        .with_context(|| format!("Activation source not found: {}", source.display()))?;

    remove_existing(dest)?;

    if metadata.is_dir() {
        copy_dir_recursive(source, dest)
    } else {
        std::fs::copy(source, dest).with_context(|| {
            format!("Failed to copy {} to {}", source.display(), dest.display())
        })?;
        Ok(())
    }
}

/// Removes a file, directory or link at `path`; missing paths are fine.
///
/// Broken links count as present.
///
/// # Errors
///
/// Returns an error if the entry exists and cannot be removed.
pub fn remove_existing(path: &Path) -> Result<()> {
    let Ok(metadata) = path.symlink_metadata() else {
        return Ok(());
    };

    let result = if metadata.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        remove_file_or_link(path, &metadata)
    };

    result.with_context(|| format!("Failed to remove existing entry: {}", path.display()))
}

#[cfg(unix)]
fn remove_file_or_link(path: &Path, _metadata: &std::fs::Metadata) -> std::io::Result<()> {
    std::fs::remove_file(path)
}

#[cfg(windows)]
fn remove_file_or_link(path: &Path, metadata: &std::fs::Metadata) -> std::io::Result<()> {
    // Directory symlinks must be removed as directories on Windows.
    if metadata.is_symlink() {
        std::fs::remove_file(path).or_else(|_| std::fs::remove_dir(path))
    } else {
        std::fs::remove_file(path)
    }
}

fn copy_dir_recursive(source: &Path, dest: &Path) -> Result<()> {
    std::fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create directory: {}", dest.display()))?;

    let entries = std::fs::read_dir(source)
        .with_context(|| format!("Failed to read directory: {}", source.display()))?;

    for entry in entries {
        let entry = entry.context("Failed to read directory entry")?;
        let from = entry.path();
        let to = dest.join(entry.file_name());
        if entry
            .file_type()
            .with_context(|| format!("Failed to get file type: {}", from.display()))?
            .is_dir()
        {
            copy_dir_recursive(&from, &to)?;
        } else {
            std::fs::copy(&from, &to).with_context(|| {
                format!("Failed to copy {} to {}", from.display(), to.display())
            })?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn create_link(source: &Path, dest: &Path) -> Result<()> {
    std::os::unix::fs::symlink(source, dest).with_context(|| {
        format!(
            "Failed to create symlink from {} to {}",
            dest.display(),
            source.display()
        )
    })
}

#[cfg(windows)]
fn create_link(source: &Path, dest: &Path) -> Result<()> {
    let result = if source.is_dir() {
        std::os::windows::fs::symlink_dir(source, dest)
    } else {
        std::os::windows::fs::symlink_file(source, dest)
    };
    result.with_context(|| {
        format!(
            "Failed to create symlink from {} to {}. Enable Developer Mode or run as administrator.",
            dest.display(),
            source.display()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;

    fn entries_named(dir: &Path, name: &str) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name() == name)
            .count()
    }

    #[cfg(unix)]
    #[test]
    fn link_only_twice_leaves_one_link() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("bun-v1.0.0").join("bun");
        std::fs::create_dir_all(source.parent().unwrap()).unwrap();
        std::fs::write(&source, b"bun").unwrap();
        let dest = temp.path().join("bun");

        link_only(&source, &dest).unwrap();
        link_only(&source, &dest).unwrap();

        assert_eq!(entries_named(temp.path(), "bun"), 1);
        assert_eq!(std::fs::read_link(&dest).unwrap(), source);
    }

    #[cfg(unix)]
    #[test]
    fn link_only_replaces_directory_and_broken_link() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("deno-v1.46.3").join("deno");
        std::fs::create_dir_all(source.parent().unwrap()).unwrap();
        std::fs::write(&source, b"deno").unwrap();

        let occupied = temp.path().join("deno");
        std::fs::create_dir_all(occupied.join("stale")).unwrap();
        link_only(&source, &occupied).unwrap();
        assert_eq!(std::fs::read(&occupied).unwrap(), b"deno");

        let broken = temp.path().join("tailwindcss");
        std::os::unix::fs::symlink(temp.path().join("gone"), &broken).unwrap();
        link_only(&source, &broken).unwrap();
        assert_eq!(std::fs::read_link(&broken).unwrap(), source);
    }

    #[test]
    fn link_only_requires_source() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("bun");
        std::fs::write(&dest, b"previous").unwrap();

        let err = link_only(&temp.path().join("missing"), &dest).unwrap_err();

        assert!(err.to_string().contains("Activation source not found"));
        assert_eq!(std::fs::read(&dest).unwrap(), b"previous");
    }

    #[test]
    fn copy_only_copies_tree_and_replaces_existing() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("node-v20.11.0").join("node_modules");
        std::fs::create_dir_all(source.join("npm").join("bin")).unwrap();
        std::fs::write(source.join("npm").join("bin").join("npm-cli.js"), b"cli").unwrap();
        let dest = temp.path().join("node_modules");
        std::fs::create_dir_all(dest.join("old")).unwrap();

        copy_only(&source, &dest).unwrap();
        copy_only(&source, &dest).unwrap();

        assert_eq!(
            std::fs::read(dest.join("npm").join("bin").join("npm-cli.js")).unwrap(),
            b"cli"
        );
        assert!(!dest.join("old").exists());
        assert_eq!(entries_named(temp.path(), "node_modules"), 1);
    }

    #[test]
    fn copy_only_copies_single_file() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("npm.cmd");
        std::fs::write(&source, b"@echo off").unwrap();
        let dest = temp.path().join("out.cmd");
        std::fs::write(&dest, b"stale").unwrap();

        copy_only(&source, &dest).unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"@echo off");
    }

    #[test]
    fn remove_existing_ignores_missing_path() {
        let temp = TempDir::new().unwrap();
        remove_existing(&temp.path().join("nothing")).unwrap();
    }
}
