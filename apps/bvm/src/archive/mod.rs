//! Artifact extraction.
//!
//! Downloaded artifacts are unpacked into a version directory. The container
//! kind is taken from the download URL: `.zip` goes through the `zip` crate,
//! `.tar.gz` through `flate2` and the in-tree [`tar`] reader, and anything
//! else is a bare executable copied into the directory as-is.
//!
//! Archive contents are kept verbatim, including a top-level folder if the
//! vendor ships one. Handlers know their archive layout and point activation
//! at the right sub-path.

pub mod tar;

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};
use flate2::read::GzDecoder;

/// Container format of a downloaded artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// ZIP archive.
    Zip,
    /// Gzip-compressed tar archive.
    TarGz,
    /// Single opaque file.
    Raw,
}

impl ArchiveKind {
    /// Picks the container kind from a URL or file name suffix.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        let lower = url.to_ascii_lowercase();
        if lower.ends_with(".zip") {
            Self::Zip
        } else if lower.ends_with(".tar.gz") {
            Self::TarGz
        } else {
            Self::Raw
        }
    }
}

/// Extracts `archive_path` into `dest_dir` according to the kind implied by
/// `download_url`.
///
/// # Errors
///
/// Returns an error if the archive cannot be read or decoded, or if the
/// destination cannot be written.
pub fn extract_archive(download_url: &str, archive_path: &Path, dest_dir: &Path) -> Result<()> {
    match ArchiveKind::from_url(download_url) {
        ArchiveKind::Zip => extract_zip(archive_path, dest_dir),
        ArchiveKind::TarGz => extract_tar_gz(archive_path, dest_dir),
        ArchiveKind::Raw => copy_raw(archive_path, dest_dir),
    }
}

/// Extracts a ZIP archive to the destination directory.
///
/// # Errors
///
/// Returns an error if the archive is not a valid ZIP file, an entry path
/// escapes the destination, or a file cannot be written.
pub fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = std::fs::File::open(archive_path)
        .with_context(|| format!("Failed to open archive: {}", archive_path.display()))?;

    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("Failed to read ZIP archive: {}", archive_path.display()))?;

    std::fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create directory: {}", dest_dir.display()))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("Failed to read archive entry {i}"))?;

        let Some(entry_path) = entry.enclosed_name() else {
            bail!(
                "Refusing to extract path with parent directory or absolute reference: {}",
                entry.name()
            );
        };
        if entry_path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir))
        {
            bail!(
                "Refusing to extract path with parent directory or absolute reference: {}",
                entry_path.display()
            );
        }

        let output_path = dest_dir.join(&entry_path);

        if entry.is_dir() {
            std::fs::create_dir_all(&output_path).with_context(|| {
                format!("Failed to create directory: {}", output_path.display())
            })?;
            continue;
        }

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut outfile = std::fs::File::create(&output_path)
            .with_context(|| format!("Failed to create file: {}", output_path.display()))?;
        std::io::copy(&mut entry, &mut outfile)
            .with_context(|| format!("Failed to extract: {}", output_path.display()))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&output_path, std::fs::Permissions::from_mode(mode & 0o7777))
                .with_context(|| format!("Failed to set permissions: {}", output_path.display()))?;
        }
    }

    Ok(())
}

/// Extracts a gzip-compressed tar archive to the destination directory.
///
/// # Errors
///
/// Returns an error if the gzip stream or the tar stream inside it is invalid,
/// or if a file cannot be written.
pub fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = std::fs::File::open(archive_path)
        .with_context(|| format!("Failed to open archive: {}", archive_path.display()))?;
    let decoder = GzDecoder::new(std::io::BufReader::new(file));
    tar::unpack(decoder, dest_dir)
        .with_context(|| format!("Failed to extract tar archive: {}", archive_path.display()))
}

/// Copies a bare artifact into `dest_dir`, keeping its file name.
fn copy_raw(artifact_path: &Path, dest_dir: &Path) -> Result<()> {
    let file_name = artifact_path
        .file_name()
        .with_context(|| format!("Artifact path has no file name: {}", artifact_path.display()))?;

    std::fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create directory: {}", dest_dir.display()))?;

    let target = dest_dir.join(file_name);
    std::fs::copy(artifact_path, &target).with_context(|| {
        format!(
            "Failed to copy {} to {}",
            artifact_path.display(),
            target.display()
        )
    })?;
    Ok(())
}

/// Sets mode `0o755` on each existing file (Unix only).
///
/// # Errors
///
/// Returns an error if metadata cannot be read or permissions cannot be set.
#[cfg(unix)]
pub fn set_executable_permissions(paths: &[PathBuf]) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    for path in paths {
        if !path.is_file() {
            continue;
        }
        let mut perms = std::fs::metadata(path)
            .with_context(|| format!("Failed to get metadata: {}", path.display()))?
            .permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("Failed to set permissions: {}", path.display()))?;
    }
    Ok(())
}

/// Sets executable permissions on files (no-op on Windows).
///
/// # Errors
///
/// This function does not return errors on Windows.
#[cfg(not(unix))]
pub fn set_executable_permissions(_paths: &[PathBuf]) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn create_test_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default().unix_permissions(0o755);
        for (name, content) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content).unwrap();
        }
        zip.finish().unwrap();
    }

    fn create_test_tar_gz(path: &Path, entries: &[(&str, &[u8])]) {
        let file = std::fs::File::create(path).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = ::tar::Builder::new(encoder);
        for (name, content) in entries {
            let mut header = ::tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            builder.append_data(&mut header, name, *content).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn archive_kind_from_url_suffix() {
        assert_eq!(
            ArchiveKind::from_url("https://github.com/x/bun-linux-x64.zip"),
            ArchiveKind::Zip
        );
        assert_eq!(
            ArchiveKind::from_url("https://nodejs.org/dist/v20.11.0/node-v20.11.0-linux-x64.tar.gz"),
            ArchiveKind::TarGz
        );
        assert_eq!(
            ArchiveKind::from_url("https://github.com/x/tailwindcss-linux-x64"),
            ArchiveKind::Raw
        );
        assert_eq!(
            ArchiveKind::from_url("https://github.com/x/tailwindcss-windows-x64.exe"),
            ArchiveKind::Raw
        );
    }

    #[test]
    fn extract_zip_keeps_top_level_folder() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("bun-linux-x64.zip");
        create_test_zip(&archive, &[("bun-linux-x64/bun", b"bun binary")]);
        let dest = temp.path().join("bun-v1.0.0");

        extract_archive("http://test/bun-linux-x64.zip", &archive, &dest).unwrap();

        assert_eq!(
            std::fs::read(dest.join("bun-linux-x64/bun")).unwrap(),
            b"bun binary"
        );
    }

    #[cfg(unix)]
    #[test]
    fn extract_zip_preserves_unix_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("deno.zip");
        create_test_zip(&archive, &[("deno", b"deno binary")]);
        let dest = temp.path().join("out");

        extract_zip(&archive, &dest).unwrap();

        let mode = std::fs::metadata(dest.join("deno"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn extract_zip_rejects_invalid_archive() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("broken.zip");
        std::fs::write(&archive, b"not a zip").unwrap();

        assert!(extract_zip(&archive, &temp.path().join("out")).is_err());
    }

    #[test]
    fn extract_tar_gz_goes_through_tar_reader() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("node.tar.gz");
        create_test_tar_gz(
            &archive,
            &[
                ("node-v20.11.0-linux-x64/bin/node", b"node binary"),
                ("node-v20.11.0-linux-x64/include/node/node.h", b"#pragma once"),
            ],
        );
        let dest = temp.path().join("node-v20.11.0");

        extract_archive(
            "https://nodejs.org/dist/v20.11.0/node-v20.11.0-linux-x64.tar.gz",
            &archive,
            &dest,
        )
        .unwrap();

        let root = dest.join("node-v20.11.0-linux-x64");
        assert_eq!(std::fs::read(root.join("bin/node")).unwrap(), b"node binary");
        assert_eq!(
            std::fs::read(root.join("include/node/node.h")).unwrap(),
            b"#pragma once"
        );
    }

    #[test]
    fn extract_tar_gz_rejects_plain_data() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("fake.tar.gz");
        std::fs::write(&archive, b"plain text, not gzip").unwrap();

        assert!(extract_tar_gz(&archive, &temp.path().join("out")).is_err());
    }

    #[test]
    fn raw_artifact_is_copied_under_its_own_name() {
        let temp = TempDir::new().unwrap();
        let artifact = temp.path().join("tailwindcss-linux-x64");
        std::fs::write(&artifact, b"tailwind binary").unwrap();
        let dest = temp.path().join("tw-v3.4.1");

        extract_archive("http://test/tailwindcss-linux-x64", &artifact, &dest).unwrap();

        assert_eq!(
            std::fs::read(dest.join("tailwindcss-linux-x64")).unwrap(),
            b"tailwind binary"
        );
        assert!(artifact.exists());
    }

    #[cfg(unix)]
    #[test]
    fn set_executable_permissions_skips_missing_paths() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let bin = temp.path().join("bun");
        std::fs::write(&bin, b"bun").unwrap();
        std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o644)).unwrap();

        set_executable_permissions(&[bin.clone(), temp.path().join("missing")]).unwrap();

        let mode = std::fs::metadata(&bin).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
