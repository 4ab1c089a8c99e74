//! Installed-release scanner.
//!
//! Every directory at the install root whose name matches a distribution's
//! pattern (`^bun-v(\d+\.\d+\.\d+)$` and friends) counts as an installed
//! release. Anything else is ignored.

use regex::Regex;
use semver::Version;

use anyhow::Result;

use crate::paths::InstallRoot;
use crate::release::Release;

/// Lists installed releases whose directory name matches `pattern`.
///
/// # Errors
///
/// Returns an error if the install root cannot be read.
pub fn scan(paths: &InstallRoot, pattern: &Regex) -> Result<Vec<Release>> {
    Ok(paths
        .directory_names()?
        .into_iter()
        .filter(|name| pattern.is_match(name))
        .map(Release::local)
        .collect())
}

/// The semantic version captured by the first group of `pattern`.
#[must_use]
pub fn captured_version(pattern: &Regex, directory_name: &str) -> Option<Version> {
    let captures = pattern.captures(directory_name)?;
    Version::parse(captures.get(1)?.as_str()).ok()
}

/// Sorts installed releases by the version in their directory names, oldest
/// first. Names without a parsable version sort first, by name.
pub fn sort_by_version(releases: &mut [Release], pattern: &Regex) {
    releases.sort_by(|a, b| {
        let va = captured_version(pattern, &a.tag_name);
        let vb = captured_version(pattern, &b.tag_name);
        va.cmp(&vb).then_with(|| a.tag_name.cmp(&b.tag_name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;

    fn bun_pattern() -> Regex {
        Regex::new(r"^bun-v(\d+\.\d+\.\d+)$").unwrap()
    }

    #[test]
    fn scan_keeps_only_matching_directories() {
        let temp = TempDir::new().unwrap();
        for dir in ["bun-v1.0.0", "bun-v1.1.38", "bun-canary", "deno-v1.46.3", "downloads"] {
            std::fs::create_dir(temp.path().join(dir)).unwrap();
        }
        std::fs::write(temp.path().join("bun-v2.0.0"), b"a file").unwrap();
        let paths = InstallRoot::with_root(temp.path().to_path_buf());

        let releases = scan(&paths, &bun_pattern()).unwrap();

        let tags: Vec<_> = releases.iter().map(|r| r.tag_name.as_str()).collect();
        assert_eq!(tags, ["bun-v1.0.0", "bun-v1.1.38"]);
        assert!(releases.iter().all(Release::is_local));
    }

    #[test]
    fn scan_of_missing_root_is_empty() {
        let temp = TempDir::new().unwrap();
        let paths = InstallRoot::with_root(temp.path().join("nothing"));
        assert!(scan(&paths, &bun_pattern()).unwrap().is_empty());
    }

    #[test]
    fn sort_by_version_is_numeric() {
        let mut releases = vec![
            Release::local("bun-v1.10.0"),
            Release::local("bun-v1.2.0"),
            Release::local("bun-v1.9.3"),
        ];

        sort_by_version(&mut releases, &bun_pattern());

        let tags: Vec<_> = releases.iter().map(|r| r.tag_name.as_str()).collect();
        assert_eq!(tags, ["bun-v1.2.0", "bun-v1.9.3", "bun-v1.10.0"]);
    }

    #[test]
    fn captured_version_requires_match() {
        assert_eq!(
            captured_version(&bun_pattern(), "bun-v1.1.38"),
            Some(Version::new(1, 1, 38))
        );
        assert_eq!(captured_version(&bun_pattern(), "bun-1.1.38"), None);
    }
}
