//! Platform detection for bvm.
//!
//! The platform is resolved once at startup and threaded through every
//! catalog, extraction and activation step.
//!
//! ## Supported Platforms
//!
//! - Windows `x86_64` (`windows-amd64`)
//! - Linux `x86_64` (`linux-amd64`)
//! - Linux `aarch64` (`linux-aarch64`)
//! - macOS (`mac-amd64`, Apple Silicon runs the x64 builds)

use std::fmt;

use crate::errors::BvmError;

/// Target platform (operating system and CPU architecture).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Anything bvm has no builds for. Aborts every command.
    Unknown,
    /// Windows on `x86_64`
    WindowsAmd64,
    /// Linux on `x86_64`
    LinuxAmd64,
    /// Linux on `aarch64`
    LinuxAarch64,
    /// macOS
    MacAmd64,
}

impl Platform {
    /// Every supported platform, `Unknown` excluded.
    pub const SUPPORTED: [Self; 4] = [
        Self::WindowsAmd64,
        Self::LinuxAmd64,
        Self::LinuxAarch64,
        Self::MacAmd64,
    ];

    /// Detects the platform from the compile-time target.
    ///
    /// Returns [`Platform::Unknown`] rather than failing; callers turn that into
    /// an error with [`Platform::require_known`].
    #[must_use]
    pub fn detect() -> Self {
        Self::from_os_arch(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Maps an OS/architecture pair as reported by `std::env::consts`.
    #[must_use]
    pub fn from_os_arch(os: &str, arch: &str) -> Self {
        match (os, arch) {
            ("windows", _) => Self::WindowsAmd64,
            ("linux", "aarch64") => Self::LinuxAarch64,
            ("linux", _) => Self::LinuxAmd64,
            ("macos", _) => Self::MacAmd64,
            _ => Self::Unknown,
        }
    }

    /// Fails with [`BvmError::InvalidPlatform`] for [`Platform::Unknown`].
    ///
    /// # Errors
    ///
    /// Returns an error if the platform is `Unknown`.
    pub fn require_known(self) -> Result<Self, BvmError> {
        if Self::SUPPORTED.contains(&self) {
            Ok(self)
        } else {
            Err(BvmError::invalid_platform(self))
        }
    }

    /// Returns the identifier used in messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::WindowsAmd64 => "windows-amd64",
            Self::LinuxAmd64 => "linux-amd64",
            Self::LinuxAarch64 => "linux-aarch64",
            Self::MacAmd64 => "mac-amd64",
        }
    }

    /// Returns the executable file extension for this platform.
    #[must_use]
    pub fn executable_extension(self) -> &'static str {
        if self.is_windows() { ".exe" } else { "" }
    }

    /// Returns whether this platform is Windows.
    #[must_use]
    pub fn is_windows(self) -> bool {
        matches!(self, Self::WindowsAmd64)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_os_arch_maps_supported_targets() {
        assert_eq!(Platform::from_os_arch("windows", "x86_64"), Platform::WindowsAmd64);
        assert_eq!(Platform::from_os_arch("linux", "x86_64"), Platform::LinuxAmd64);
        assert_eq!(Platform::from_os_arch("linux", "aarch64"), Platform::LinuxAarch64);
        assert_eq!(Platform::from_os_arch("macos", "x86_64"), Platform::MacAmd64);
        assert_eq!(Platform::from_os_arch("macos", "aarch64"), Platform::MacAmd64);
    }

    #[test]
    fn from_os_arch_returns_unknown_for_other_systems() {
        assert_eq!(Platform::from_os_arch("freebsd", "x86_64"), Platform::Unknown);
        assert_eq!(Platform::from_os_arch("android", "aarch64"), Platform::Unknown);
    }

    #[test]
    fn require_known_rejects_unknown() {
        assert!(matches!(
            Platform::Unknown.require_known(),
            Err(BvmError::InvalidPlatform { .. })
        ));
        for platform in Platform::SUPPORTED {
            assert_eq!(platform.require_known().ok(), Some(platform));
        }
    }

    #[test]
    fn executable_extension_only_on_windows() {
        assert_eq!(Platform::WindowsAmd64.executable_extension(), ".exe");
        assert_eq!(Platform::LinuxAmd64.executable_extension(), "");
        assert_eq!(Platform::LinuxAarch64.executable_extension(), "");
        assert_eq!(Platform::MacAmd64.executable_extension(), "");
    }

    #[test]
    fn display_matches_as_str() {
        for platform in Platform::SUPPORTED {
            assert_eq!(platform.to_string(), platform.as_str());
        }
    }

    #[test]
    fn detect_returns_known_platform_on_ci_targets() {
        #[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
        assert_ne!(Platform::detect(), Platform::Unknown);
    }
}
