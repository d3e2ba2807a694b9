//! Host platform identification.
//!
//! natlib ships libraries for three operating systems on two 64-bit
//! architectures. Anything else is reported as unsupported rather than
//! mapped onto a "close enough" platform.

use std::sync::OnceLock;

use thiserror::Error;

/// Errors raised when an operating system or architecture is outside the
/// supported set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The operating system is not windows, macos or linux.
    #[error("Operating system not supported by native library loader: {0}")]
    UnsupportedOs(String),

    /// The architecture is neither x64 nor arm64.
    #[error("Architecture not supported by native library loader: {0}")]
    UnsupportedArch(String),
}

/// Operating system family a library is built for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// Microsoft Windows
    #[serde(alias = "win64")]
    Windows,
    /// Apple macOS
    #[serde(alias = "macosx", alias = "darwin")]
    Macos,
    /// Linux with a glibc/musl style dynamic linker
    #[serde(alias = "linux64")]
    Linux,
}

impl Os {
    /// Every supported operating system.
    pub const ALL: [Self; 3] = [Self::Windows, Self::Macos, Self::Linux];

    /// Lowercase name (`windows`, `macos`, `linux`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Macos => "macos",
            Self::Linux => "linux",
        }
    }
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Os {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "windows" | "win64" => Ok(Self::Windows),
            "macos" | "macosx" | "darwin" | "osx" => Ok(Self::Macos),
            "linux" | "linux64" => Ok(Self::Linux),
            _ => Err(PlatformError::UnsupportedOs(s.to_string())),
        }
    }
}

/// Processor architecture a library is built for.
///
/// `X64` is the primary architecture: its filenames carry no suffix.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// x86-64, also known as AMD64
    #[serde(alias = "x86_64", alias = "amd64")]
    X64,
    /// 64-bit ARM, also known as aarch64
    #[serde(alias = "aarch64")]
    Arm64,
}

impl Arch {
    /// Every supported architecture.
    pub const ALL: [Self; 2] = [Self::X64, Self::Arm64];

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X64 => "x64",
            Self::Arm64 => "arm64",
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Arch {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "x64" | "x86_64" | "amd64" => Ok(Self::X64),
            "arm64" | "aarch64" => Ok(Self::Arm64),
            _ => Err(PlatformError::UnsupportedArch(s.to_string())),
        }
    }
}

/// An (operating system, architecture) pair.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct PlatformId {
    /// Operating system family
    pub os: Os,
    /// Processor architecture
    pub arch: Arch,
}

impl PlatformId {
    /// Create a platform from its parts.
    pub const fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// The platform this process runs on.
    ///
    /// The host is inspected on the first call only; later calls return the
    /// cached result, including a cached failure.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] if the host operating system or
    /// architecture is not supported.
    pub fn current() -> Result<Self, PlatformError> {
        static CURRENT: OnceLock<Result<PlatformId, PlatformError>> = OnceLock::new();
        CURRENT
            .get_or_init(|| Self::from_host(std::env::consts::OS, std::env::consts::ARCH))
            .clone()
    }

    /// Resolve a platform from host metadata as reported by
    /// `std::env::consts::{OS, ARCH}`.
    ///
    /// The operating system is checked before the architecture, so an
    /// unsupported host with an unsupported CPU reports the OS.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::UnsupportedOs`] or
    /// [`PlatformError::UnsupportedArch`].
    pub fn from_host(os: &str, arch: &str) -> Result<Self, PlatformError> {
        let os = match os {
            "windows" => Os::Windows,
            "macos" => Os::Macos,
            "linux" => Os::Linux,
            other => return Err(PlatformError::UnsupportedOs(other.to_string())),
        };
        let arch = match arch {
            "x86_64" => Arch::X64,
            "aarch64" => Arch::Arm64,
            other => return Err(PlatformError::UnsupportedArch(other.to_string())),
        };
        Ok(Self { os, arch })
    }

    /// Whether dependencies must be loaded explicitly before the library
    /// that needs them.
    ///
    /// Only Windows needs this. The ELF and Mach-O loaders find siblings in
    /// the library's own directory through `$ORIGIN` / `@rpath`.
    pub fn preloads_dependencies(&self) -> bool {
        self.os == Os::Windows
    }
}

impl std::fmt::Display for PlatformId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&format!("{}-{}", self.os.as_str(), self.arch.as_str()))
    }
}
