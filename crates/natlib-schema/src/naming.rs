//! Platform-specific library filenames.
//!
//! Packaging tools place resources under exactly these names, so the table
//! below is a compatibility contract:
//!
//! ```text
//! linux    lib<name>[-arm64].so
//! windows  <name>[-arm64].dll
//! macos    lib<name>[-arm64].dylib
//! ```
//!
//! `std::env::consts::DLL_PREFIX` is deliberately not used: the names must
//! be computable for any target, not just the host.

use crate::platform::{Arch, Os, PlatformId};

impl Os {
    /// Filename prefix for shared libraries.
    pub fn library_prefix(&self) -> &'static str {
        match self {
            Self::Windows => "",
            Self::Macos | Self::Linux => "lib",
        }
    }

    /// Filename extension for shared libraries, including the dot.
    pub fn library_extension(&self) -> &'static str {
        match self {
            Self::Windows => ".dll",
            Self::Macos => ".dylib",
            Self::Linux => ".so",
        }
    }
}

impl Arch {
    /// Marker inserted before the extension. Empty for the primary
    /// architecture.
    pub fn library_suffix(&self) -> &'static str {
        match self {
            Self::X64 => "",
            Self::Arm64 => "-arm64",
        }
    }
}

/// Map a logical library name to its filename on `os`/`arch`.
///
/// # Example
///
/// ```
/// use natlib_schema::{Arch, Os, platform_filename};
///
/// assert_eq!(platform_filename(Os::Linux, Arch::X64, "physics"), "libphysics.so");
/// assert_eq!(platform_filename(Os::Windows, Arch::Arm64, "physics"), "physics-arm64.dll");
/// ```
pub fn platform_filename(os: Os, arch: Arch, name: &str) -> String {
    format!(
        "{}{name}{}{}",
        os.library_prefix(),
        arch.library_suffix(),
        os.library_extension()
    )
}

impl PlatformId {
    /// Filename of logical library `name` on this platform.
    pub fn library_filename(&self, name: &str) -> String {
        platform_filename(self.os, self.arch, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naming_table() {
        let cases = [
            (Os::Linux, Arch::X64, "libfoo.so"),
            (Os::Linux, Arch::Arm64, "libfoo-arm64.so"),
            (Os::Windows, Arch::X64, "foo.dll"),
            (Os::Windows, Arch::Arm64, "foo-arm64.dll"),
            (Os::Macos, Arch::X64, "libfoo.dylib"),
            (Os::Macos, Arch::Arm64, "libfoo-arm64.dylib"),
        ];
        for (os, arch, expected) in cases {
            assert_eq!(platform_filename(os, arch, "foo"), expected, "{os}-{arch}");
        }
    }

    #[test]
    fn ihmc_native_utils() {
        assert_eq!(
            platform_filename(Os::Linux, Arch::X64, "ihmcNativeUtils"),
            "libihmcNativeUtils.so"
        );
        assert_eq!(
            PlatformId::new(Os::Macos, Arch::X64).library_filename("ihmcNativeUtils"),
            "libihmcNativeUtils.dylib"
        );
    }
}
