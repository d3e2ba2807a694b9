//! Library descriptors: which files a package provides on each platform.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entry::LibraryEntry;
use crate::platform::{Arch, Os, PlatformId};

/// Describes the native libraries of one package.
///
/// An empty entry list from [`entries_for`](Self::entries_for) means the
/// package has nothing for that platform. That is a normal answer, not an
/// error.
pub trait LibraryDescriptor {
    /// Dot-separated package identifier (e.g. `us.ihmc.physics`), which is
    /// also the resource path prefix.
    fn package(&self) -> &str;

    /// Libraries to load on `platform`, in load order.
    fn entries_for(&self, platform: PlatformId) -> Vec<LibraryEntry>;
}

/// A single library with no dependencies, available on every platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultLibraryDescriptor {
    package: String,
    name: String,
}

impl DefaultLibraryDescriptor {
    /// Describe logical library `name` inside `package`.
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }

    /// The logical library name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl LibraryDescriptor for DefaultLibraryDescriptor {
    fn package(&self) -> &str {
        &self.package
    }

    fn entries_for(&self, platform: PlatformId) -> Vec<LibraryEntry> {
        vec![LibraryEntry::for_platform::<&str>(platform, &self.name, &[])]
    }
}

/// Errors from reading a [`LibraryManifest`].
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The manifest file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The manifest is not valid TOML or does not match the schema
    #[error("Invalid manifest: {0}")]
    Parse(#[from] toml::de::Error),

    /// The same platform appears in more than one `[[platform]]` table
    #[error("Platform {0} is declared more than once")]
    DuplicatePlatform(PlatformId),

    /// A library or dependency filename is empty
    #[error("Empty library filename for platform {0}")]
    EmptyFilename(PlatformId),
}

/// Libraries declared for one platform in a [`LibraryManifest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformLibraries {
    /// Operating system these libraries target
    pub os: Os,
    /// Architecture these libraries target
    pub arch: Arch,
    /// Libraries to load, in order
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
}

impl PlatformLibraries {
    /// The platform this table applies to.
    pub fn platform(&self) -> PlatformId {
        PlatformId::new(self.os, self.arch)
    }
}

/// Data-driven descriptor, usually read from a TOML file.
///
/// ```toml
/// package = "us.ihmc.example"
///
/// [[platform]]
/// os = "windows"
/// arch = "x64"
/// libraries = [{ library = "example.dll", dependencies = ["zlib.dll"] }]
///
/// [[platform]]
/// os = "linux"
/// arch = "x64"
/// libraries = [{ library = "libexample.so" }]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryManifest {
    /// Dot-separated package identifier
    pub package: String,

    /// Per-platform library tables
    #[serde(default, rename = "platform")]
    pub platforms: Vec<PlatformLibraries>,
}

impl LibraryManifest {
    /// Parse and validate a manifest from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Parse`] for malformed TOML,
    /// [`ManifestError::DuplicatePlatform`] if a platform is declared twice
    /// and [`ManifestError::EmptyFilename`] for blank filenames.
    pub fn from_toml(content: &str) -> Result<Self, ManifestError> {
        let manifest: Self = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Read a manifest file.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Io`] if the file cannot be read, otherwise
    /// the same errors as [`from_toml`](Self::from_toml).
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    fn validate(&self) -> Result<(), ManifestError> {
        let mut seen = std::collections::HashSet::new();
        for table in &self.platforms {
            let platform = table.platform();
            if !seen.insert(platform) {
                return Err(ManifestError::DuplicatePlatform(platform));
            }
            let blank = table
                .libraries
                .iter()
                .flat_map(LibraryEntry::filenames)
                .any(|name| name.trim().is_empty());
            if blank {
                return Err(ManifestError::EmptyFilename(platform));
            }
        }
        Ok(())
    }
}

impl LibraryDescriptor for LibraryManifest {
    fn package(&self) -> &str {
        &self.package
    }

    fn entries_for(&self, platform: PlatformId) -> Vec<LibraryEntry> {
        self.platforms
            .iter()
            .find(|table| table.platform() == platform)
            .map(|table| table.libraries.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
package = "us.ihmc.example"

[[platform]]
os = "windows"
arch = "x64"
libraries = [{ library = "example.dll", dependencies = ["zlib.dll", "png.dll"] }]

[[platform]]
os = "linux"
arch = "x86_64"
libraries = [{ library = "libexample.so" }]
"#;

    #[test]
    fn default_descriptor_on_every_platform() {
        let descriptor = DefaultLibraryDescriptor::new("us.ihmc.native", "ihmcNativeUtils");
        let expected = [
            (Os::Windows, "ihmcNativeUtils.dll"),
            (Os::Macos, "libihmcNativeUtils.dylib"),
            (Os::Linux, "libihmcNativeUtils.so"),
        ];
        for (os, filename) in expected {
            let entries = descriptor.entries_for(PlatformId::new(os, Arch::X64));
            assert_eq!(descriptor.package(), "us.ihmc.native");
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].library, filename);
            assert!(entries[0].dependencies.is_empty());
        }
    }

    #[test]
    fn manifest_entries_per_platform() {
        let manifest = LibraryManifest::from_toml(MANIFEST).unwrap();
        assert_eq!(manifest.package(), "us.ihmc.example");

        let windows = manifest.entries_for(PlatformId::new(Os::Windows, Arch::X64));
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].dependencies, ["zlib.dll", "png.dll"]);

        let linux = manifest.entries_for(PlatformId::new(Os::Linux, Arch::X64));
        assert_eq!(linux[0].library, "libexample.so");
        assert!(linux[0].dependencies.is_empty());
    }

    #[test]
    fn manifest_without_platform_yields_nothing() {
        let manifest = LibraryManifest::from_toml(MANIFEST).unwrap();
        assert!(
            manifest
                .entries_for(PlatformId::new(Os::Macos, Arch::Arm64))
                .is_empty()
        );
    }

    #[test]
    fn manifest_rejects_duplicate_platform() {
        let content = r#"
package = "p"
[[platform]]
os = "linux"
arch = "x64"
[[platform]]
os = "linux"
arch = "amd64"
"#;
        let err = LibraryManifest::from_toml(content).unwrap_err();
        assert!(matches!(err, ManifestError::DuplicatePlatform(_)));
    }

    #[test]
    fn manifest_rejects_blank_filename() {
        let content = r#"
package = "p"
[[platform]]
os = "macos"
arch = "arm64"
libraries = [{ library = "libp.dylib", dependencies = [" "] }]
"#;
        let err = LibraryManifest::from_toml(content).unwrap_err();
        assert!(matches!(err, ManifestError::EmptyFilename(_)));
    }

    #[test]
    fn manifest_rejects_unknown_arch() {
        let content = r#"
package = "p"
[[platform]]
os = "linux"
arch = "x86"
"#;
        assert!(matches!(
            LibraryManifest::from_toml(content),
            Err(ManifestError::Parse(_))
        ));
    }
}
