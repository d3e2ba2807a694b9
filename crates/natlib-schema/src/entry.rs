//! Library entries: a main file plus its load-time dependencies.

use serde::{Deserialize, Serialize};

use crate::platform::PlatformId;

/// A library file together with the files it needs at load time.
///
/// Dependency order is load order on platforms that preload dependencies,
/// so it is kept exactly as declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LibraryEntry {
    /// Filename of the library itself (e.g. `libphysics.so`)
    pub library: String,

    /// Filenames of its dependencies, in load order
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl LibraryEntry {
    /// Create an entry from literal filenames.
    pub fn from_filenames<I, S>(library: impl Into<String>, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            library: library.into(),
            dependencies: dependencies.into_iter().map(Into::into).collect(),
        }
    }

    /// Create an entry from logical names, mapping every name (library and
    /// dependencies) through the platform filename table.
    pub fn for_platform<S: AsRef<str>>(platform: PlatformId, name: &str, dependencies: &[S]) -> Self {
        Self {
            library: platform.library_filename(name),
            dependencies: dependencies
                .iter()
                .map(|d| platform.library_filename(d.as_ref()))
                .collect(),
        }
    }

    /// All filenames, library first, then dependencies in declared order.
    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.library.as_str()).chain(self.dependencies.iter().map(String::as_str))
    }
}
