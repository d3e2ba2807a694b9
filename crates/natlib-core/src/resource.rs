//! Resource stores: where bundled library bytes come from.
//!
//! A store maps slash-separated resource paths (`us/ihmc/native/libfoo.so`)
//! to byte streams. Binaries usually embed their libraries with
//! `include_bytes!` into a [`MemoryResourceStore`]; packaging tools and tests
//! read them from a directory with [`DirResourceStore`].

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Provider of resource byte streams.
pub trait ResourceStore: Send + Sync {
    /// Open the resource at `path`.
    ///
    /// Returns `Ok(None)` when no such resource exists.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the resource exists but cannot be opened.
    fn open(&self, path: &str) -> io::Result<Option<Box<dyn Read + '_>>>;
}

impl<T: ResourceStore + ?Sized> ResourceStore for Arc<T> {
    fn open(&self, path: &str) -> io::Result<Option<Box<dyn Read + '_>>> {
        (**self).open(path)
    }
}

/// Resource path prefix of a package: dots become slashes and a trailing
/// slash is added unless the package is empty.
///
/// # Example
///
/// ```
/// use natlib_core::resource_prefix;
///
/// assert_eq!(resource_prefix("us.ihmc.native"), "us/ihmc/native/");
/// assert_eq!(resource_prefix(""), "");
/// ```
pub fn resource_prefix(package: &str) -> String {
    let prefix = package.trim().replace('.', "/");
    if prefix.is_empty() {
        prefix
    } else {
        prefix + "/"
    }
}

/// Resources laid out as plain files under a directory.
#[derive(Debug, Clone)]
pub struct DirResourceStore {
    root: PathBuf,
}

impl DirResourceStore {
    /// Serve resources from `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory resources are served from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let relative = Path::new(path);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Resource path escapes store root: {path}"),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl ResourceStore for DirResourceStore {
    fn open(&self, path: &str) -> io::Result<Option<Box<dyn Read + '_>>> {
        let full = self.resolve(path)?;
        if !full.is_file() {
            return Ok(None);
        }
        match File::open(&full) {
            Ok(file) => Ok(Some(Box::new(file))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Resources held in memory, either owned or `'static` (embedded).
#[derive(Debug, Clone, Default)]
pub struct MemoryResourceStore {
    resources: HashMap<String, Cow<'static, [u8]>>,
}

impl MemoryResourceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from embedded `(path, bytes)` pairs.
    ///
    /// ```
    /// use natlib_core::MemoryResourceStore;
    ///
    /// static RESOURCES: &[(&str, &[u8])] = &[("us/ihmc/libfoo.so", b"\x7fELF")];
    /// let store = MemoryResourceStore::from_static(RESOURCES);
    /// assert!(store.contains("us/ihmc/libfoo.so"));
    /// ```
    pub fn from_static(resources: &[(&'static str, &'static [u8])]) -> Self {
        Self {
            resources: resources
                .iter()
                .map(|&(path, bytes)| (path.to_string(), Cow::Borrowed(bytes)))
                .collect(),
        }
    }

    /// Add or replace a resource.
    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Cow<'static, [u8]>>) {
        self.resources.insert(path.into(), bytes.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, path: impl Into<String>, bytes: impl Into<Cow<'static, [u8]>>) -> Self {
        self.insert(path, bytes);
        self
    }

    /// Check whether a resource exists.
    pub fn contains(&self, path: &str) -> bool {
        self.resources.contains_key(path)
    }
}

impl ResourceStore for MemoryResourceStore {
    fn open(&self, path: &str) -> io::Result<Option<Box<dyn Read + '_>>> {
        Ok(self
            .resources
            .get(path)
            .map(|bytes| Box::new(Cursor::new(&bytes[..])) as Box<dyn Read + '_>))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn read_all(store: &dyn ResourceStore, path: &str) -> Option<Vec<u8>> {
        let mut reader = store.open(path).unwrap()?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).unwrap();
        Some(buf)
    }

    #[test]
    fn prefix_rules() {
        assert_eq!(resource_prefix("us.ihmc.native"), "us/ihmc/native/");
        assert_eq!(resource_prefix("  single "), "single/");
        assert_eq!(resource_prefix("   "), "");
    }

    #[test]
    fn memory_store_serves_bytes() {
        let store = MemoryResourceStore::new()
            .with("a/libx.so", b"abc".to_vec())
            .with("a/liby.so", &b"static"[..]);
        assert_eq!(read_all(&store, "a/libx.so").unwrap(), b"abc");
        assert_eq!(read_all(&store, "a/liby.so").unwrap(), b"static");
        assert!(read_all(&store, "a/missing.so").is_none());
    }

    #[test]
    fn dir_store_serves_files() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("us/ihmc")).unwrap();
        std::fs::write(dir.path().join("us/ihmc/libfoo.so"), b"foo").unwrap();

        let store = DirResourceStore::new(dir.path());
        assert_eq!(read_all(&store, "us/ihmc/libfoo.so").unwrap(), b"foo");
        assert!(read_all(&store, "us/ihmc/libbar.so").is_none());
        // Directories are not resources
        assert!(read_all(&store, "us/ihmc").is_none());
    }

    #[test]
    fn dir_store_rejects_escaping_paths() {
        let dir = tempdir().unwrap();
        let store = DirResourceStore::new(dir.path());
        assert!(store.open("../etc/passwd").is_err());
        assert!(store.open("/etc/passwd").is_err());
    }
}
