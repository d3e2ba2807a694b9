//! Content-addressed extraction of library sets.
//!
//! A set (main library plus dependencies) is hashed as one stream and
//! written to `<root>/<package path>/<sha256>/`. Because the directory name
//! is derived from the bytes, a changed library never reuses a stale
//! directory, and an unchanged one is never rewritten.

use std::fs;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use natlib_schema::{ContentDigest, LibraryEntry};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::cache::{ExtractionKey, ExtractionRecord, LoadCache};
use crate::resource::{ResourceStore, resource_prefix};

/// Errors raised while extracting a library set.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// A declared library or dependency is not in the resource store
    #[error("Cannot load library {0}: resource not found")]
    MissingResource(String),

    /// A filename would escape the extraction directory
    #[error("Invalid library filename: {0:?}")]
    InvalidFilename(String),

    /// The resource store failed to open a resource
    #[error("Failed to open resource {path}: {source}")]
    Resource {
        /// Resource path
        path: String,
        /// Underlying error
        source: io::Error,
    },

    /// Reading a resource failed
    #[error("Failed to read resource {path}: {source}")]
    Read {
        /// Resource path
        path: String,
        /// Underlying error
        source: io::Error,
    },

    /// A filesystem operation in the cache directory failed
    #[error("IO error at {}: {source}", path.display())]
    Io {
        /// File or directory being written
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// No extraction root was configured and no home directory exists
    #[error("Could not determine home directory. Set NATLIB_HOME to override.")]
    NoCacheRoot,
}

/// Extracts library sets from a resource store into a cache root.
pub struct Extractor {
    root: PathBuf,
    store: Arc<dyn ResourceStore>,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl Extractor {
    /// Extract from `store` into `root`.
    pub fn new(root: impl Into<PathBuf>, store: Arc<dyn ResourceStore>) -> Self {
        Self {
            root: root.into(),
            store,
        }
    }

    /// Extraction root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every extracted set of `package`.
    pub fn package_dir(&self, package: &str) -> PathBuf {
        resource_prefix(package)
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |dir, segment| dir.join(segment))
    }

    /// Digest of a library set as served by the resource store.
    ///
    /// Every resource is opened before any byte is hashed, so a missing
    /// dependency is reported without reading the others.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::MissingResource`] for the first absent file
    /// and [`ExtractError::Read`] if reading fails.
    pub fn digest(&self, package: &str, entry: &LibraryEntry) -> Result<ContentDigest, ExtractError> {
        let prefix = resource_prefix(package);
        let mut streams = Vec::with_capacity(1 + entry.dependencies.len());
        for name in entry.filenames() {
            validate_filename(name)?;
            let path = format!("{prefix}{name}");
            let stream = self.open(&path)?;
            streams.push((path, stream));
        }

        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 65536]; // 64KB chunks
        for (path, mut stream) in streams {
            loop {
                let bytes_read = stream
                    .read(&mut buffer)
                    .map_err(|source| ExtractError::Read {
                        path: path.clone(),
                        source,
                    })?;
                if bytes_read == 0 {
                    break;
                }
                hasher.update(&buffer[..bytes_read]);
            }
        }

        let bytes: [u8; 32] = hasher.finalize().into();
        Ok(ContentDigest::from_bytes(&bytes))
    }

    /// Extract `entry` unless `cache` already holds it.
    ///
    /// A cache hit only reads the resources to digest them. On a miss each
    /// resource is hashed again while being copied to a temporary file, and
    /// the directory is named after the bytes actually written, even if the
    /// resource changed since the first pass. Files already present in the
    /// digest directory are left untouched. New files are renamed into place
    /// without clobbering, so a concurrent process never sees a partial file
    /// under the final name.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] if a resource is missing or unreadable, or
    /// the cache directory cannot be written.
    pub fn extract(
        &self,
        cache: &mut LoadCache,
        package: &str,
        entry: &LibraryEntry,
    ) -> Result<ExtractionRecord, ExtractError> {
        let digest = self.digest(package, entry)?;
        let package_dir = self.package_dir(package);
        let package_dir = std::path::absolute(&package_dir).map_err(|source| ExtractError::Io {
            path: package_dir.clone(),
            source,
        })?;
        let key = ExtractionKey::new(package_dir.join(digest.as_str()), entry);
        if let Some(record) = cache.extraction(&key) {
            tracing::debug!("Reusing extraction {digest} for {}", entry.library);
            return Ok(record.clone());
        }

        create_dir(&package_dir)?;
        let prefix = resource_prefix(package);
        let mut hasher = Sha256::new();
        let mut staged = Vec::with_capacity(1 + entry.dependencies.len());
        for name in entry.filenames() {
            let path = format!("{prefix}{name}");
            let tmp = stage(self.open(&path)?, &mut hasher, &path, &package_dir)?;
            staged.push((name, tmp));
        }
        let bytes: [u8; 32] = hasher.finalize().into();
        let written = ContentDigest::from_bytes(&bytes);
        if written != digest {
            tracing::warn!("{} changed during extraction", entry.library);
        }

        let dir = package_dir.join(written.as_str());
        let key = ExtractionKey::new(&dir, entry);
        if let Some(record) = cache.extraction(&key) {
            return Ok(record.clone());
        }
        create_dir(&dir)?;

        let mut paths = Vec::with_capacity(staged.len());
        for (name, tmp) in staged {
            let target = dir.join(name);
            if target.exists() {
                tracing::debug!("Already extracted: {}", target.display());
            } else {
                persist(tmp, &target)?;
            }
            paths.push(target);
        }

        let mut paths = paths.into_iter();
        let library = paths.next().ok_or_else(|| ExtractError::InvalidFilename(String::new()))?;
        let record = ExtractionRecord::new(written, library, paths.collect());
        tracing::info!(
            "Extracted {} ({} dependencies) to {}",
            entry.library,
            entry.dependencies.len(),
            dir.display()
        );
        cache.insert_extraction(key, record.clone());
        Ok(record)
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + '_>, ExtractError> {
        self.store
            .open(path)
            .map_err(|source| ExtractError::Resource {
                path: path.to_string(),
                source,
            })?
            .ok_or_else(|| ExtractError::MissingResource(path.to_string()))
    }
}

/// Feeds every byte read through the set's hasher.
struct HashingReader<'a, R> {
    inner: R,
    hasher: &'a mut Sha256,
}

impl<R: Read> Read for HashingReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }
}

/// Copy one resource into a temporary file in `dir`, hashing it on the way.
fn stage(
    stream: impl Read,
    hasher: &mut Sha256,
    resource: &str,
    dir: &Path,
) -> Result<NamedTempFile, ExtractError> {
    let mut tmp = tempfile::Builder::new()
        .prefix(".natlib-")
        .tempfile_in(dir)
        .map_err(|source| ExtractError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

    let mut reader = HashingReader {
        inner: stream,
        hasher,
    };
    io::copy(&mut reader, &mut tmp).map_err(|source| ExtractError::Read {
        path: resource.to_string(),
        source,
    })?;
    tmp.as_file().sync_all().map_err(|source| ExtractError::Io {
        path: tmp.path().to_path_buf(),
        source,
    })?;
    Ok(tmp)
}

fn persist(tmp: NamedTempFile, target: &Path) -> Result<(), ExtractError> {
    match tmp.persist_noclobber(target) {
        Ok(_) => {
            tracing::debug!("Wrote {}", target.display());
            Ok(())
        }
        // Another process extracted the same bytes first
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
            tracing::debug!("Lost extraction race for {}", target.display());
            Ok(())
        }
        Err(e) => Err(ExtractError::Io {
            path: target.to_path_buf(),
            source: e.error,
        }),
    }
}

fn create_dir(dir: &Path) -> Result<(), ExtractError> {
    fs::create_dir_all(dir).map_err(|source| ExtractError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

/// A filename must be a single plain path component.
fn validate_filename(name: &str) -> Result<(), ExtractError> {
    let mut components = Path::new(name).components();
    let valid = matches!(components.next(), Some(Component::Normal(c)) if c == name)
        && components.next().is_none()
        && !name.contains(['/', '\\']);
    if valid {
        Ok(())
    } else {
        Err(ExtractError::InvalidFilename(name.to_string()))
    }
}
