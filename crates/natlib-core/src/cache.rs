//! In-memory bookkeeping for one loader service.
//!
//! Nothing here is persisted: a new process re-checks the extracted files on
//! disk (cheap, they are skipped when present) and re-loads its libraries.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use natlib_schema::{ContentDigest, LibraryEntry, LoadedIdentity};

/// Identifies one extraction: the digest directory and the filenames placed
/// in it.
///
/// The digest alone is not enough. Two packages can ship identical bytes,
/// and two entries of one package can concatenate to the same stream under
/// different filenames.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtractionKey {
    dir: PathBuf,
    filenames: Vec<String>,
}

impl ExtractionKey {
    /// Key for `entry` extracted into `dir`.
    pub fn new(dir: impl Into<PathBuf>, entry: &LibraryEntry) -> Self {
        Self {
            dir: dir.into(),
            filenames: entry.filenames().map(str::to_string).collect(),
        }
    }
}

/// Where a library set was extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRecord {
    digest: ContentDigest,
    library: PathBuf,
    dependencies: Vec<PathBuf>,
}

impl ExtractionRecord {
    pub(crate) fn new(digest: ContentDigest, library: PathBuf, dependencies: Vec<PathBuf>) -> Self {
        Self {
            digest,
            library,
            dependencies,
        }
    }

    /// Digest of the set, also the name of its directory.
    pub fn digest(&self) -> &ContentDigest {
        &self.digest
    }

    /// Absolute path of the main library.
    pub fn library(&self) -> &Path {
        &self.library
    }

    /// Absolute paths of the dependencies, in declared order.
    pub fn dependencies(&self) -> &[PathBuf] {
        &self.dependencies
    }

    /// Every path, main library first.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.library.as_path()).chain(self.dependencies.iter().map(PathBuf::as_path))
    }
}

/// Extraction records by [`ExtractionKey`], plus the identities already handed to the
/// dynamic loader.
///
/// Entries are never evicted. The owning [`NativeLoader`](crate::NativeLoader)
/// guards the whole cache with one lock.
#[derive(Debug, Default)]
pub struct LoadCache {
    extracted: HashMap<ExtractionKey, ExtractionRecord>,
    loaded: HashSet<LoadedIdentity>,
}

impl LoadCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for a previously extracted set.
    pub fn extraction(&self, key: &ExtractionKey) -> Option<&ExtractionRecord> {
        self.extracted.get(key)
    }

    /// Remember an extraction.
    pub fn insert_extraction(&mut self, key: ExtractionKey, record: ExtractionRecord) {
        self.extracted.insert(key, record);
    }

    /// Whether `identity` was already loaded.
    pub fn is_loaded(&self, identity: &LoadedIdentity) -> bool {
        self.loaded.contains(identity)
    }

    /// Mark `identity` as loaded. Returns false if it already was.
    pub fn mark_loaded(&mut self, identity: LoadedIdentity) -> bool {
        self.loaded.insert(identity)
    }

    /// Number of distinct library sets extracted.
    pub fn extracted_count(&self) -> usize {
        self.extracted.len()
    }

    /// Number of libraries loaded.
    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }
}
