//! The loader service: platform resolution, extraction and load-once
//! bookkeeping behind a single lock.
//!
//! # Flow
//!
//! 1. Resolve the platform (cached per process, or overridden).
//! 2. Ask the descriptor for that platform's entries.
//! 3. For each entry not loaded yet: extract, load dependencies first on
//!    Windows, load the main library, record its identity.
//!
//! The lock is held for the whole flow. Loads are rare and a library must
//! never be handed to the platform loader twice at the same time.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use natlib_schema::{
    ContentDigest, DefaultLibraryDescriptor, LibraryDescriptor, LibraryEntry, LoadedIdentity,
    PlatformError, PlatformId,
};
use thiserror::Error;

use crate::cache::{ExtractionRecord, LoadCache};
use crate::extract::{ExtractError, Extractor};
use crate::native::{DynamicLoader, NativeLoadError, SystemLoader};
use crate::resource::{ResourceStore, resource_prefix};

/// Why a descriptor could not be loaded.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The host platform is not supported
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// The descriptor declares nothing for this platform
    #[error("No native libraries for {package} on {platform}")]
    NoLibraries {
        /// Package identifier
        package: String,
        /// Platform that was asked for
        platform: PlatformId,
    },

    /// Extraction failed
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// The platform loader rejected a library
    #[error(transparent)]
    NativeLoad(#[from] NativeLoadError),
}

/// Outcome of a successful [`NativeLoader::try_load`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Identities loaded by this call
    pub loaded: Vec<LoadedIdentity>,
    /// Identities that were already loaded and skipped
    pub already_loaded: Vec<LoadedIdentity>,
}

/// Extracts and loads bundled native libraries, each at most once.
///
/// Construct one per process, typically in a `static`:
///
/// ```no_run
/// use std::sync::LazyLock;
/// use natlib_core::{MemoryResourceStore, NativeLoader};
///
/// static LOADER: LazyLock<NativeLoader> = LazyLock::new(|| {
///     let store = MemoryResourceStore::from_static(&[
///         ("us/ihmc/physics/libphysics.so", &b"\x7fELF"[..]),
///     ]);
///     NativeLoader::builder(store).build().expect("natlib cache root")
/// });
///
/// LOADER.load_library("us.ihmc.physics", "physics");
/// ```
pub struct NativeLoader {
    extractor: Extractor,
    dynamic: Arc<dyn DynamicLoader>,
    platform: Option<Result<PlatformId, PlatformError>>,
    state: Mutex<LoadCache>,
}

impl std::fmt::Debug for NativeLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeLoader")
            .field("extractor", &self.extractor)
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

/// Configures a [`NativeLoader`].
pub struct NativeLoaderBuilder {
    store: Arc<dyn ResourceStore>,
    root: Option<PathBuf>,
    dynamic: Option<Arc<dyn DynamicLoader>>,
    platform: Option<Result<PlatformId, PlatformError>>,
}

impl std::fmt::Debug for NativeLoaderBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeLoaderBuilder")
            .field("root", &self.root)
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

impl NativeLoaderBuilder {
    /// Extract into `root` instead of `~/.natlib/lib`.
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Use `loader` instead of the system dynamic loader.
    pub fn dynamic_loader(mut self, loader: impl DynamicLoader + 'static) -> Self {
        self.dynamic = Some(Arc::new(loader));
        self
    }

    /// Pretend to run on `platform` instead of the host.
    pub fn platform(mut self, platform: PlatformId) -> Self {
        self.platform = Some(Ok(platform));
        self
    }

    /// Resolve the platform from `std::env::consts`-style host names
    /// instead of inspecting this process. An unsupported pair makes every
    /// load fail with [`LoadError::Platform`].
    pub fn host(mut self, os: &str, arch: &str) -> Self {
        self.platform = Some(PlatformId::from_host(os, arch));
        self
    }

    /// Build the loader.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::NoCacheRoot`] if no root was given and the
    /// home directory cannot be determined.
    pub fn build(self) -> Result<NativeLoader, ExtractError> {
        let root = match self.root {
            Some(root) => root,
            None => crate::paths::try_lib_path().ok_or(ExtractError::NoCacheRoot)?,
        };
        Ok(NativeLoader {
            extractor: Extractor::new(root, self.store),
            dynamic: self
                .dynamic
                .unwrap_or_else(|| Arc::new(SystemLoader::new())),
            platform: self.platform,
            state: Mutex::new(LoadCache::new()),
        })
    }
}

impl NativeLoader {
    /// Start configuring a loader that reads libraries from `store`.
    pub fn builder(store: impl ResourceStore + 'static) -> NativeLoaderBuilder {
        NativeLoaderBuilder {
            store: Arc::new(store),
            root: None,
            dynamic: None,
            platform: None,
        }
    }

    /// The platform libraries are selected for.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] if the host is unsupported and no override
    /// was configured.
    pub fn platform(&self) -> Result<PlatformId, PlatformError> {
        self.platform.clone().unwrap_or_else(PlatformId::current)
    }

    /// Extraction root.
    pub fn root(&self) -> &Path {
        self.extractor.root()
    }

    /// Directory holding every extracted set of `package`.
    pub fn package_dir(&self, package: &str) -> PathBuf {
        self.extractor.package_dir(package)
    }

    /// Digest an entry would be extracted under, without extracting it.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] if a resource is missing or unreadable.
    pub fn digest(&self, package: &str, entry: &LibraryEntry) -> Result<ContentDigest, ExtractError> {
        self.extractor.digest(package, entry)
    }

    /// Whether `library` (a platform filename) of `package` was loaded.
    pub fn is_loaded(&self, package: &str, library: &str) -> bool {
        self.lock().is_loaded(&LoadedIdentity::new(package, library))
    }

    /// Load every library `descriptor` declares for this platform.
    ///
    /// Returns false, after logging the reason, if the platform is
    /// unsupported, the descriptor has nothing for it, or extraction or
    /// loading fails. Libraries loaded before a failure stay loaded.
    pub fn load(&self, descriptor: &dyn LibraryDescriptor) -> bool {
        match self.try_load(descriptor) {
            Ok(_) => true,
            Err(e @ LoadError::NoLibraries { .. }) => {
                tracing::debug!("{e}");
                false
            }
            Err(e) => {
                tracing::warn!("Failed to load {}: {e}", descriptor.package());
                false
            }
        }
    }

    /// Like [`load`](Self::load), but reports why loading failed.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] describing the first failure.
    pub fn try_load(&self, descriptor: &dyn LibraryDescriptor) -> Result<LoadReport, LoadError> {
        let platform = self.platform()?;
        let package = descriptor.package();
        let entries = descriptor.entries_for(platform);
        if entries.is_empty() {
            return Err(LoadError::NoLibraries {
                package: package.to_string(),
                platform,
            });
        }

        let mut state = self.lock();
        let mut report = LoadReport::default();
        for entry in &entries {
            let identity = LoadedIdentity::new(package, &entry.library);
            if state.is_loaded(&identity) {
                tracing::debug!("{identity} already loaded");
                report.already_loaded.push(identity);
                continue;
            }

            let record = self.extractor.extract(&mut state, package, entry)?;

            // Windows does not search the library's own directory for its
            // dependencies, so they go in first, in declared order.
            if platform.preloads_dependencies() {
                for dependency in record.dependencies() {
                    self.dynamic.load(dependency)?;
                }
            }
            self.dynamic.load(record.library())?;

            tracing::debug!("Loaded {identity} from {}", record.library().display());
            state.mark_loaded(identity.clone());
            report.loaded.push(identity);
        }
        Ok(report)
    }

    /// Load logical library `name` of `package` on every platform.
    ///
    /// # Panics
    ///
    /// Panics if the library cannot be loaded. A missing required native
    /// library is not something callers can recover from.
    pub fn load_library(&self, package: &str, name: &str) {
        let descriptor = DefaultLibraryDescriptor::new(package, name);
        if let Err(e) = self.try_load(&descriptor) {
            panic!("Cannot load {}{name}: {e}", resource_prefix(package));
        }
    }

    /// Extract logical library `name` without loading it and return its
    /// absolute path.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Platform`] for an unsupported host and
    /// [`LoadError::Extract`] if extraction fails.
    pub fn extract_library(&self, package: &str, name: &str) -> Result<PathBuf, LoadError> {
        self.extract_libraries::<&str>(package, name, &[])
    }

    /// Extract logical library `name` and its logical dependencies into one
    /// directory without loading them. Returns the main library's path.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Platform`] for an unsupported host and
    /// [`LoadError::Extract`] if extraction fails.
    pub fn extract_libraries<S: AsRef<str>>(
        &self,
        package: &str,
        name: &str,
        dependencies: &[S],
    ) -> Result<PathBuf, LoadError> {
        let entry = LibraryEntry::for_platform(self.platform()?, name, dependencies);
        let record = self.extract_entry(package, &entry)?;
        Ok(record.library().to_path_buf())
    }

    /// Extract an entry of literal filenames without loading it.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] if extraction fails.
    pub fn extract_entry(
        &self,
        package: &str,
        entry: &LibraryEntry,
    ) -> Result<ExtractionRecord, ExtractError> {
        let mut state = self.lock();
        self.extractor.extract(&mut state, package, entry)
    }

    // The cache is only mutated after each step succeeds, so a panic in
    // another thread cannot leave it half-updated.
    fn lock(&self) -> MutexGuard<'_, LoadCache> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
