//! The dynamic-load primitive.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

/// The dynamic linker refused a library (bad ABI, missing symbol, missing
/// system dependency, ...).
#[derive(Error, Debug)]
#[error("Cannot load {}: {message}", path.display())]
pub struct NativeLoadError {
    /// Library that failed to load
    pub path: PathBuf,
    /// Reason reported by the platform loader
    pub message: String,
}

/// Maps a library file into the process.
///
/// Loading is irreversible for the lifetime of the process. Implementations
/// are called with the [`NativeLoader`](crate::NativeLoader) lock held, so
/// they never run concurrently with each other for the same loader.
pub trait DynamicLoader: Send + Sync {
    /// Load the library at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`NativeLoadError`] if the platform loader rejects the file.
    fn load(&self, path: &Path) -> Result<(), NativeLoadError>;
}

/// `dlopen`/`LoadLibraryExW` through `libloading`.
///
/// Handles are kept until the loader is dropped; a loader that lives for
/// the process keeps every library resident.
#[derive(Debug, Default)]
pub struct SystemLoader {
    libraries: Mutex<Vec<libloading::Library>>,
}

impl SystemLoader {
    /// Create a loader with no libraries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of libraries loaded through this loader.
    pub fn len(&self) -> usize {
        self.libraries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing was loaded yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DynamicLoader for SystemLoader {
    #[allow(unsafe_code)]
    fn load(&self, path: &Path) -> Result<(), NativeLoadError> {
        tracing::debug!("Loading native library {}", path.display());

        // SAFETY: Loading runs the library's initializers. The libraries come
        // from the application's own bundle, which is trusted in the same way
        // as the application binary itself.
        let library = unsafe { libloading::Library::new(path) }.map_err(|e| NativeLoadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        self.libraries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(library);
        Ok(())
    }
}
