//! natlib core: extract bundled native libraries and load them once.
//!
//! # Overview
//!
//! An application bundles its shared libraries as resources (usually with
//! `include_bytes!`). At runtime a [`NativeLoader`] picks the files for the
//! host platform, extracts them into a content-addressed cache under
//! `~/.natlib/lib` and hands them to the platform's dynamic loader.
//!
//! - **Content addressing**: every library set is hashed (SHA-256) and
//!   extracted into a directory named after the digest, so upgrades never
//!   collide with stale files and repeated runs never rewrite them.
//! - **Load once**: each `<package>+<library>` identity reaches the dynamic
//!   loader at most once per [`NativeLoader`].
//! - **Dependency order**: on Windows dependencies are loaded explicitly, in
//!   declared order, before the library that needs them.

pub mod cache;
pub mod extract;
pub mod loader;
pub mod native;
pub mod paths;
pub mod resource;

pub use cache::{ExtractionKey, ExtractionRecord, LoadCache};
pub use extract::{ExtractError, Extractor};
pub use loader::{LoadError, LoadReport, NativeLoader, NativeLoaderBuilder};
pub use native::{DynamicLoader, NativeLoadError, SystemLoader};
pub use paths::*;
pub use resource::{DirResourceStore, MemoryResourceStore, ResourceStore, resource_prefix};

pub use natlib_schema as schema;
