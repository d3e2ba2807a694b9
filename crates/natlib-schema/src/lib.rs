//! Shared types for natlib: platforms, library filenames, descriptors and
//! cache keys.
//!
//! Nothing here touches the resource store or the cache directory; see
//! `natlib-core` for extraction and loading.

pub mod descriptor;
pub mod digest;
pub mod entry;
pub mod naming;
pub mod platform;

// Re-exports
pub use descriptor::*;
pub use digest::*;
pub use entry::*;
pub use naming::*;
pub use platform::*;
