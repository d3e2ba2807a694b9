//! Well-known locations.
//!
//! ```text
//! ~/.natlib/
//! └── lib/
//!     └── us/ihmc/native/      # package prefix
//!         └── <sha256>/        # one directory per library set
//!             ├── libfoo.so
//!             └── libbar.so
//! ```

use dirs::home_dir;
use std::path::PathBuf;

/// Environment variable overriding the natlib home directory.
pub const HOME_ENV: &str = "NATLIB_HOME";

/// Returns the natlib home directory, or None if the user's home cannot be resolved.
pub fn try_natlib_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var(HOME_ENV) {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".natlib"))
}

/// Extraction root: ~/.natlib/lib
pub fn try_lib_path() -> Option<PathBuf> {
    try_natlib_home().map(|h| h.join("lib"))
}
