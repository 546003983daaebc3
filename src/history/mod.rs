//! History Store: bounded, deduplicated record of past invocations.
//!
//! Persisted through the [`Storage`] interface as a JSON array under a single
//! key. [`FileStorage`] keeps one file per key in the application data
//! directory; [`MemoryStorage`] backs tests and ephemeral sessions.

pub mod storage;
pub mod store;

pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::HistoryStore;

use std::path::PathBuf;

/// Default directory for [`FileStorage`]: `<data_dir>/command-palette`
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("command-palette"))
}
