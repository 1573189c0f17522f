//! kvfs - a hierarchical filesystem view over a flat key-value store.
//!
//! File content lives in the store's value space under its path (leading
//! separators stripped); directories are marker keys with a trailing
//! separator in the metadata association. Listings are rebuilt from prefix
//! scans, and rename and recursive delete are composed from primitive calls.

pub mod config;
pub mod error;
pub mod navigate;
pub mod protocol;
pub mod storage;
pub mod store;

pub use config::{KvfsConfig, ParentPolicy};
pub use error::{FsError, StoreError};
pub use navigate::Session;
pub use storage::{Driver, DriverFactory, Entry, EntryKind, FileReader};
pub use store::{KvStore, MemoryStore};
