//! Virtual filesystem storage
//!
//! Maps a directory tree onto the flat key space of a [`KvStore`](crate::store::KvStore):
//! path mapping, entry metadata, directory scans, structural operations and
//! file content transfer.

pub mod driver;
pub mod entry;
pub mod file_ops;
pub mod metadata;
pub mod operations;
pub mod path;
pub mod reader;
pub mod scanner;

pub use driver::{Driver, DriverFactory};
pub use entry::Entry;
pub use metadata::{EntryKind, EntryMeta};
pub use reader::FileReader;
