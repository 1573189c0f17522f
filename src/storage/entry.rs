//! Visible entries
//!
//! An [`Entry`] is what stat and list hand back to the protocol layer. It is
//! derived on demand from a storage key, its metadata and, for files, the
//! content length; it is never stored as a record of its own.

use chrono::{DateTime, Utc};

use crate::storage::metadata::EntryKind;

/// Owner and group reported for every entry.
pub const OWNER: &str = "root";
pub const GROUP: &str = "root";

const MODE_DIR: u32 = 0o040000;
const MODE_PERM: u32 = 0o777;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
    pub mod_time: i64,
    pub size: u64,
}

impl Entry {
    pub fn file(name: impl Into<String>, mod_time: i64, size: u64) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            mod_time,
            size,
        }
    }

    /// Directories always report size 0.
    pub fn directory(name: impl Into<String>, mod_time: i64) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
            mod_time,
            size: 0,
        }
    }

    /// Synthetic entry for the root directory, which has no marker key.
    pub fn root() -> Self {
        Self::directory("/", 0)
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn owner(&self) -> &'static str {
        OWNER
    }

    pub fn group(&self) -> &'static str {
        GROUP
    }

    /// Unix mode bits: every permission set, plus the directory bit.
    pub fn mode(&self) -> u32 {
        if self.is_dir() {
            MODE_DIR | MODE_PERM
        } else {
            MODE_PERM
        }
    }

    pub fn modified(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.mod_time, 0).unwrap_or_default()
    }

    /// Renders the entry the way `ls -l` style LIST output does.
    pub fn list_line(&self) -> String {
        let type_char = if self.is_dir() { 'd' } else { '-' };
        format!(
            "{}rwxrwxrwx 1 {} {} {:>12} {} {}",
            type_char,
            self.owner(),
            self.group(),
            self.size,
            self.modified().format("%b %d %H:%M"),
            self.name
        )
    }
}
