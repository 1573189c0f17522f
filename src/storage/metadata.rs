//! Entry metadata
//!
//! Each file key and each directory marker key carries a small field map in
//! the store's metadata association. Two fields are used: `modTime`, a Unix
//! timestamp in decimal, and `kind`, either `dir` or `file`.

use chrono::Utc;

use crate::error::StoreError;
use crate::store::{Fields, KvStore};

pub const MOD_TIME_FIELD: &[u8] = b"modTime";
pub const KIND_FIELD: &[u8] = b"kind";

/// What a storage key represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            EntryKind::File => b"file",
            EntryKind::Directory => b"dir",
        }
    }

    fn parse(raw: &[u8]) -> Option<Self> {
        match raw {
            b"file" => Some(EntryKind::File),
            b"dir" => Some(EntryKind::Directory),
            _ => None,
        }
    }
}

/// Decoded metadata record for one storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMeta {
    pub kind: EntryKind,
    pub mod_time: i64,
}

impl EntryMeta {
    pub fn new(kind: EntryKind, mod_time: i64) -> Self {
        Self { kind, mod_time }
    }

    /// Fresh record stamped with the current time.
    pub fn now(kind: EntryKind) -> Self {
        Self::new(kind, now_unix())
    }

    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert(MOD_TIME_FIELD.to_vec(), self.mod_time.to_string().into_bytes());
        fields.insert(KIND_FIELD.to_vec(), self.kind.as_bytes().to_vec());
        fields
    }

    /// Decodes a field map, or `None` when the key has no metadata at all.
    ///
    /// Records without a `kind` field are classified by their key: marker
    /// keys end in a separator. A missing or malformed `modTime` reads as 0.
    pub fn from_fields(key: &[u8], fields: &Fields) -> Option<Self> {
        if fields.is_empty() {
            return None;
        }
        let kind = fields
            .get(KIND_FIELD)
            .and_then(|raw| EntryKind::parse(raw))
            .unwrap_or_else(|| kind_from_key(key));
        let mod_time = fields
            .get(MOD_TIME_FIELD)
            .map(|raw| parse_mod_time(raw))
            .unwrap_or(0);
        Some(Self::new(kind, mod_time))
    }
}

fn kind_from_key(key: &[u8]) -> EntryKind {
    if key.ends_with(b"/") {
        EntryKind::Directory
    } else {
        EntryKind::File
    }
}

fn parse_mod_time(raw: &[u8]) -> i64 {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

/// Current time as a Unix timestamp in seconds.
pub fn now_unix() -> i64 {
    Utc::now().timestamp()
}

/// Reads `modTime` for `key`, defaulting to 0 when absent.
pub fn read_mod_time(store: &dyn KvStore, key: &[u8]) -> Result<i64, StoreError> {
    Ok(store
        .meta_get(key, MOD_TIME_FIELD)?
        .map(|raw| parse_mod_time(&raw))
        .unwrap_or(0))
}

/// Stamps `key` with the current time and the given kind.
pub fn touch(store: &dyn KvStore, key: &[u8], kind: EntryKind) -> Result<i64, StoreError> {
    let meta = EntryMeta::now(kind);
    store.meta_set(key, &meta.to_fields())?;
    Ok(meta.mod_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_fields_round_trip_kind_and_time() {
        let meta = EntryMeta::new(EntryKind::Directory, 1_700_000_000);
        let decoded = EntryMeta::from_fields(b"a/", &meta.to_fields());
        assert_eq!(decoded, Some(meta));
    }

    #[test]
    fn test_missing_kind_falls_back_to_key_shape() {
        let mut fields = Fields::new();
        fields.insert(MOD_TIME_FIELD.to_vec(), b"42".to_vec());

        let dir = EntryMeta::from_fields(b"a/", &fields).unwrap();
        assert_eq!(dir.kind, EntryKind::Directory);
        assert_eq!(dir.mod_time, 42);

        let file = EntryMeta::from_fields(b"a/b", &fields).unwrap();
        assert_eq!(file.kind, EntryKind::File);
    }

    #[test]
    fn test_empty_fields_mean_no_metadata() {
        assert_eq!(EntryMeta::from_fields(b"a", &Fields::new()), None);
    }

    #[test]
    fn test_read_mod_time_defaults_to_zero() {
        let store = MemoryStore::new();
        assert_eq!(read_mod_time(&store, b"missing").unwrap(), 0);

        let stamped = touch(&store, b"f", EntryKind::File).unwrap();
        assert_eq!(read_mod_time(&store, b"f").unwrap(), stamped);
    }
}
