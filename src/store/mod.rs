//! Primitive store contract
//!
//! The filesystem view is layered over a flat key-value engine that offers
//! two key spaces sharing one key namespace:
//!
//! - the value space, a key to byte-string mapping holding file content
//! - the metadata association, a key to field-map mapping holding
//!   modification times and directory markers
//!
//! Both spaces can be enumerated with a regex pattern scan that resumes
//! after a cursor key. [`MemoryStore`] is a complete in-process engine.

pub mod memory;

use std::collections::BTreeMap;

use crate::error::StoreError;

pub use memory::{MemoryStore, Primitive};

/// Field map stored in the metadata association for one key.
pub type Fields = BTreeMap<Vec<u8>, Vec<u8>>;

/// Which key space a scan enumerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Space {
    Value,
    Meta,
}

/// Optional features a store may offer beyond the required primitives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// [`KvStore::apply_batch`] applies every operation or none of them.
    pub atomic_batch: bool,
}

/// One mutation inside an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Set { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
    SetFields { key: Vec<u8>, fields: Fields },
    ClearFields { key: Vec<u8> },
}

/// Primitives the filesystem view needs from a key-value engine.
///
/// Calls are synchronous and short. Retry policy, if any, belongs to the
/// implementation; callers never retry.
pub trait KvStore: Send + Sync {
    /// Whether `key` exists in the value space.
    fn exists(&self, key: &[u8]) -> Result<bool, StoreError>;

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// Appends to the value (creating it if absent) and returns the new length.
    fn append(&self, key: &[u8], value: &[u8]) -> Result<u64, StoreError>;

    /// Length of the value, 0 when absent.
    fn strlen(&self, key: &[u8]) -> Result<u64, StoreError>;

    /// Bytes `start..end` of the value, clamped to its length. `None` reads to
    /// the end. Absent keys yield an empty buffer.
    fn get_range(&self, key: &[u8], start: u64, end: Option<u64>)
    -> Result<Vec<u8>, StoreError>;

    /// Removes keys from the value space, returning how many existed.
    fn delete(&self, keys: &[Vec<u8>]) -> Result<u64, StoreError>;

    /// Whether `key` has any field in the metadata association.
    fn meta_exists(&self, key: &[u8]) -> Result<bool, StoreError>;

    fn meta_get(&self, key: &[u8], field: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    fn meta_get_all(&self, key: &[u8]) -> Result<Fields, StoreError>;

    /// Sets the given fields, leaving other fields of `key` untouched.
    fn meta_set(&self, key: &[u8], fields: &Fields) -> Result<(), StoreError>;

    /// Drops every field of every key, returning how many keys had metadata.
    fn meta_clear(&self, keys: &[Vec<u8>]) -> Result<u64, StoreError>;

    /// Up to `count` keys of `space` matching `pattern`, in ascending order,
    /// strictly after `cursor`. An empty cursor starts from the beginning.
    fn scan(
        &self,
        space: Space,
        cursor: &[u8],
        count: usize,
        pattern: &str,
    ) -> Result<Vec<Vec<u8>>, StoreError>;

    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    /// Applies all operations atomically. Only meaningful when
    /// [`Capabilities::atomic_batch`] is set.
    fn apply_batch(&self, _ops: Vec<BatchOp>) -> Result<(), StoreError> {
        Err(StoreError::Unsupported("atomic batches"))
    }
}
