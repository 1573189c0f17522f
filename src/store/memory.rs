//! In-memory primitive store backed by `BTreeMap`s.
//!
//! All data lives behind a single `parking_lot::RwLock`, so an atomic batch
//! is simply a sequence of mutations applied under one write guard. Faults
//! can be armed per primitive to exercise failure paths.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use log::debug;
use parking_lot::{Mutex, RwLock};
use regex::bytes::Regex;

use crate::error::StoreError;
use crate::store::{BatchOp, Capabilities, Fields, KvStore, Space};

/// Names each primitive so a fault can be armed against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Exists,
    Get,
    Set,
    Append,
    Strlen,
    GetRange,
    Delete,
    MetaExists,
    MetaGet,
    MetaGetAll,
    MetaSet,
    MetaClear,
    Scan,
    Batch,
}

#[derive(Default)]
struct Inner {
    values: BTreeMap<Vec<u8>, Vec<u8>>,
    meta: BTreeMap<Vec<u8>, Fields>,
}

impl Inner {
    fn apply(&mut self, op: BatchOp) {
        match op {
            BatchOp::Set { key, value } => {
                self.values.insert(key, value);
            }
            BatchOp::Delete { key } => {
                self.values.remove(&key);
            }
            BatchOp::SetFields { key, fields } => {
                if !fields.is_empty() {
                    self.meta.entry(key).or_default().extend(fields);
                }
            }
            BatchOp::ClearFields { key } => {
                self.meta.remove(&key);
            }
        }
    }
}

/// In-memory key-value engine.
pub struct MemoryStore {
    inner: RwLock<Inner>,
    faults: Mutex<HashMap<Primitive, usize>>,
    atomic_batch: bool,
}

impl MemoryStore {
    /// Create a new, empty store that supports atomic batches.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            faults: Mutex::new(HashMap::new()),
            atomic_batch: true,
        }
    }

    /// Create a store that reports no optional capabilities.
    pub fn without_batches() -> Self {
        Self {
            atomic_batch: false,
            ..Self::new()
        }
    }

    /// Make the next `times` calls of `primitive` fail.
    pub fn fail_next(&self, primitive: Primitive, times: usize) {
        self.faults.lock().insert(primitive, times);
    }

    /// Number of keys in the value space.
    pub fn value_len(&self) -> usize {
        self.inner.read().values.len()
    }

    /// Number of keys in the metadata association.
    pub fn meta_len(&self) -> usize {
        self.inner.read().meta.len()
    }

    fn check_fault(&self, primitive: Primitive) -> Result<(), StoreError> {
        let mut faults = self.faults.lock();
        if let Some(remaining) = faults.get_mut(&primitive) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(StoreError::Injected(format!("{primitive:?}")));
            }
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Collect up to `count` keys after `cursor` that match `regex`.
fn collect_matches<'a, V: 'a>(
    map: &'a BTreeMap<Vec<u8>, V>,
    cursor: &[u8],
    count: usize,
    regex: &Regex,
) -> Vec<Vec<u8>> {
    let start = if cursor.is_empty() {
        Bound::Unbounded
    } else {
        Bound::Excluded(cursor.to_vec())
    };

    map.range((start, Bound::Unbounded))
        .map(|(k, _)| k)
        .filter(|k| regex.is_match(k.as_slice()))
        .take(count)
        .cloned()
        .collect()
}

impl KvStore for MemoryStore {
    fn exists(&self, key: &[u8]) -> Result<bool, StoreError> {
        self.check_fault(Primitive::Exists)?;
        Ok(self.inner.read().values.contains_key(key))
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.check_fault(Primitive::Get)?;
        Ok(self.inner.read().values.get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.check_fault(Primitive::Set)?;
        self.inner.write().values.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn append(&self, key: &[u8], value: &[u8]) -> Result<u64, StoreError> {
        self.check_fault(Primitive::Append)?;
        let mut inner = self.inner.write();
        let entry = inner.values.entry(key.to_vec()).or_default();
        entry.extend_from_slice(value);
        Ok(entry.len() as u64)
    }

    fn strlen(&self, key: &[u8]) -> Result<u64, StoreError> {
        self.check_fault(Primitive::Strlen)?;
        Ok(self
            .inner
            .read()
            .values
            .get(key)
            .map(|v| v.len() as u64)
            .unwrap_or(0))
    }

    fn get_range(
        &self,
        key: &[u8],
        start: u64,
        end: Option<u64>,
    ) -> Result<Vec<u8>, StoreError> {
        self.check_fault(Primitive::GetRange)?;
        let inner = self.inner.read();
        let Some(value) = inner.values.get(key) else {
            return Ok(Vec::new());
        };
        let len = value.len();
        let start = (start as usize).min(len);
        let end = end.map(|e| (e as usize).min(len)).unwrap_or(len);
        if start >= end {
            return Ok(Vec::new());
        }
        Ok(value[start..end].to_vec())
    }

    fn delete(&self, keys: &[Vec<u8>]) -> Result<u64, StoreError> {
        self.check_fault(Primitive::Delete)?;
        let mut inner = self.inner.write();
        Ok(keys
            .iter()
            .filter(|k| inner.values.remove(k.as_slice()).is_some())
            .count() as u64)
    }

    fn meta_exists(&self, key: &[u8]) -> Result<bool, StoreError> {
        self.check_fault(Primitive::MetaExists)?;
        Ok(self.inner.read().meta.contains_key(key))
    }

    fn meta_get(&self, key: &[u8], field: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.check_fault(Primitive::MetaGet)?;
        Ok(self
            .inner
            .read()
            .meta
            .get(key)
            .and_then(|fields| fields.get(field))
            .cloned())
    }

    fn meta_get_all(&self, key: &[u8]) -> Result<Fields, StoreError> {
        self.check_fault(Primitive::MetaGetAll)?;
        Ok(self.inner.read().meta.get(key).cloned().unwrap_or_default())
    }

    fn meta_set(&self, key: &[u8], fields: &Fields) -> Result<(), StoreError> {
        self.check_fault(Primitive::MetaSet)?;
        self.inner.write().apply(BatchOp::SetFields {
            key: key.to_vec(),
            fields: fields.clone(),
        });
        Ok(())
    }

    fn meta_clear(&self, keys: &[Vec<u8>]) -> Result<u64, StoreError> {
        self.check_fault(Primitive::MetaClear)?;
        let mut inner = self.inner.write();
        Ok(keys
            .iter()
            .filter(|k| inner.meta.remove(k.as_slice()).is_some())
            .count() as u64)
    }

    fn scan(
        &self,
        space: Space,
        cursor: &[u8],
        count: usize,
        pattern: &str,
    ) -> Result<Vec<Vec<u8>>, StoreError> {
        self.check_fault(Primitive::Scan)?;
        let regex = Regex::new(pattern).map_err(|e| StoreError::InvalidPattern(e.to_string()))?;
        let inner = self.inner.read();
        let keys = match space {
            Space::Value => collect_matches(&inner.values, cursor, count, &regex),
            Space::Meta => collect_matches(&inner.meta, cursor, count, &regex),
        };
        debug!(
            "scan {:?} pattern={} cursor={:?} -> {} keys",
            space,
            pattern,
            String::from_utf8_lossy(cursor),
            keys.len()
        );
        Ok(keys)
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            atomic_batch: self.atomic_batch,
        }
    }

    fn apply_batch(&self, ops: Vec<BatchOp>) -> Result<(), StoreError> {
        if !self.atomic_batch {
            return Err(StoreError::Unsupported("atomic batches"));
        }
        self.check_fault(Primitive::Batch)?;
        let mut inner = self.inner.write();
        for op in ops {
            inner.apply(op);
        }
        Ok(())
    }
}
