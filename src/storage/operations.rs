//! Storage operations
//!
//! Stat and the structural operations: make-directory, delete-file,
//! delete-directory and rename. Each is composed from primitive store calls.
//! When the store offers atomic batches, rename and each round of directory
//! deletion are committed as one batch; otherwise they run step by step.

use log::{debug, error, info, warn};

use crate::config::ParentPolicy;
use crate::error::{FsError, StoreError};
use crate::storage::driver::Driver;
use crate::storage::entry::Entry;
use crate::storage::metadata::{EntryKind, EntryMeta, read_mod_time, touch};
use crate::storage::path::{
    ancestors, base_name, dir_prefix, is_root, marker_key, parent_path, to_storage_key,
};
use crate::store::{BatchOp, Fields, KvStore, Space};

impl Driver {
    /// Resolves `path` to a visible entry.
    ///
    /// The value space wins: a path with content is a file. Otherwise the
    /// marker key decides whether it is a directory.
    pub fn stat(&self, path: &str) -> Result<Entry, FsError> {
        if is_root(path) {
            return Ok(Entry::root());
        }

        let key = to_storage_key(path);
        if self.store.exists(&key)? {
            let mod_time = read_mod_time(self.store.as_ref(), &key)?;
            let size = self.store.strlen(&key)?;
            debug!("stat {} -> file ({} bytes)", path, size);
            return Ok(Entry::file(base_name(path), mod_time, size));
        }

        let marker = marker_key(path);
        let fields = self.store.meta_get_all(&marker)?;
        match EntryMeta::from_fields(&marker, &fields) {
            Some(meta) if meta.kind == EntryKind::Directory => {
                debug!("stat {} -> directory", path);
                Ok(Entry::directory(path.trim_end_matches('/'), meta.mod_time))
            }
            _ => Err(FsError::NotFound(path.to_string())),
        }
    }

    /// Whether a marker exists for `path`. Root always counts.
    pub fn is_dir(&self, path: &str) -> Result<bool, FsError> {
        if is_root(path) {
            return Ok(true);
        }
        Ok(self.store.meta_exists(&marker_key(path))?)
    }

    /// Creates the marker for `path` unless it already exists.
    ///
    /// Repeated calls keep the first `modTime`. Ancestors are handled per
    /// the configured [`ParentPolicy`].
    pub fn make_dir(&self, path: &str) -> Result<(), FsError> {
        if is_root(path) {
            return Ok(());
        }

        match self.config.parent_policy {
            ParentPolicy::Lazy => {}
            ParentPolicy::CreateAncestors => {
                for ancestor in ancestors(path) {
                    self.ensure_marker(&ancestor)?;
                }
            }
            ParentPolicy::RequireExisting => self.require_parent(path)?,
        }

        self.ensure_marker(path)?;
        Ok(())
    }

    fn ensure_marker(&self, path: &str) -> Result<bool, FsError> {
        let key = marker_key(path);
        if self.store.meta_exists(&key)? {
            debug!("Directory marker {} already present", String::from_utf8_lossy(&key));
            return Ok(false);
        }
        touch(self.store.as_ref(), &key, EntryKind::Directory)?;
        info!("Created directory marker {}", String::from_utf8_lossy(&key));
        Ok(true)
    }

    /// Fails with `ParentNotFound` unless the parent is root or a directory.
    pub(crate) fn require_parent(&self, path: &str) -> Result<(), FsError> {
        match parent_path(path) {
            Some(parent) if !self.is_dir(&parent)? => Err(FsError::ParentNotFound(parent)),
            _ => Ok(()),
        }
    }

    /// Removes the file content and its metadata.
    ///
    /// Both removals are attempted; the last error wins. Missing keys are
    /// not an error.
    pub fn delete_file(&self, path: &str) -> Result<(), FsError> {
        let key = to_storage_key(path);
        let deleted = self.store.delete(std::slice::from_ref(&key));
        let cleared = self.store.meta_clear(std::slice::from_ref(&key));

        match (deleted, cleared) {
            (_, Err(e)) | (Err(e), Ok(_)) => {
                error!("Failed to delete file {}: {}", path, e);
                Err(e.into())
            }
            (Ok(_), Ok(_)) => {
                info!("Deleted file {}", path);
                Ok(())
            }
        }
    }

    /// Removes every key under `path` that carries metadata, page by page.
    ///
    /// Value keys without metadata are not found by the marker scan and stay
    /// behind. Returns the number of keys removed.
    pub fn delete_dir(&self, path: &str) -> Result<usize, FsError> {
        if is_root(path) {
            return Err(FsError::InvalidPath("cannot remove the root directory".into()));
        }

        let pattern = format!("^{}.*", regex::escape(&dir_prefix(path)));
        let page_size = self.config.scan.delete_page_size;
        let mut removed = 0;

        loop {
            let page = self.store.scan(Space::Meta, b"", page_size, &pattern)?;
            if !page.is_empty() {
                self.remove_keys(&page)?;
                removed += page.len();
            }
            if page.len() < page_size {
                break;
            }
        }

        info!("Deleted directory {} ({} keys)", path, removed);
        Ok(removed)
    }

    fn remove_keys(&self, keys: &[Vec<u8>]) -> Result<(), StoreError> {
        if self.use_batches() {
            let ops = keys
                .iter()
                .flat_map(|key| {
                    [
                        BatchOp::Delete { key: key.clone() },
                        BatchOp::ClearFields { key: key.clone() },
                    ]
                })
                .collect();
            return self.store.apply_batch(ops);
        }
        self.store.delete(keys)?;
        self.store.meta_clear(keys)?;
        Ok(())
    }

    /// Moves file content and metadata from `from` to `to`.
    ///
    /// With atomic batches the copy and the source cleanup commit together.
    /// Without them the copy is undone if writing the metadata fails, but a
    /// failure while removing the source is reported as
    /// [`FsError::PartialRename`] and both paths keep the data.
    pub fn rename(&self, from: &str, to: &str) -> Result<(), FsError> {
        let src = to_storage_key(from);
        let dst = to_storage_key(to);

        let content = self
            .store
            .get(&src)?
            .ok_or_else(|| FsError::NotFound(from.to_string()))?;
        let meta = self.store.meta_get_all(&src)?;

        if src == dst {
            return Ok(());
        }

        if self.use_batches() {
            self.store.apply_batch(vec![
                BatchOp::Set {
                    key: dst.clone(),
                    value: content,
                },
                BatchOp::SetFields {
                    key: dst,
                    fields: meta,
                },
                BatchOp::ClearFields { key: src.clone() },
                BatchOp::Delete { key: src },
            ])?;
            info!("Renamed {} -> {} (atomic)", from, to);
            return Ok(());
        }

        let undo = RenameUndo::capture(self.store.as_ref(), &dst)?;
        self.store.set(&dst, &content)?;
        if let Err(e) = self.store.meta_set(&dst, &meta) {
            warn!("Rename {} -> {} failed writing metadata, rolling back: {}", from, to, e);
            undo.rollback(self.store.as_ref());
            return Err(e.into());
        }

        let cleared = self.store.meta_clear(std::slice::from_ref(&src));
        let deleted = self.store.delete(std::slice::from_ref(&src));
        match (cleared, deleted) {
            (_, Err(source)) | (Err(source), Ok(_)) => {
                error!("Rename {} -> {} left the source behind: {}", from, to, source);
                Err(FsError::PartialRename {
                    from: from.to_string(),
                    to: to.to_string(),
                    source,
                })
            }
            (Ok(_), Ok(_)) => {
                info!("Renamed {} -> {}", from, to);
                Ok(())
            }
        }
    }
}

/// Prior state of a rename destination, restored if the copy cannot finish.
struct RenameUndo {
    key: Vec<u8>,
    value: Option<Vec<u8>>,
    fields: Fields,
}

impl RenameUndo {
    fn capture(store: &dyn KvStore, key: &[u8]) -> Result<Self, StoreError> {
        Ok(Self {
            key: key.to_vec(),
            value: store.get(key)?,
            fields: store.meta_get_all(key)?,
        })
    }

    fn rollback(self, store: &dyn KvStore) {
        let key = std::slice::from_ref(&self.key);
        let restored = match &self.value {
            Some(value) => store.set(&self.key, value),
            None => store.delete(key).map(|_| ()),
        }
        .and_then(|_| store.meta_clear(key))
        .and_then(|_| store.meta_set(&self.key, &self.fields));

        if let Err(e) = restored {
            error!(
                "Rollback of {} failed, destination may hold partial data: {}",
                String::from_utf8_lossy(&self.key),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::KvfsConfig;
    use crate::store::{MemoryStore, Primitive};

    fn setup(store: MemoryStore, config: KvfsConfig) -> (Arc<MemoryStore>, Driver) {
        let store = Arc::new(store);
        let driver = Driver::new(store.clone(), Arc::new(config));
        (store, driver)
    }

    fn default_setup() -> (Arc<MemoryStore>, Driver) {
        setup(MemoryStore::new(), KvfsConfig::default())
    }

    #[test]
    fn test_stat_root_is_directory_on_empty_store() {
        let (_, driver) = default_setup();
        for root in ["/", "", "//"] {
            let entry = driver.stat(root).unwrap();
            assert!(entry.is_dir());
            assert_eq!(entry.size, 0);
        }
    }

    #[test]
    fn test_stat_missing_path_is_not_found() {
        let (_, driver) = default_setup();
        assert!(driver.stat("/nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_stat_directory_name_strips_trailing_separator() {
        let (_, driver) = default_setup();
        driver.make_dir("/docs").unwrap();
        let entry = driver.stat("/docs/").unwrap();
        assert!(entry.is_dir());
        assert_eq!(entry.name, "/docs");
        assert_eq!(entry.size, 0);
    }

    #[test]
    fn test_stat_file_without_metadata_has_zero_mod_time() {
        let (store, driver) = default_setup();
        store.set(b"raw", b"1234").unwrap();
        let entry = driver.stat("/raw").unwrap();
        assert_eq!(entry.mod_time, 0);
        assert_eq!(entry.size, 4);
        assert_eq!(entry.name, "raw");
    }

    #[test]
    fn test_make_dir_is_idempotent() {
        let (store, driver) = default_setup();
        let mut fields = Fields::new();
        fields.insert(b"modTime".to_vec(), b"100".to_vec());
        fields.insert(b"kind".to_vec(), b"dir".to_vec());
        store.meta_set(b"a/", &fields).unwrap();

        driver.make_dir("/a").unwrap();
        driver.make_dir("/a/").unwrap();

        assert_eq!(store.meta_len(), 1);
        assert_eq!(driver.stat("/a").unwrap().mod_time, 100);
    }

    #[test]
    fn test_make_dir_lazy_skips_ancestors() {
        let (_, driver) = default_setup();
        driver.make_dir("/x/y/z").unwrap();
        assert!(driver.is_dir("/x/y/z").unwrap());
        assert!(!driver.is_dir("/x").unwrap());
    }

    #[test]
    fn test_make_dir_create_ancestors() {
        let config = KvfsConfig {
            parent_policy: ParentPolicy::CreateAncestors,
            ..KvfsConfig::default()
        };
        let (_, driver) = setup(MemoryStore::new(), config);
        driver.make_dir("/x/y/z").unwrap();
        assert!(driver.is_dir("/x").unwrap());
        assert!(driver.is_dir("/x/y").unwrap());
        assert!(driver.is_dir("/x/y/z").unwrap());
    }

    #[test]
    fn test_make_dir_require_existing_parent() {
        let config = KvfsConfig {
            parent_policy: ParentPolicy::RequireExisting,
            ..KvfsConfig::default()
        };
        let (_, driver) = setup(MemoryStore::new(), config);
        assert!(matches!(
            driver.make_dir("/x/y"),
            Err(FsError::ParentNotFound(p)) if p == "/x"
        ));
        driver.make_dir("/x").unwrap();
        driver.make_dir("/x/y").unwrap();
    }

    #[test]
    fn test_delete_file_is_idempotent() {
        let (_, driver) = default_setup();
        driver.delete_file("/ghost").unwrap();
    }

    #[test]
    fn test_delete_file_attempts_both_removals() {
        let (store, driver) = default_setup();
        store.set(b"f", b"data").unwrap();
        touch(store.as_ref(), b"f", EntryKind::File).unwrap();

        store.fail_next(Primitive::Delete, 1);
        assert!(matches!(driver.delete_file("/f"), Err(FsError::Store(_))));
        assert_eq!(store.meta_len(), 0);
        assert_eq!(store.value_len(), 1);
    }

    #[test]
    fn test_delete_dir_removes_keys_with_metadata() {
        for store in [MemoryStore::new(), MemoryStore::without_batches()] {
            let mut config = KvfsConfig::default();
            config.scan.delete_page_size = 2;
            let (store, driver) = setup(store, config);

            driver.make_dir("/d").unwrap();
            for i in 0..5 {
                driver.make_dir(&format!("/d/s{i}")).unwrap();
            }
            driver.make_dir("/keep").unwrap();
            store.set(b"d/loose", b"no metadata").unwrap();

            assert_eq!(driver.delete_dir("/d").unwrap(), 6);
            assert!(!driver.is_dir("/d").unwrap());
            assert!(driver.is_dir("/keep").unwrap());
            assert!(store.exists(b"d/loose").unwrap());
        }
    }

    #[test]
    fn test_delete_root_rejected() {
        let (_, driver) = default_setup();
        assert!(matches!(driver.delete_dir("/"), Err(FsError::InvalidPath(_))));
    }

    #[test]
    fn test_rename_missing_source() {
        let (_, driver) = default_setup();
        assert!(driver.rename("/a", "/b").unwrap_err().is_not_found());
    }

    #[test]
    fn test_rename_moves_content_and_metadata() {
        for store in [MemoryStore::new(), MemoryStore::without_batches()] {
            let (store, driver) = setup(store, KvfsConfig::default());
            store.set(b"a", b"payload").unwrap();
            let mut fields = Fields::new();
            fields.insert(b"modTime".to_vec(), b"77".to_vec());
            store.meta_set(b"a", &fields).unwrap();

            driver.rename("/a", "/b").unwrap();

            assert!(driver.stat("/a").unwrap_err().is_not_found());
            let moved = driver.stat("/b").unwrap();
            assert_eq!(moved.size, 7);
            assert_eq!(moved.mod_time, 77);
            assert_eq!(store.get(b"b").unwrap(), Some(b"payload".to_vec()));
            assert!(!store.meta_exists(b"a").unwrap());
        }
    }

    #[test]
    fn test_rename_onto_itself_keeps_data() {
        let (store, driver) = default_setup();
        store.set(b"a", b"x").unwrap();
        driver.rename("/a", "/a").unwrap();
        assert_eq!(store.get(b"a").unwrap(), Some(b"x".to_vec()));
    }

    #[test]
    fn test_rename_rolls_back_destination_on_metadata_failure() {
        let (store, driver) = setup(MemoryStore::without_batches(), KvfsConfig::default());
        store.set(b"a", b"new").unwrap();
        store.set(b"b", b"old").unwrap();

        store.fail_next(Primitive::MetaSet, 1);
        assert!(matches!(driver.rename("/a", "/b"), Err(FsError::Store(_))));

        assert_eq!(store.get(b"a").unwrap(), Some(b"new".to_vec()));
        assert_eq!(store.get(b"b").unwrap(), Some(b"old".to_vec()));
    }

    #[test]
    fn test_rename_cleanup_failure_leaves_duplicate() {
        let (store, driver) = setup(MemoryStore::without_batches(), KvfsConfig::default());
        store.set(b"a", b"data").unwrap();

        store.fail_next(Primitive::Delete, 1);
        let err = driver.rename("/a", "/b").unwrap_err();
        assert!(matches!(err, FsError::PartialRename { .. }));

        assert_eq!(store.get(b"a").unwrap(), Some(b"data".to_vec()));
        assert_eq!(store.get(b"b").unwrap(), Some(b"data".to_vec()));
    }

    #[test]
    fn test_atomic_rename_failure_changes_nothing() {
        let (store, driver) = default_setup();
        store.set(b"a", b"data").unwrap();

        store.fail_next(Primitive::Batch, 1);
        assert!(driver.rename("/a", "/b").is_err());
        assert!(store.exists(b"a").unwrap());
        assert!(!store.exists(b"b").unwrap());
    }
}
