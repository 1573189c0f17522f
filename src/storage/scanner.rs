//! Directory scanning
//!
//! A listing is rebuilt from two independent cursor scans over the flat key
//! space: one over directory markers in the metadata association, one over
//! file keys in the value space. Keys deeper than one level below the prefix
//! are filtered out.

use log::debug;

use crate::error::FsError;
use crate::storage::driver::Driver;
use crate::storage::entry::Entry;
use crate::storage::path::{dir_prefix, immediate_child};
use crate::store::Space;

impl Driver {
    /// Visits every immediate child of `prefix` once.
    ///
    /// Directories are reported by the marker scan and files by the value
    /// scan; there is no ordering guarantee between the two groups. The first
    /// error from the store or from `visit` aborts the listing.
    pub fn list<F>(&self, prefix: &str, mut visit: F) -> Result<(), FsError>
    where
        F: FnMut(Entry) -> Result<(), FsError>,
    {
        let prefix = dir_prefix(prefix);
        let escaped = regex::escape(&prefix);

        self.list_dirs(&prefix, &format!("^{escaped}.*/$"), &mut visit)?;
        self.list_files(&prefix, &format!("^{escaped}.*[^/]$"), &mut visit)?;
        Ok(())
    }

    /// Convenience wrapper collecting the listing into a vector.
    pub fn list_entries(&self, prefix: &str) -> Result<Vec<Entry>, FsError> {
        let mut entries = Vec::new();
        self.list(prefix, |entry| {
            entries.push(entry);
            Ok(())
        })?;
        Ok(entries)
    }

    /// Marker scan: small pages so each callback is reached quickly.
    fn list_dirs<F>(&self, prefix: &str, pattern: &str, visit: &mut F) -> Result<(), FsError>
    where
        F: FnMut(Entry) -> Result<(), FsError>,
    {
        let page_size = self.config.scan.dir_page_size;
        let mut cursor = Vec::new();

        loop {
            let page = self.store.scan(Space::Meta, &cursor, page_size, pattern)?;
            for key in &page {
                self.visit_child(prefix, key, visit)?;
            }
            match page.last() {
                Some(last) if page.len() >= page_size => cursor = last.clone(),
                _ => break,
            }
        }
        Ok(())
    }

    /// Value scan: accumulate every page first, then resolve each key.
    fn list_files<F>(&self, prefix: &str, pattern: &str, visit: &mut F) -> Result<(), FsError>
    where
        F: FnMut(Entry) -> Result<(), FsError>,
    {
        let page_size = self.config.scan.file_page_size;
        let mut cursor = Vec::new();
        let mut keys = Vec::new();

        loop {
            let page = self.store.scan(Space::Value, &cursor, page_size, pattern)?;
            let done = page.len() < page_size;
            if let Some(last) = page.last() {
                cursor = last.clone();
            }
            keys.extend(page);
            if done {
                break;
            }
        }
        debug!("Value scan under {:?} returned {} keys", prefix, keys.len());

        for key in &keys {
            self.visit_child(prefix, key, visit)?;
        }
        Ok(())
    }

    fn visit_child<F>(&self, prefix: &str, key: &[u8], visit: &mut F) -> Result<(), FsError>
    where
        F: FnMut(Entry) -> Result<(), FsError>,
    {
        let Ok(key) = std::str::from_utf8(key) else {
            debug!("Skipping non UTF-8 key {:?} under {:?}", key, prefix);
            return Ok(());
        };
        let Some(name) = immediate_child(prefix, key) else {
            return Ok(());
        };
        let mut entry = self.stat(key)?;
        entry.name = name.to_string();
        visit(entry)
    }
}
