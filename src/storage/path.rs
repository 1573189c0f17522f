//! Path mapping
//!
//! Converts client-visible absolute paths into storage keys. File content
//! lives under the bare key; a directory is addressed by the same key with a
//! trailing separator forced (its marker key).

pub const SEPARATOR: char = '/';

/// Strips every leading separator from `path`.
pub fn to_storage_key(path: &str) -> Vec<u8> {
    path.trim_start_matches(SEPARATOR).as_bytes().to_vec()
}

/// Storage key of the directory marker for `path`.
pub fn marker_key(path: &str) -> Vec<u8> {
    let mut key = to_storage_key(path);
    if key.last() != Some(&(SEPARATOR as u8)) {
        key.push(SEPARATOR as u8);
    }
    key
}

/// Scan prefix for the children of `path`: root maps to the empty prefix,
/// anything else to its marker key.
pub fn dir_prefix(path: &str) -> String {
    if is_root(path) {
        String::new()
    } else {
        String::from_utf8_lossy(&marker_key(path)).into_owned()
    }
}

/// Root is the empty path or any run of separators.
pub fn is_root(path: &str) -> bool {
    path.trim_matches(SEPARATOR).is_empty()
}

/// Name of `key` relative to `prefix` when it is an immediate child.
///
/// The remainder has surrounding separators trimmed; empty remainders and
/// remainders that still contain a separator are deeper descendants.
pub fn immediate_child<'a>(prefix: &str, key: &'a str) -> Option<&'a str> {
    let remainder = key.strip_prefix(prefix)?.trim_matches(SEPARATOR);
    if remainder.is_empty() || remainder.contains(SEPARATOR) {
        None
    } else {
        Some(remainder)
    }
}

/// Final path segment, ignoring a trailing separator.
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches(SEPARATOR);
    match trimmed.rfind(SEPARATOR) {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Parent directory of `path` as an absolute path, `None` for root.
pub fn parent_path(path: &str) -> Option<String> {
    if is_root(path) {
        return None;
    }
    let trimmed = path.trim_matches(SEPARATOR);
    match trimmed.rfind(SEPARATOR) {
        Some(idx) => Some(format!("/{}", &trimmed[..idx])),
        None => Some("/".to_string()),
    }
}

/// Every proper ancestor of `path`, outermost first, root excluded.
pub fn ancestors(path: &str) -> Vec<String> {
    let segments: Vec<&str> = path
        .split(SEPARATOR)
        .filter(|s| !s.is_empty())
        .collect();
    (1..segments.len())
        .map(|n| format!("/{}", segments[..n].join("/")))
        .collect()
}
