//! Navigation operations implementation

use log::info;

use crate::error::FsError;
use crate::storage::Driver;
use crate::storage::path::{SEPARATOR, is_root};

impl Driver {
    /// Makes `path` the session's current root.
    ///
    /// Anything but root must have a directory marker.
    pub fn change_dir(&mut self, path: &str) -> Result<(), FsError> {
        if !is_root(path) && !self.is_dir(path)? {
            return Err(FsError::NotADirectory(path.to_string()));
        }
        info!("Changed directory to {}", path);
        self.set_root_path(path.to_string());
        Ok(())
    }
}

/// Resolves `target` against the absolute directory `cwd`.
///
/// Absolute targets ignore `cwd`. `.` segments are dropped and `..` pops one
/// level; popping past root is rejected. The result is absolute with no
/// trailing separator.
pub fn resolve_path(cwd: &str, target: &str) -> Result<String, FsError> {
    if target.trim().is_empty() {
        return Err(FsError::InvalidPath("Empty path provided".into()));
    }

    let mut segments: Vec<&str> = if target.starts_with(SEPARATOR) {
        Vec::new()
    } else {
        cwd.split(SEPARATOR).filter(|s| !s.is_empty()).collect()
    };

    for segment in target.split(SEPARATOR) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(FsError::InvalidPath(format!("{target} escapes root")));
                }
            }
            name => segments.push(name),
        }
    }

    Ok(format!("/{}", segments.join("/")))
}
