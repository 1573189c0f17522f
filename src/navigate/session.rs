//! Session state
//!
//! A [`Session`] owns one driver and speaks in client paths: anything it is
//! given is resolved against the current directory before reaching the
//! driver, so relative names and `..` work the way clients expect.

use tokio::io::AsyncRead;

use crate::error::FsError;
use crate::navigate::operations::resolve_path;
use crate::storage::{Driver, Entry, FileReader};

pub struct Session {
    driver: Driver,
    rename_from: Option<String>,
    restart_offset: u64,
}

impl Session {
    pub fn new(driver: Driver) -> Self {
        Self {
            driver,
            rename_from: None,
            restart_offset: 0,
        }
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    /// Current working directory.
    pub fn cwd(&self) -> &str {
        self.driver.root_path()
    }

    /// Absolute form of `target` relative to the current directory.
    pub fn resolve(&self, target: &str) -> Result<String, FsError> {
        resolve_path(self.cwd(), target)
    }

    pub fn change_dir(&mut self, target: &str) -> Result<String, FsError> {
        let path = self.resolve(target)?;
        self.driver.change_dir(&path)?;
        Ok(path)
    }

    pub fn stat(&self, target: &str) -> Result<Entry, FsError> {
        self.driver.stat(&self.resolve(target)?)
    }

    /// Lists `target`, or the current directory when `None`.
    pub fn list(&self, target: Option<&str>) -> Result<Vec<Entry>, FsError> {
        let path = match target {
            Some(t) => self.resolve(t)?,
            None => self.cwd().to_string(),
        };
        self.driver.list_entries(&path)
    }

    pub fn make_dir(&self, target: &str) -> Result<String, FsError> {
        let path = self.resolve(target)?;
        self.driver.make_dir(&path)?;
        Ok(path)
    }

    pub fn remove_dir(&self, target: &str) -> Result<usize, FsError> {
        self.driver.delete_dir(&self.resolve(target)?)
    }

    pub fn delete_file(&self, target: &str) -> Result<(), FsError> {
        self.driver.delete_file(&self.resolve(target)?)
    }

    /// First half of a two-step rename: remember the source if it exists.
    pub fn rename_from(&mut self, target: &str) -> Result<(), FsError> {
        let path = self.resolve(target)?;
        self.driver.stat(&path)?;
        self.rename_from = Some(path);
        Ok(())
    }

    /// Second half of a two-step rename.
    pub fn rename_to(&mut self, target: &str) -> Result<(), FsError> {
        let from = self
            .rename_from
            .take()
            .ok_or_else(|| FsError::InvalidPath("rename source not set".into()))?;
        let to = self.resolve(target)?;
        self.driver.rename(&from, &to)
    }

    /// Offset the next retrieve starts from.
    pub fn set_restart_offset(&mut self, offset: u64) {
        self.restart_offset = offset;
    }

    /// Opens `target` from the pending restart offset, which is consumed.
    pub fn retrieve(&mut self, target: &str) -> Result<(u64, FileReader), FsError> {
        let offset = std::mem::take(&mut self.restart_offset);
        self.driver.read_range(&self.resolve(target)?, offset)
    }

    pub async fn store<R>(&self, target: &str, data: R, append: bool) -> Result<u64, FsError>
    where
        R: AsyncRead + Unpin,
    {
        let path = self.resolve(target)?;
        self.driver.write_file(&path, data, append).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::KvfsConfig;
    use crate::store::MemoryStore;

    fn session() -> Session {
        Session::new(Driver::new(
            Arc::new(MemoryStore::new()),
            Arc::new(KvfsConfig::default()),
        ))
    }

    #[tokio::test]
    async fn test_relative_paths_follow_cwd() {
        let mut session = session();
        session.make_dir("docs").unwrap();
        assert_eq!(session.change_dir("docs").unwrap(), "/docs");
        assert_eq!(session.cwd(), "/docs");

        session.store("notes.txt", &b"hi"[..], false).await.unwrap();
        assert_eq!(session.driver().stat("/docs/notes.txt").unwrap().size, 2);

        let names: Vec<_> = session.list(None).unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["notes.txt"]);

        session.change_dir("..").unwrap();
        assert_eq!(session.cwd(), "/");
    }

    #[tokio::test]
    async fn test_two_step_rename() {
        let mut session = session();
        session.store("/a", &b"x"[..], false).await.unwrap();

        assert!(session.rename_to("/b").is_err());
        session.rename_from("a").unwrap();
        session.rename_to("b").unwrap();

        assert!(session.stat("/a").unwrap_err().is_not_found());
        assert_eq!(session.stat("/b").unwrap().size, 1);
    }

    #[tokio::test]
    async fn test_restart_offset_applies_once() {
        let mut session = session();
        session.store("/f", &b"abcdef"[..], false).await.unwrap();

        session.set_restart_offset(4);
        assert_eq!(session.retrieve("f").unwrap().0, 2);
        assert_eq!(session.retrieve("f").unwrap().0, 6);
    }

    #[test]
    fn test_rename_from_missing_source() {
        let mut session = session();
        assert!(session.rename_from("ghost").unwrap_err().is_not_found());
    }
}
