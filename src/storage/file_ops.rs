//! File content operations
//!
//! Reads hand back a lazily fetched [`FileReader`]; writes stream the data
//! source into the store chunk by chunk through the append primitive. A
//! failed write never leaves a partial file behind.

use std::sync::Arc;

use log::{error, info, warn};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::ParentPolicy;
use crate::error::FsError;
use crate::storage::driver::Driver;
use crate::storage::metadata::{EntryKind, touch};
use crate::storage::path::to_storage_key;
use crate::storage::reader::FileReader;

impl Driver {
    /// Opens the content of `path` from byte `offset` to the end.
    ///
    /// Returns the number of bytes the reader will yield along with the
    /// reader itself. Offsets past the end yield an empty reader.
    pub fn read_range(&self, path: &str, offset: u64) -> Result<(u64, FileReader), FsError> {
        let key = to_storage_key(path);
        if !self.store.exists(&key)? {
            return Err(FsError::NotFound(path.to_string()));
        }

        let total = self.store.strlen(&key)?;
        let start = offset.min(total);
        let reader = FileReader::new(
            Arc::clone(&self.store),
            key,
            start,
            total,
            self.config.transfer.chunk_size,
        );
        Ok((total - start, reader))
    }

    /// Writes `data` to `path`, replacing the content unless `append` is set
    /// and the file already exists. Returns the resulting file length.
    ///
    /// On a read or store failure the file is deleted before the error is
    /// returned, including when stamping `modTime` fails after the data is in.
    pub async fn write_file<R>(&self, path: &str, mut data: R, append: bool) -> Result<u64, FsError>
    where
        R: AsyncRead + Unpin,
    {
        if self.config.parent_policy == ParentPolicy::RequireExisting {
            self.require_parent(path)?;
        }

        let key = to_storage_key(path);
        let exists = self.store.exists(&key)?;
        if !exists || !append {
            self.store.set(&key, b"")?;
        }

        let stored = match self.stream_into(path, &key, &mut data).await {
            Ok(size) => touch(self.store.as_ref(), &key, EntryKind::File)
                .map(|_| size)
                .map_err(FsError::from),
            Err(e) => Err(e),
        };

        match stored {
            Ok(size) => {
                info!("Stored {} ({} bytes, append={})", path, size, append);
                Ok(size)
            }
            Err(e) => {
                warn!("Write to {} failed, removing partial file: {}", path, e);
                self.discard(path, key);
                Err(e)
            }
        }
    }

    async fn stream_into<R>(&self, path: &str, key: &[u8], data: &mut R) -> Result<u64, FsError>
    where
        R: AsyncRead + Unpin,
    {
        let limit = self.config.transfer.max_file_size_bytes();
        let mut buf = vec![0u8; self.config.transfer.chunk_size];
        let mut size = self.store.strlen(key)?;

        loop {
            let n = data.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            if size + n as u64 > limit {
                error!("File size limit exceeded for {}: limit {} bytes", path, limit);
                return Err(FsError::FileTooLarge {
                    path: path.to_string(),
                    limit,
                });
            }
            size = self.store.append(key, &buf[..n])?;
        }
        Ok(size)
    }

    fn discard(&self, path: &str, key: Vec<u8>) {
        let keys = [key];
        if let Err(e) = self.store.delete(&keys) {
            error!("Failed to remove partial file {}: {}", path, e);
        }
        if let Err(e) = self.store.meta_clear(&keys) {
            error!("Failed to clear metadata of partial file {}: {}", path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Read};
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use tokio::io::ReadBuf;

    use super::*;
    use crate::config::KvfsConfig;
    use crate::store::{KvStore, MemoryStore, Primitive};

    fn setup(config: KvfsConfig) -> (Arc<MemoryStore>, Driver) {
        let store = Arc::new(MemoryStore::new());
        let driver = Driver::new(store.clone(), Arc::new(config));
        (store, driver)
    }

    fn read_all(driver: &Driver, path: &str, offset: u64) -> (u64, String) {
        let (len, mut reader) = driver.read_range(path, offset).unwrap();
        let mut out = String::new();
        Read::read_to_string(&mut reader, &mut out).unwrap();
        (len, out)
    }

    /// Yields one chunk, then fails.
    struct BrokenSource {
        sent: bool,
    }

    impl AsyncRead for BrokenSource {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.sent {
                return Poll::Ready(Err(io::Error::new(io::ErrorKind::ConnectionReset, "gone")));
            }
            self.sent = true;
            buf.put_slice(b"partial");
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_write_then_read_back() {
        let (_, driver) = setup(KvfsConfig::default());
        let size = driver.write_file("/a/b.txt", &b"hello"[..], false).await.unwrap();
        assert_eq!(size, 5);

        let entry = driver.stat("/a/b.txt").unwrap();
        assert_eq!(entry.size, 5);
        assert!(!entry.is_dir());
        assert!(entry.mod_time > 0);
        assert_eq!(read_all(&driver, "/a/b.txt", 0), (5, "hello".to_string()));
    }

    #[tokio::test]
    async fn test_append_and_offset_reads() {
        let (_, driver) = setup(KvfsConfig::default());
        driver.write_file("/f", &b"abc"[..], false).await.unwrap();
        let size = driver.write_file("/f", &b"def"[..], true).await.unwrap();
        assert_eq!(size, 6);

        assert_eq!(read_all(&driver, "/f", 0).1, "abcdef");
        assert_eq!(read_all(&driver, "/f", 3), (3, "def".to_string()));
        assert_eq!(read_all(&driver, "/f", 99), (0, String::new()));
    }

    #[tokio::test]
    async fn test_overwrite_truncates() {
        let (_, driver) = setup(KvfsConfig::default());
        driver.write_file("/f", &b"long content"[..], false).await.unwrap();
        driver.write_file("/f", &b"short"[..], false).await.unwrap();
        assert_eq!(read_all(&driver, "/f", 0).1, "short");
    }

    #[tokio::test]
    async fn test_append_to_missing_file_creates_it() {
        let (_, driver) = setup(KvfsConfig::default());
        assert_eq!(driver.write_file("/new", &b"xy"[..], true).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_empty_source_creates_empty_file() {
        let (_, driver) = setup(KvfsConfig::default());
        assert_eq!(driver.write_file("/empty", &b""[..], false).await.unwrap(), 0);
        assert_eq!(driver.stat("/empty").unwrap().size, 0);
    }

    #[tokio::test]
    async fn test_small_chunks_stream_whole_source() {
        let mut config = KvfsConfig::default();
        config.transfer.chunk_size = 2;
        let (_, driver) = setup(config);
        driver.write_file("/f", &b"0123456789"[..], false).await.unwrap();
        assert_eq!(read_all(&driver, "/f", 4).1, "456789");
    }

    #[tokio::test]
    async fn test_append_failure_removes_file() {
        let (store, driver) = setup(KvfsConfig::default());
        driver.write_file("/f", &b"keep?"[..], false).await.unwrap();

        store.fail_next(Primitive::Append, 1);
        let result = driver.write_file("/f", &b"more"[..], true).await;
        assert!(matches!(result, Err(FsError::Store(_))));
        assert!(driver.stat("/f").unwrap_err().is_not_found());
        assert!(!store.meta_exists(b"f").unwrap());
    }

    #[tokio::test]
    async fn test_metadata_failure_removes_file() {
        let (store, driver) = setup(KvfsConfig::default());
        store.fail_next(Primitive::MetaSet, 1);

        let result = driver.write_file("/f", &b"hello"[..], false).await;
        assert!(matches!(result, Err(FsError::Store(_))));
        assert!(driver.stat("/f").unwrap_err().is_not_found());
        assert!(!store.exists(b"f").unwrap());

        driver.write_file("/f", &b"hello"[..], false).await.unwrap();
        assert!(driver.stat("/f").unwrap().mod_time > 0);
    }

    #[tokio::test]
    async fn test_source_failure_removes_file() {
        let (_, driver) = setup(KvfsConfig::default());
        let result = driver
            .write_file("/f", BrokenSource { sent: false }, false)
            .await;
        assert!(matches!(result, Err(FsError::Io(_))));
        assert!(driver.stat("/f").unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_size_limit_removes_file() {
        let mut config = KvfsConfig::default();
        config.transfer.max_file_size_mb = 1;
        config.transfer.chunk_size = 256 * 1024;
        let (_, driver) = setup(config);

        let big = vec![7u8; 1024 * 1024 + 1];
        let result = driver.write_file("/big", big.as_slice(), false).await;
        assert!(matches!(result, Err(FsError::FileTooLarge { .. })));
        assert!(driver.stat("/big").unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_require_existing_parent_for_writes() {
        let config = KvfsConfig {
            parent_policy: ParentPolicy::RequireExisting,
            ..KvfsConfig::default()
        };
        let (_, driver) = setup(config);
        assert!(matches!(
            driver.write_file("/d/f", &b"x"[..], false).await,
            Err(FsError::ParentNotFound(_))
        ));
        driver.make_dir("/d").unwrap();
        driver.write_file("/d/f", &b"x"[..], false).await.unwrap();
        driver.write_file("/top", &b"x"[..], false).await.unwrap();
    }

    #[test]
    fn test_read_missing_file() {
        let (_, driver) = setup(KvfsConfig::default());
        assert!(matches!(driver.read_range("/missing", 0), Err(FsError::NotFound(_))));
    }
}
