//! Content reader
//!
//! [`FileReader`] is a forward-only stream over one value, fetched from the
//! store in bounded range reads as the caller consumes it.

use std::io::{self, Read};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};

use crate::store::KvStore;

pub struct FileReader {
    store: Arc<dyn KvStore>,
    key: Vec<u8>,
    pos: u64,
    end: u64,
    chunk_size: usize,
    buf: Vec<u8>,
    buf_pos: usize,
}

impl FileReader {
    /// Reader over bytes `start..end` of `key`.
    pub fn new(
        store: Arc<dyn KvStore>,
        key: Vec<u8>,
        start: u64,
        end: u64,
        chunk_size: usize,
    ) -> Self {
        Self {
            store,
            key,
            pos: start,
            end,
            chunk_size: chunk_size.max(1),
            buf: Vec::new(),
            buf_pos: 0,
        }
    }

    /// Bytes not yet handed to the caller.
    pub fn remaining(&self) -> u64 {
        (self.buf.len() - self.buf_pos) as u64 + (self.end - self.pos)
    }

    /// Releases the reader. Nothing is held open in the store.
    pub fn close(self) -> io::Result<()> {
        Ok(())
    }

    /// Refills the buffer when drained. Returns the unread buffered bytes.
    fn fill(&mut self) -> io::Result<&[u8]> {
        if self.buf_pos >= self.buf.len() && self.pos < self.end {
            let stop = (self.pos + self.chunk_size as u64).min(self.end);
            let chunk = self
                .store
                .get_range(&self.key, self.pos, Some(stop))
                .map_err(io::Error::other)?;
            if chunk.is_empty() {
                // value shrank since the reader was opened
                self.pos = self.end;
            } else {
                self.pos += chunk.len() as u64;
            }
            self.buf = chunk;
            self.buf_pos = 0;
        }
        Ok(&self.buf[self.buf_pos..])
    }
}

impl Read for FileReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let available = self.fill()?;
        let n = available.len().min(out.len());
        out[..n].copy_from_slice(&available[..n]);
        self.buf_pos += n;
        Ok(n)
    }
}

impl AsyncRead for FileReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        out: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let available = this.fill()?;
        let n = available.len().min(out.remaining());
        out.put_slice(&available[..n]);
        this.buf_pos += n;
        Poll::Ready(Ok(()))
    }
}
