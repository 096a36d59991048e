//! Byte-stream providers.
//!
//! A [`ByteSource`] hands out fresh readable streams positioned at byte 0.
//! Sources whose streams can be reset cheaply say so from
//! [`ByteSource::rewind`]; for the rest the reader re-opens the source.

use bytes::Bytes;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Factory for readable streams over an index or payload file.
pub trait ByteSource {
    /// The stream type produced by [`open`](ByteSource::open).
    type Stream: Read;

    /// Open a new stream positioned at byte 0.
    fn open(&self) -> io::Result<Self::Stream>;

    /// Reposition `stream` at byte 0 in place.
    ///
    /// Returns `Ok(false)` when the stream cannot be reset, in which case the
    /// caller re-opens the source instead.
    fn rewind(&self, stream: &mut Self::Stream) -> io::Result<bool> {
        let _ = stream;
        Ok(false)
    }

    /// Advance `stream` by exactly `n` bytes.
    fn skip(&self, stream: &mut Self::Stream, n: u64) -> io::Result<()> {
        let skipped = io::copy(&mut stream.by_ref().take(n), &mut io::sink())?;
        if skipped < n {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("skip of {} bytes stopped after {}", n, skipped),
            ));
        }
        Ok(())
    }
}

/// A file on disk, read through a buffered handle.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Create a source for the file at `path`. The file is not opened yet.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    type Stream = BufReader<File>;

    fn open(&self) -> io::Result<Self::Stream> {
        Ok(BufReader::new(File::open(&self.path)?))
    }

    fn rewind(&self, stream: &mut Self::Stream) -> io::Result<bool> {
        stream.seek(SeekFrom::Start(0))?;
        Ok(true)
    }

    // Seeking past EOF is allowed; the next read reports the short read.
    fn skip(&self, stream: &mut Self::Stream, n: u64) -> io::Result<()> {
        let n = i64::try_from(n)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "skip too large"))?;
        stream.seek_relative(n)
    }
}

/// An in-memory file image.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Bytes,
}

impl MemorySource {
    /// Wrap an in-memory file image.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    /// Size of the image in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the image is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl ByteSource for MemorySource {
    type Stream = Cursor<Bytes>;

    fn open(&self) -> io::Result<Self::Stream> {
        Ok(Cursor::new(self.data.clone()))
    }

    fn rewind(&self, stream: &mut Self::Stream) -> io::Result<bool> {
        stream.set_position(0);
        Ok(true)
    }

    fn skip(&self, stream: &mut Self::Stream, n: u64) -> io::Result<()> {
        let pos = stream.position().saturating_add(n);
        stream.set_position(pos);
        Ok(())
    }
}

/// A source backed by a closure that produces forward-only streams.
///
/// These streams cannot be reset, so every rewind re-opens the source.
#[derive(Clone)]
pub struct FnSource<F> {
    open: F,
}

impl<F> FnSource<F> {
    /// Wrap a stream factory. Each call must return a stream at byte 0.
    pub fn new(open: F) -> Self {
        Self { open }
    }
}

impl<F, R> ByteSource for FnSource<F>
where
    F: Fn() -> io::Result<R>,
    R: Read,
{
    type Stream = R;

    fn open(&self) -> io::Result<R> {
        (self.open)()
    }
}

impl<F> std::fmt::Debug for FnSource<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnSource").finish_non_exhaustive()
    }
}
