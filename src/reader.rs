//! Sequential big-endian reader over a [`ByteSource`].

use crate::error::Result;
use crate::source::ByteSource;
use byteorder::{BigEndian, ReadBytesExt};
use std::io::Read;

/// Reads big-endian integers and byte ranges from one stream of a source.
///
/// The reader owns a single open stream. Random positioning is done by
/// rewinding to byte 0 and skipping forward, so it works over streams that
/// only support forward reads.
pub struct ByteReader<S: ByteSource> {
    source: S,
    stream: S::Stream,
}

impl<S: ByteSource> ByteReader<S> {
    /// Open a fresh stream from `source`, positioned at byte 0.
    pub fn open(source: S) -> Result<Self> {
        let stream = source.open()?;
        Ok(Self { source, stream })
    }

    /// Reposition the stream at byte 0, re-opening the source if the stream
    /// cannot be reset in place.
    pub fn rewind(&mut self) -> Result<()> {
        match self.source.rewind(&mut self.stream) {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(e) => log::debug!("Stream reset failed, re-opening source: {}", e),
        }
        self.stream = self.source.open()?;
        Ok(())
    }

    /// Advance exactly `n` bytes.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        self.source.skip(&mut self.stream, n)?;
        Ok(())
    }

    /// Rewind, then skip to `offset`.
    pub fn seek_to(&mut self, offset: u64) -> Result<()> {
        self.rewind()?;
        self.skip(offset)
    }

    /// Read one unsigned byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.stream.read_u8()?)
    }

    /// Read a big-endian two's complement 32-bit integer.
    pub fn read_i32_be(&mut self) -> Result<i32> {
        Ok(self.stream.read_i32::<BigEndian>()?)
    }

    /// Fill `buf` completely or fail with a short read.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.stream.read_exact(buf)?;
        Ok(())
    }

    /// The source this reader was opened from.
    pub fn source(&self) -> &S {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::source::{FnSource, MemorySource};
    use std::cell::Cell;
    use std::io::{self, Cursor};
    use std::rc::Rc;

    #[test]
    fn test_read_big_endian() {
        let data = vec![0x80, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFE, 0x2A];
        let mut reader = ByteReader::open(MemorySource::new(data)).unwrap();

        assert_eq!(reader.read_i32_be().unwrap(), i32::MIN);
        assert_eq!(reader.read_i32_be().unwrap(), -2);
        assert_eq!(reader.read_u8().unwrap(), 42);
        assert!(matches!(reader.read_u8(), Err(Error::Io(_))));
    }

    #[test]
    fn test_seek_to() {
        let data: Vec<u8> = (0..32).collect();
        let mut reader = ByteReader::open(MemorySource::new(data)).unwrap();

        reader.seek_to(20).unwrap();
        assert_eq!(reader.read_u8().unwrap(), 20);

        reader.seek_to(4).unwrap();
        assert_eq!(reader.read_i32_be().unwrap(), 0x04050607);
    }

    #[test]
    fn test_read_exact_short() {
        let mut reader = ByteReader::open(MemorySource::new(vec![1u8, 2, 3])).unwrap();
        let mut buf = [0u8; 8];
        assert!(reader.read_exact(&mut buf).is_err());
    }

    #[test]
    fn test_rewind_reopens_forward_only_source() {
        let opens = Rc::new(Cell::new(0));
        let counter = Rc::clone(&opens);
        let source = FnSource::new(move || {
            counter.set(counter.get() + 1);
            Ok::<_, io::Error>(Cursor::new(vec![7u8, 8, 9]))
        });

        let mut reader = ByteReader::open(source).unwrap();
        assert_eq!(opens.get(), 1);
        assert_eq!(reader.read_u8().unwrap(), 7);

        reader.seek_to(2).unwrap();
        assert_eq!(opens.get(), 2);
        assert_eq!(reader.read_u8().unwrap(), 9);
    }

    #[test]
    fn test_reader_keeps_source() {
        let reader = ByteReader::open(MemorySource::new(vec![1u8, 2, 3])).unwrap();
        assert_eq!(reader.source().len(), 3);
    }
}
