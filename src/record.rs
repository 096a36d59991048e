//! Record fetcher layered over the index.
//!
//! Leaf values are treated as file offsets of payload records:
//!
//! ```text
//! [size: u8][payload: size bytes]
//! ```
//!
//! The payload bytes are handed to a caller-supplied [`RecordDecoder`].

use crate::config::Options;
use crate::error::{Error, Result};
use crate::hash::{KeyHasher, Murmur3};
use crate::index::Index;
use crate::page::PAGE_SIZE;
use crate::reader::ByteReader;
use crate::source::ByteSource;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// Turns a payload byte range into a caller-defined record.
pub trait RecordDecoder {
    /// The decoded record type.
    type Record;

    /// Decode one payload.
    fn decode(&self, data: &[u8]) -> Result<Self::Record>;
}

impl<F, T> RecordDecoder for F
where
    F: Fn(&[u8]) -> Result<T>,
{
    type Record = T;

    fn decode(&self, data: &[u8]) -> Result<T> {
        self(data)
    }
}

/// Returns payloads as owned bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawDecoder;

impl RecordDecoder for RawDecoder {
    type Record = Vec<u8>;

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }
}

/// Decodes bincode-serialized payloads.
pub struct BincodeDecoder<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> BincodeDecoder<T> {
    /// Create a decoder for `T`.
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<T> Default for BincodeDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> RecordDecoder for BincodeDecoder<T> {
    type Record = T;

    fn decode(&self, data: &[u8]) -> Result<T> {
        Ok(bincode::deserialize(data)?)
    }
}

/// Decodes JSON payloads.
pub struct JsonDecoder<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonDecoder<T> {
    /// Create a decoder for `T`.
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<T> Default for JsonDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> RecordDecoder for JsonDecoder<T> {
    type Record = T;

    fn decode(&self, data: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(data)?)
    }
}

/// Fetches and decodes the record stored for a key.
///
/// The fetcher keeps its own payload stream, separate from the index
/// stream, so payload reads never disturb a descent in progress.
///
/// Usage:
/// ```no_run
/// use bptdb::{FileSource, RawDecoder, Records};
///
/// let mut records = Records::open(FileSource::new("data.bpt"), RawDecoder).unwrap();
/// if let Some(bytes) = records.get_str("apple") {
///     println!("apple -> {:?}", bytes);
/// }
/// ```
pub struct Records<S: ByteSource, D: RecordDecoder, H: KeyHasher = Murmur3> {
    index: Index<S>,
    payload: ByteReader<S>,
    decoder: D,
    hasher: H,
    buf: [u8; PAGE_SIZE],
}

impl<S: ByteSource + Clone, D: RecordDecoder> Records<S, D, Murmur3> {
    /// Open a fetcher whose index and payloads live in the same file.
    pub fn open(source: S, decoder: D) -> Result<Self> {
        Self::with_options(source, decoder, &Options::default())
    }

    /// Open a fetcher with explicit options. String keys are hashed with
    /// `options.hash_seed`.
    pub fn with_options(source: S, decoder: D, options: &Options) -> Result<Self> {
        let index = Index::with_options(source.clone(), options)?;
        Self::from_parts(index, source, decoder, Murmur3::new(options.hash_seed))
    }
}

impl<S: ByteSource, D: RecordDecoder, H: KeyHasher> Records<S, D, H> {
    /// Assemble a fetcher from an open index and a payload source, which may
    /// be the index file itself or a parallel payload file.
    pub fn from_parts(index: Index<S>, payload: S, decoder: D, hasher: H) -> Result<Self> {
        Ok(Self {
            index,
            payload: ByteReader::open(payload)?,
            decoder,
            hasher,
            buf: [0u8; PAGE_SIZE],
        })
    }

    /// Fetch the record for an integer key.
    ///
    /// Returns `None` when the key is absent or the record cannot be read or
    /// decoded.
    pub fn get(&mut self, key: i32) -> Option<D::Record> {
        match self.try_get(key) {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Fetching record for key {} failed: {}", key, e);
                None
            }
        }
    }

    /// Fetch the record for a string key.
    pub fn get_str(&mut self, key: &str) -> Option<D::Record> {
        let ikey = self.hasher.hash_str(key);
        self.get(ikey)
    }

    /// Fetch the record for an integer key, surfacing errors.
    pub fn try_get(&mut self, key: i32) -> Result<Option<D::Record>> {
        let offset = match self.index.try_search(key)? {
            Some(offset) => offset,
            None => return Ok(None),
        };
        let size = self.read_payload(offset)?;
        self.decoder.decode(&self.buf[..size]).map(Some)
    }

    /// Fetch the record for a string key, surfacing errors.
    pub fn try_get_str(&mut self, key: &str) -> Result<Option<D::Record>> {
        let ikey = self.hasher.hash_str(key);
        self.try_get(ikey)
    }

    /// Fetch the undecoded payload for an integer key.
    pub fn get_raw(&mut self, key: i32) -> Option<Vec<u8>> {
        let offset = self.index.search(key)?;
        match self.read_payload(offset) {
            Ok(size) => Some(self.buf[..size].to_vec()),
            Err(e) => {
                log::warn!("Reading payload at offset {} failed: {}", offset, e);
                None
            }
        }
    }

    /// The index this fetcher resolves keys through.
    pub fn index(&mut self) -> &mut Index<S> {
        &mut self.index
    }

    /// The hasher used for string keys.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Read the payload at `offset` into the reusable buffer and return its
    /// size.
    fn read_payload(&mut self, offset: i32) -> Result<usize> {
        let start = u64::try_from(offset)
            .map_err(|_| Error::corruption(format!("negative payload offset {}", offset)))?;
        self.payload.seek_to(start)?;
        let size = usize::from(self.payload.read_u8()?);
        self.payload.read_exact(&mut self.buf[..size])?;
        log::debug!("Read {} byte payload at offset {}", size, offset);
        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::IndexBuilder;
    use crate::page::{Page, PageKind};
    use crate::source::MemorySource;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Fruit {
        name: String,
        weight: u16,
    }

    fn fruit_image() -> MemorySource {
        let mut builder = IndexBuilder::new();
        for (i, name) in ["apple", "banana", "cherry"].iter().enumerate() {
            let fruit = Fruit { name: name.to_string(), weight: 100 + i as u16 };
            builder.add_str(name, &bincode::serialize(&fruit).unwrap()).unwrap();
        }
        MemorySource::new(builder.finish().unwrap())
    }

    #[test]
    fn test_get_by_string_key() {
        let mut records = Records::open(fruit_image(), BincodeDecoder::<Fruit>::new()).unwrap();

        let banana = records.get_str("banana").unwrap();
        assert_eq!(banana, Fruit { name: "banana".into(), weight: 101 });
        assert_eq!(records.get_str("cherry").unwrap().weight, 102);
        assert_eq!(records.get_str("durian"), None);
    }

    #[test]
    fn test_get_by_int_key() {
        let mut builder = IndexBuilder::new();
        builder.add(10, b"ten").unwrap();
        builder.add(20, b"twenty").unwrap();
        let source = MemorySource::new(builder.finish().unwrap());
        let mut records = Records::open(source, RawDecoder).unwrap();

        assert_eq!(records.get(10), Some(b"ten".to_vec()));
        assert_eq!(records.get(20), Some(b"twenty".to_vec()));
        assert_eq!(records.get(15), None);
        assert_eq!(records.get_raw(20), Some(b"twenty".to_vec()));
        assert_eq!(records.index().search(10), Some(PAGE_SIZE as i32));
    }

    #[test]
    fn test_closure_decoder() {
        let mut builder = IndexBuilder::new();
        builder.add(1, b"hello").unwrap();
        let source = MemorySource::new(builder.finish().unwrap());

        let decoder = |data: &[u8]| -> Result<String> {
            String::from_utf8(data.to_vec()).map_err(|e| Error::decode(e.to_string()))
        };
        let mut records = Records::open(source, decoder).unwrap();
        assert_eq!(records.get(1).as_deref(), Some("hello"));
    }

    #[test]
    fn test_decoder_failure_yields_none() {
        let mut builder = IndexBuilder::new();
        builder.add(1, b"{not json").unwrap();
        let source = MemorySource::new(builder.finish().unwrap());
        let mut records = Records::open(source, JsonDecoder::<Fruit>::new()).unwrap();

        assert_eq!(records.get(1), None);
        assert!(matches!(records.try_get(1), Err(Error::Decode(_))));
    }

    #[test]
    fn test_json_decoder() {
        let mut builder = IndexBuilder::new();
        builder.add_str("kiwi", br#"{"name":"kiwi","weight":75}"#).unwrap();
        let source = MemorySource::new(builder.finish().unwrap());
        let mut records = Records::open(source, JsonDecoder::<Fruit>::new()).unwrap();

        assert_eq!(records.try_get_str("kiwi").unwrap().unwrap().weight, 75);
    }

    #[test]
    fn test_truncated_payload() {
        // Leaf points at offset 256 where the size byte claims 10 bytes but
        // only 3 follow.
        let leaf = Page::from_entries(PageKind::Leaf, 0, &[(5, PAGE_SIZE as i32)]).unwrap();
        let mut data = leaf.encode().to_vec();
        data.extend_from_slice(&[10, b'a', b'b', b'c']);
        let mut records = Records::open(MemorySource::new(data), RawDecoder).unwrap();

        assert_eq!(records.get(5), None);
        assert_eq!(records.get_raw(5), None);
        assert!(matches!(records.try_get(5), Err(Error::Io(_))));
    }

    #[test]
    fn test_negative_payload_offset() {
        let leaf = Page::from_entries(PageKind::Leaf, 0, &[(5, -8)]).unwrap();
        let source = MemorySource::new(leaf.encode().to_vec());
        let mut records = Records::open(source, RawDecoder).unwrap();

        assert!(matches!(records.try_get(5), Err(Error::Corruption(_))));
    }

    #[test]
    fn test_seed_from_options() {
        let mut builder = IndexBuilder::with_hasher(Murmur3::new(1234));
        builder.add_str("plum", b"purple").unwrap();
        let source = MemorySource::new(builder.finish().unwrap());

        let mut default_seed = Records::open(source.clone(), RawDecoder).unwrap();
        assert_eq!(default_seed.get_str("plum"), None);

        let options = Options::new().hash_seed(1234);
        let mut records = Records::with_options(source, RawDecoder, &options).unwrap();
        assert_eq!(records.hasher().seed(), 1234);
        assert_eq!(records.get_str("plum"), Some(b"purple".to_vec()));
    }
}
