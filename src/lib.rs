//! # BptDb - A Read-Only B+ Tree Point-Lookup Engine
//!
//! BptDb answers point lookups against a persistent B+ tree index stored in a
//! single file of 256-byte pages. Given an integer key it returns the 32-bit
//! value stored for that key, usually the offset of a payload record in the
//! same file.
//!
//! ## Architecture
//!
//! The engine consists of a few small layers:
//!
//! - **Byte Source / Reader**: fresh streams over the file, rewind-or-reopen positioning
//! - **Page**: the on-disk page format and in-page search
//! - **Page Loader**: decodes pages into two reusable buffers
//! - **Index**: root-to-leaf descent
//! - **Records**: resolves a key to a length-prefixed payload and decodes it
//! - **Hash**: MurmurHash3 for turning string keys into integer keys
//!
//! ## Example Usage
//!
//! ```rust
//! use bptdb::{Index, IndexBuilder, MemorySource, RawDecoder, Records};
//!
//! # fn main() -> Result<(), bptdb::Error> {
//! let mut builder = IndexBuilder::new();
//! builder.add(10, b"ten")?;
//! builder.add_str("apple", b"red")?;
//! let source = MemorySource::new(builder.finish()?);
//!
//! // Offsets only
//! let mut index = Index::open(source.clone())?;
//! assert!(index.search(10).is_some());
//! assert_eq!(index.search(11), None);
//!
//! // Decoded records
//! let mut records = Records::open(source, RawDecoder)?;
//! assert_eq!(records.get(10), Some(b"ten".to_vec()));
//! assert_eq!(records.get_str("apple"), Some(b"red".to_vec()));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Module declarations
pub mod builder;
pub mod config;
pub mod error;
pub mod hash;
pub mod index;
pub mod loader;
pub mod page;
pub mod reader;
pub mod record;
pub mod source;

// Re-exports
pub use builder::IndexBuilder;
pub use config::Options;
pub use error::{Error, Result};
pub use hash::{hash, hash_default, hash_i32, hash_opt_str, hash_str, KeyHasher, Murmur3};
pub use index::Index;
pub use loader::PageLoader;
pub use page::{Page, PageKind, INFIMUM_KEY, MAX_KEYS, PAGE_SIZE};
pub use reader::ByteReader;
pub use record::{BincodeDecoder, JsonDecoder, RawDecoder, RecordDecoder, Records};
pub use source::{ByteSource, FileSource, FnSource, MemorySource};
