//! Bulk builder for index files.
//!
//! Produces a complete file image from a set of `(key, payload)` pairs:
//!
//! ```text
//! [root page]              // offset 0
//! [internal pages]         // one level after another, top down
//! [leaf pages]
//! [payload records]        // [size: u8][size bytes], in key order
//! ```
//!
//! Leaf values are the file offsets of their payload records, so the image
//! serves both the index and the record fetcher.

use crate::error::{Error, Result};
use crate::hash::{KeyHasher, Murmur3};
use crate::page::{Page, PageKind, INFIMUM_KEY, MAX_KEYS, PAGE_SIZE};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Largest payload a record can hold; its size is stored in one byte.
pub const MAX_PAYLOAD_SIZE: usize = u8::MAX as usize;

/// A page waiting for offsets. Entry values index into the level below, or
/// into the key-ordered payload list for leaves.
struct PendingPage {
    entries: Vec<(i32, usize)>,
    min_key: i32,
}

/// Builds an index file from key/payload pairs.
///
/// Usage:
/// ```
/// use bptdb::{Index, IndexBuilder, MemorySource};
///
/// let mut builder = IndexBuilder::new();
/// builder.add(7, b"seven").unwrap();
/// let image = builder.finish().unwrap();
///
/// let mut index = Index::open(MemorySource::new(image)).unwrap();
/// assert!(index.search(7).is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct IndexBuilder<H: KeyHasher = Murmur3> {
    entries: BTreeMap<i32, Vec<u8>>,
    hasher: H,
}

impl IndexBuilder<Murmur3> {
    /// Create a builder hashing string keys with the default seed.
    pub fn new() -> Self {
        Self::with_hasher(Murmur3::default())
    }
}

impl<H: KeyHasher> IndexBuilder<H> {
    /// Create a builder hashing string keys with `hasher`.
    pub fn with_hasher(hasher: H) -> Self {
        Self { entries: BTreeMap::new(), hasher }
    }

    /// Add a record under an integer key. A later add for the same key
    /// replaces the earlier payload.
    pub fn add(&mut self, key: i32, payload: &[u8]) -> Result<()> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(Error::invalid_argument(format!(
                "payload of {} bytes exceeds {} bytes",
                payload.len(),
                MAX_PAYLOAD_SIZE
            )));
        }
        self.entries.insert(key, payload.to_vec());
        Ok(())
    }

    /// Add a record under a string key, returning the integer key it
    /// hashed to.
    pub fn add_str(&mut self, key: &str, payload: &[u8]) -> Result<i32> {
        let ikey = self.hasher.hash_str(key);
        self.add(ikey, payload)?;
        Ok(ikey)
    }

    /// Number of distinct keys added.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lay out the tree and payloads and return the file image.
    pub fn finish(&self) -> Result<Vec<u8>> {
        let levels = self.plan_levels();

        // Page numbers start at the root and walk down level by level.
        let mut first_page = vec![0usize; levels.len()];
        let mut total_pages = 0;
        for depth in (0..levels.len()).rev() {
            first_page[depth] = total_pages;
            total_pages += levels[depth].len();
        }
        let page_offset =
            |depth: usize, index: usize| to_offset((first_page[depth] + index) * PAGE_SIZE);

        let mut payload_offsets = Vec::with_capacity(self.entries.len());
        let mut end = total_pages * PAGE_SIZE;
        for payload in self.entries.values() {
            payload_offsets.push(to_offset(end)?);
            end += 1 + payload.len();
        }
        to_offset(end)?;

        let mut image = Vec::with_capacity(end);
        for depth in (0..levels.len()).rev() {
            let kind = if depth == 0 { PageKind::Leaf } else { PageKind::Internal };
            for (i, pending) in levels[depth].iter().enumerate() {
                let parent =
                    if depth + 1 < levels.len() { page_offset(depth + 1, i / MAX_KEYS)? } else { 0 };
                let entries = pending
                    .entries
                    .iter()
                    .map(|&(key, target)| -> Result<(i32, i32)> {
                        let value = if depth == 0 {
                            payload_offsets[target]
                        } else {
                            page_offset(depth - 1, target)?
                        };
                        Ok((key, value))
                    })
                    .collect::<Result<Vec<_>>>()?;
                image.extend_from_slice(&Page::from_entries(kind, parent, &entries)?.encode());
            }
        }

        for payload in self.entries.values() {
            image.push(payload.len() as u8);
            image.extend_from_slice(payload);
        }

        log::debug!(
            "Built index image: {} keys, {} pages, {} levels, {} bytes",
            self.entries.len(),
            total_pages,
            levels.len(),
            image.len()
        );
        Ok(image)
    }

    /// Build the image and write it to `path`.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let image = self.finish()?;
        fs::write(path, image)?;
        Ok(())
    }

    /// Group keys into leaves, then group each level into parents until a
    /// single root remains. Index 0 is the leaf level.
    fn plan_levels(&self) -> Vec<Vec<PendingPage>> {
        let keys: Vec<i32> = self.entries.keys().copied().collect();
        let leaves = if keys.is_empty() {
            vec![PendingPage { entries: Vec::new(), min_key: INFIMUM_KEY }]
        } else {
            keys.chunks(MAX_KEYS)
                .enumerate()
                .map(|(c, chunk)| PendingPage {
                    entries: chunk.iter().enumerate().map(|(i, &k)| (k, c * MAX_KEYS + i)).collect(),
                    min_key: chunk[0],
                })
                .collect()
        };

        let mut levels = vec![leaves];
        loop {
            let below = &levels[levels.len() - 1];
            if below.len() <= 1 {
                break;
            }
            let parents = below
                .chunks(MAX_KEYS)
                .enumerate()
                .map(|(c, group)| PendingPage {
                    entries: group
                        .iter()
                        .enumerate()
                        .map(|(i, child)| {
                            let key = if i == 0 { INFIMUM_KEY } else { child.min_key };
                            (key, c * MAX_KEYS + i)
                        })
                        .collect(),
                    min_key: group[0].min_key,
                })
                .collect();
            levels.push(parents);
        }
        levels
    }
}

fn to_offset(pos: usize) -> Result<i32> {
    i32::try_from(pos)
        .map_err(|_| Error::invalid_argument(format!("file offset {} does not fit in i32", pos)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_at(image: &[u8], index: usize) -> Page {
        Page::decode(&image[index * PAGE_SIZE..(index + 1) * PAGE_SIZE]).unwrap()
    }

    #[test]
    fn test_empty_builder() {
        let image = IndexBuilder::new().finish().unwrap();
        assert_eq!(image.len(), PAGE_SIZE);

        let root = page_at(&image, 0);
        assert!(root.is_leaf());
        assert!(root.is_empty());
    }

    #[test]
    fn test_single_leaf_layout() {
        let mut builder = IndexBuilder::new();
        builder.add(20, b"bb").unwrap();
        builder.add(10, b"a").unwrap();
        let image = builder.finish().unwrap();

        let root = page_at(&image, 0);
        assert!(root.is_leaf());
        assert_eq!(root.keys(), &[10, 20]);
        assert_eq!(root.values(), &[256, 258]);
        assert_eq!(&image[256..], &[1, b'a', 2, b'b', b'b']);
    }

    #[test]
    fn test_two_level_layout() {
        let mut builder = IndexBuilder::new();
        for k in 0..(MAX_KEYS as i32 + 5) {
            builder.add(k * 10, &[k as u8]).unwrap();
        }
        let image = builder.finish().unwrap();

        let root = page_at(&image, 0);
        assert_eq!(root.kind(), PageKind::Internal);
        assert_eq!(root.keys(), &[INFIMUM_KEY, MAX_KEYS as i32 * 10]);
        assert_eq!(root.values(), &[256, 512]);
        root.validate().unwrap();

        let left = page_at(&image, 1);
        assert_eq!(left.len(), MAX_KEYS);
        assert_eq!(left.parent(), 0);
        assert_eq!(page_at(&image, 2).len(), 5);
    }

    #[test]
    fn test_duplicate_key_replaces_payload() {
        let mut builder = IndexBuilder::new();
        builder.add(1, b"old").unwrap();
        builder.add(1, b"new").unwrap();
        assert_eq!(builder.len(), 1);

        let image = builder.finish().unwrap();
        assert_eq!(&image[PAGE_SIZE..], &[3, b'n', b'e', b'w']);
    }

    #[test]
    fn test_payload_too_large() {
        let mut builder = IndexBuilder::new();
        assert!(builder.add(1, &[0u8; MAX_PAYLOAD_SIZE]).is_ok());
        assert!(matches!(
            builder.add(2, &[0u8; MAX_PAYLOAD_SIZE + 1]),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_add_str_uses_hasher() {
        let mut builder = IndexBuilder::with_hasher(Murmur3::new(99));
        let key = builder.add_str("apple", b"red").unwrap();
        assert_eq!(key, crate::hash::hash_str("apple", 99));
    }
}
