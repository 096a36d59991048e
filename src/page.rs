//! Page format for the B+ tree index file.
//!
//! ## Page Format
//!
//! Every page is exactly [`PAGE_SIZE`] bytes. All integers are big-endian
//! two's complement.
//!
//! ```text
//! [header: i32]         // bit 0 = kind (0 internal, 1 leaf), bits 1..31 = entry count
//! [parent: i32]         // file offset of the parent page (informational)
//! [key 0: i32][value 0: i32]
//! ...
//! [key n-1: i32][value n-1: i32]
//! [zero padding up to PAGE_SIZE]
//! ```
//!
//! In an internal page entry `(k, v)` means "the subtree at file offset `v`
//! holds keys >= `k`", and entry 0 always carries [`INFIMUM_KEY`]. In a leaf
//! page `(k, v)` maps key `k` directly to value `v`.

use crate::error::{Error, Result};
use bytes::{Buf, BufMut};

/// Size of a page on disk.
pub const PAGE_SIZE: usize = 256;

/// Size of one key or value.
pub const DATA_SIZE: usize = 4;

/// Size of the page header (header word + parent offset).
pub const HEADER_SIZE: usize = 2 * DATA_SIZE;

/// Size of one (key, value) entry.
pub const ENTRY_SIZE: usize = 2 * DATA_SIZE;

/// Maximum number of entries a page may hold.
pub const MAX_KEYS: usize = PAGE_SIZE / (DATA_SIZE * 2) - 2;

/// Routing key carried by entry 0 of every internal page.
pub const INFIMUM_KEY: i32 = i32::MIN;

/// The two page variants. They share a layout and differ only in how
/// [`Page::get`] interprets a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PageKind {
    /// Values are file offsets of child pages.
    Internal = 0,
    /// Values are caller-defined, usually payload offsets.
    Leaf = 1,
}

impl PageKind {
    /// Type code stored in bit 0 of the header word.
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Split a header word into its kind and entry count.
///
/// Fails with [`Error::Corruption`] when the count is negative or larger
/// than [`MAX_KEYS`].
pub fn parse_header(header: i32) -> Result<(PageKind, usize)> {
    let kind = if header & 1 == 0 { PageKind::Internal } else { PageKind::Leaf };
    let count = header >> 1;
    if count < 0 || count as usize > MAX_KEYS {
        return Err(Error::corruption(format!(
            "page entry count {} outside 0..={}",
            count, MAX_KEYS
        )));
    }
    Ok((kind, count as usize))
}

/// Indices of the entries nearest to a probe key, as returned by
/// [`Page::find`].
///
/// `lo` is the largest entry with key <= probe, `hi` the smallest with
/// key >= probe. Both are equal when the probe is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    /// Index of the closest key not greater than the probe.
    pub lo: Option<usize>,
    /// Index of the closest key not less than the probe.
    pub hi: Option<usize>,
}

impl Bounds {
    /// Returns true if the probe key is stored at `lo`.
    pub fn is_exact(&self) -> bool {
        self.lo.is_some() && self.lo == self.hi
    }
}

/// A decoded page.
///
/// Storage is fixed-size so the loader can decode into the same buffer over
/// and over without allocating.
#[derive(Debug, Clone)]
pub struct Page {
    kind: PageKind,
    parent: i32,
    len: usize,
    keys: [i32; MAX_KEYS],
    values: [i32; MAX_KEYS],
}

impl Page {
    /// Create an empty page of the given kind.
    pub fn new(kind: PageKind) -> Self {
        Self { kind, parent: 0, len: 0, keys: [0; MAX_KEYS], values: [0; MAX_KEYS] }
    }

    /// Build a page from `(key, value)` entries, which must already be in
    /// key order.
    pub fn from_entries(kind: PageKind, parent: i32, entries: &[(i32, i32)]) -> Result<Self> {
        if entries.len() > MAX_KEYS {
            return Err(Error::invalid_argument(format!(
                "{} entries do not fit in a page (max {})",
                entries.len(),
                MAX_KEYS
            )));
        }
        let mut page = Self::new(kind);
        page.reset(kind, parent, entries.len());
        for (i, &(key, value)) in entries.iter().enumerate() {
            page.set_entry(i, key, value);
        }
        Ok(page)
    }

    /// Decode a page from its on-disk bytes.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::corruption("page shorter than its header"));
        }
        let mut buf = data;
        let (kind, len) = parse_header(buf.get_i32())?;
        let parent = buf.get_i32();
        if buf.remaining() < len * ENTRY_SIZE {
            return Err(Error::corruption(format!(
                "page declares {} entries but holds {} bytes of entries",
                len,
                buf.remaining()
            )));
        }

        let mut page = Self::new(kind);
        page.reset(kind, parent, len);
        for i in 0..len {
            let key = buf.get_i32();
            let value = buf.get_i32();
            page.set_entry(i, key, value);
        }
        Ok(page)
    }

    /// Encode the page into its on-disk form, zero padded to [`PAGE_SIZE`].
    pub fn encode(&self) -> [u8; PAGE_SIZE] {
        let mut data = [0u8; PAGE_SIZE];
        let mut buf = &mut data[..];
        buf.put_i32(self.kind.code() | ((self.len as i32) << 1));
        buf.put_i32(self.parent);
        for i in 0..self.len {
            buf.put_i32(self.keys[i]);
            buf.put_i32(self.values[i]);
        }
        data
    }

    pub(crate) fn reset(&mut self, kind: PageKind, parent: i32, len: usize) {
        debug_assert!(len <= MAX_KEYS);
        self.kind = kind;
        self.parent = parent;
        self.len = len;
    }

    pub(crate) fn set_entry(&mut self, index: usize, key: i32, value: i32) {
        self.keys[index] = key;
        self.values[index] = value;
    }

    /// Kind of the page.
    pub fn kind(&self) -> PageKind {
        self.kind
    }

    /// Returns true for leaf pages.
    pub fn is_leaf(&self) -> bool {
        self.kind == PageKind::Leaf
    }

    /// Parent page offset as recorded by the writer.
    pub fn parent(&self) -> i32 {
        self.parent
    }

    /// Number of entries in the page.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the page holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Keys of the page, in stored order.
    pub fn keys(&self) -> &[i32] {
        &self.keys[..self.len]
    }

    /// Values of the page, in stored order.
    pub fn values(&self) -> &[i32] {
        &self.values[..self.len]
    }

    /// Locate the entries nearest to `key`.
    ///
    /// - `key` below every stored key: `lo = None, hi = Some(0)`.
    /// - `key` above every stored key: `lo = Some(n - 1), hi = None`.
    /// - `key` stored at `m`: `lo = hi = Some(m)`.
    /// - otherwise `keys[lo] < key < keys[hi]` and `hi = lo + 1`.
    ///
    /// An empty page yields `None` on both sides.
    pub fn find(&self, key: i32) -> Bounds {
        let keys = self.keys();
        if keys.is_empty() {
            return Bounds { lo: None, hi: None };
        }

        let mut first = 0;
        let mut last = keys.len() - 1;
        if keys[first] > key {
            return Bounds { lo: None, hi: Some(first) };
        }
        if keys[last] < key {
            return Bounds { lo: Some(last), hi: None };
        }

        while last - first > 1 {
            let mid = first + (last - first) / 2;
            if keys[mid] == key {
                return Bounds { lo: Some(mid), hi: Some(mid) };
            }
            if keys[mid] < key {
                first = mid;
            } else {
                last = mid;
            }
        }

        if keys[first] == key {
            last = first;
        } else if keys[last] == key {
            first = last;
        }
        Bounds { lo: Some(first), hi: Some(last) }
    }

    /// Look up `key` according to the page kind.
    ///
    /// Leaf pages return the value of an exact match. Internal pages return
    /// the child offset whose lower bound is the largest key <= `key`, or the
    /// first child when `key` sorts before every routing key.
    pub fn get(&self, key: i32) -> Option<i32> {
        let bounds = self.find(key);
        match self.kind {
            PageKind::Leaf => {
                if bounds.is_exact() {
                    bounds.lo.map(|i| self.values[i])
                } else {
                    None
                }
            }
            PageKind::Internal => bounds.lo.or(bounds.hi).map(|i| self.values[i]),
        }
    }

    /// Check the structural invariants of a well-formed page: keys strictly
    /// increasing, and internal pages non-empty with [`INFIMUM_KEY`] first.
    pub fn validate(&self) -> Result<()> {
        if self.kind == PageKind::Internal {
            match self.keys().first() {
                Some(&INFIMUM_KEY) => {}
                Some(&k) => {
                    return Err(Error::corruption(format!(
                        "internal page starts with key {} instead of the infimum",
                        k
                    )))
                }
                None => return Err(Error::corruption("internal page has no entries")),
            }
        }
        if let Some(pos) = self.keys().windows(2).position(|w| w[0] >= w[1]) {
            return Err(Error::corruption(format!(
                "keys not strictly increasing at entry {}",
                pos + 1
            )));
        }
        Ok(())
    }
}

// Slots past `len` hold stale entries from earlier decodes.
impl PartialEq for Page {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.parent == other.parent
            && self.keys() == other.keys()
            && self.values() == other.values()
    }
}

impl Eq for Page {}
