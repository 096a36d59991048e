//! B+ tree index reader.
//!
//! Descends from the root page at offset 0, following internal-page routing
//! until a leaf answers the lookup.

use crate::config::Options;
use crate::error::{Error, Result};
use crate::loader::PageLoader;
use crate::source::ByteSource;

/// File offset of the root page.
pub const ROOT_OFFSET: i32 = 0;

/// Point-lookup reader over a B+ tree index file.
///
/// Usage:
/// ```no_run
/// use bptdb::{FileSource, Index};
///
/// let mut index = Index::open(FileSource::new("data.bpt")).unwrap();
/// if let Some(offset) = index.search(42) {
///     println!("key 42 -> {}", offset);
/// }
/// ```
///
/// An `Index` holds mutable page buffers and a stream cursor, so it is not
/// shared between threads; open one per thread instead.
pub struct Index<S: ByteSource> {
    loader: PageLoader<S>,
    max_depth: usize,
}

impl<S: ByteSource> Index<S> {
    /// Open an index over `source` with default options.
    pub fn open(source: S) -> Result<Self> {
        Self::with_options(source, &Options::default())
    }

    /// Open an index over `source`.
    pub fn with_options(source: S, options: &Options) -> Result<Self> {
        options.validate()?;
        Ok(Self { loader: PageLoader::open(source)?, max_depth: options.max_depth })
    }

    /// Look up the value stored for `key`.
    ///
    /// Returns `None` when the key is absent and also when the file cannot be
    /// read or is corrupt; use [`try_search`](Self::try_search) to tell these
    /// apart.
    pub fn search(&mut self, key: i32) -> Option<i32> {
        match self.try_search(key) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Search for key {} failed: {}", key, e);
                None
            }
        }
    }

    /// Look up the value stored for `key`, surfacing I/O and corruption
    /// errors.
    pub fn try_search(&mut self, key: i32) -> Result<Option<i32>> {
        let mut offset = ROOT_OFFSET;
        for depth in 0..self.max_depth {
            let page = self.loader.try_load(offset)?;
            if page.is_leaf() {
                return Ok(page.get(key));
            }

            offset = page.get(key).ok_or_else(|| {
                Error::corruption(format!("internal page at offset {} has no entries", offset))
            })?;
            log::trace!("Key {} routed to page {} at depth {}", key, offset, depth + 1);
        }

        Err(Error::corruption(format!("descent exceeded {} pages", self.max_depth)))
    }

    /// The loader backing this index.
    pub fn loader(&self) -> &PageLoader<S> {
        &self.loader
    }
}
