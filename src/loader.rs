//! Page loader with reusable decode buffers.

use crate::error::{Error, Result};
use crate::page::{parse_header, Page, PageKind};
use crate::reader::ByteReader;
use crate::source::ByteSource;

/// Decodes pages from an index file into one of two long-lived buffers.
///
/// Each load overwrites the buffer of the decoded page's kind, so the
/// returned reference borrows the loader and must be dropped before the next
/// load.
pub struct PageLoader<S: ByteSource> {
    reader: ByteReader<S>,
    internal: Page,
    leaf: Page,
    loads: u64,
}

impl<S: ByteSource> PageLoader<S> {
    /// Open a loader over `source`.
    pub fn open(source: S) -> Result<Self> {
        Ok(Self {
            reader: ByteReader::open(source)?,
            internal: Page::new(PageKind::Internal),
            leaf: Page::new(PageKind::Leaf),
            loads: 0,
        })
    }

    /// Decode the page at `offset`, or `None` if no page can be decoded there.
    pub fn load(&mut self, offset: i32) -> Option<&Page> {
        match self.try_load(offset) {
            Ok(page) => Some(page),
            Err(e) => {
                log::warn!("Page at offset {} is undecodable: {}", offset, e);
                None
            }
        }
    }

    /// Decode the page at `offset`, reporting why it failed.
    pub fn try_load(&mut self, offset: i32) -> Result<&Page> {
        let start = u64::try_from(offset)
            .map_err(|_| Error::corruption(format!("negative page offset {}", offset)))?;

        self.reader.seek_to(start)?;
        let (kind, len) = parse_header(self.reader.read_i32_be()?)?;
        let parent = self.reader.read_i32_be()?;

        let page = match kind {
            PageKind::Internal => &mut self.internal,
            PageKind::Leaf => &mut self.leaf,
        };
        page.reset(kind, parent, len);
        for i in 0..len {
            let key = self.reader.read_i32_be()?;
            let value = self.reader.read_i32_be()?;
            page.set_entry(i, key, value);
        }

        self.loads += 1;
        log::debug!("Loaded {:?} page at offset {} with {} entries", kind, offset, len);
        Ok(page)
    }

    /// Number of pages decoded successfully so far.
    pub fn pages_loaded(&self) -> u64 {
        self.loads
    }
}
