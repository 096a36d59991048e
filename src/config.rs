//! Configuration options for BptDb readers.

use crate::hash::DEFAULT_SEED;

/// Default bound on the number of pages visited by one search.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Configuration options for opening an index or a record fetcher.
#[derive(Debug, Clone)]
pub struct Options {
    /// Maximum number of pages a single search may visit before the file
    /// is treated as corrupt.
    /// Default: 64
    pub max_depth: usize,

    /// Seed used to turn string keys into integer keys.
    /// Must match the seed the writer used.
    /// Default: 0xDEADBEEF
    pub hash_seed: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH, hash_seed: DEFAULT_SEED }
    }
}

impl Options {
    /// Creates a new Options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the descent depth bound.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets the string key hash seed.
    pub fn hash_seed(mut self, seed: u32) -> Self {
        self.hash_seed = seed;
        self
    }

    /// Validates the options and returns an error if any are invalid.
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_depth == 0 {
            return Err(crate::Error::invalid_argument("max_depth must be > 0"));
        }
        Ok(())
    }
}
