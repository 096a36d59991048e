//! 32-bit MurmurHash3 (x86 variant) for deriving integer keys.
//!
//! Index files store only integer keys; string keys are hashed by the writer
//! before insertion, so the reader must reproduce the same hash bit for bit.
//! Strings hash as their UTF-8 bytes, integers as 4 little-endian bytes.

use byteorder::{ByteOrder, LittleEndian};

/// Seed used for string keys unless configured otherwise.
pub const DEFAULT_SEED: u32 = 0xDEAD_BEEF;

const C1: u32 = 0xcc9e_2d51;
const C2: u32 = 0x1b87_3593;

#[inline]
fn mix_k(k: u32) -> u32 {
    k.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2)
}

#[inline]
fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

/// Hash `data` with `seed`, returning the result as a signed key.
pub fn hash(data: &[u8], seed: u32) -> i32 {
    let mut h = seed;

    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        h ^= mix_k(LittleEndian::read_u32(chunk));
        h = h.rotate_left(13).wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    // Tail bytes are XOR-accumulated first, then mixed once.
    let tail = chunks.remainder();
    if !tail.is_empty() {
        let mut k = 0u32;
        if tail.len() >= 3 {
            k ^= u32::from(tail[2]) << 16;
        }
        if tail.len() >= 2 {
            k ^= u32::from(tail[1]) << 8;
        }
        k ^= u32::from(tail[0]);
        h ^= mix_k(k);
    }

    h ^= data.len() as u32;
    fmix32(h) as i32
}

/// Hash `data` with [`DEFAULT_SEED`].
pub fn hash_default(data: &[u8]) -> i32 {
    hash(data, DEFAULT_SEED)
}

/// Hash the UTF-8 bytes of `key`.
pub fn hash_str(key: &str, seed: u32) -> i32 {
    hash(key.as_bytes(), seed)
}

/// Hash an integer as its 4 little-endian bytes.
pub fn hash_i32(value: i32, seed: u32) -> i32 {
    hash(&value.to_le_bytes(), seed)
}

/// Hash an optional string key. An absent key hashes like the integer 0.
pub fn hash_opt_str(key: Option<&str>, seed: u32) -> i32 {
    match key {
        Some(key) => hash_str(key, seed),
        None => hash_i32(0, seed),
    }
}

/// Turns string keys into the integer keys stored in the index.
pub trait KeyHasher {
    /// Hash raw key bytes.
    fn hash_bytes(&self, key: &[u8]) -> i32;

    /// Hash a string key.
    fn hash_str(&self, key: &str) -> i32 {
        self.hash_bytes(key.as_bytes())
    }
}

/// [`KeyHasher`] computing MurmurHash3 with a fixed seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Murmur3 {
    seed: u32,
}

impl Murmur3 {
    /// Create a hasher with the given seed.
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    /// The seed in use.
    pub fn seed(&self) -> u32 {
        self.seed
    }
}

impl Default for Murmur3 {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl KeyHasher for Murmur3 {
    fn hash_bytes(&self, key: &[u8]) -> i32 {
        hash(key, self.seed)
    }
}
