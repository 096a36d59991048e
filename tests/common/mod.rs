// Shared fixtures for integration tests
#![allow(dead_code)]

use bptdb::{IndexBuilder, Page, PAGE_SIZE};
use std::path::PathBuf;
use tempfile::TempDir;

/// Route library logs to the test harness.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Concatenate pages into a file image, page 0 first.
pub fn image(pages: &[Page]) -> Vec<u8> {
    let mut data = Vec::with_capacity(pages.len() * PAGE_SIZE);
    for page in pages {
        data.extend_from_slice(&page.encode());
    }
    data
}

/// Payload stored for integer key `k` by [`numbered_builder`].
pub fn payload_for(k: i32) -> Vec<u8> {
    format!("value{:08}", k).into_bytes()
}

/// Builder holding `count` keys spaced `step` apart, starting at `start`.
pub fn numbered_builder(start: i32, count: i32, step: i32) -> IndexBuilder {
    let mut builder = IndexBuilder::new();
    for i in 0..count {
        let k = start + i * step;
        builder.add(k, &payload_for(k)).unwrap();
    }
    builder
}

/// Write `data` into a fresh file inside `dir`.
pub fn write_file(dir: &TempDir, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, data).unwrap();
    path
}
