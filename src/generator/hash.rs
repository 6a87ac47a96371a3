use xxhash_rust::xxh64::xxh64;

use super::{CodeGenerator, code_space};
use crate::utils::encode_base62;

/// Deterministic codes derived from the URL
///
/// The retry attempt is the hash seed, so a collision moves the next
/// candidate somewhere unrelated.
pub struct HashGenerator {
    length: usize,
    space: u64,
}

impl HashGenerator {
    pub fn new(length: usize) -> Self {
        Self {
            length,
            space: code_space(length),
        }
    }
}

impl CodeGenerator for HashGenerator {
    fn generate(&self, url: &str, attempt: u32) -> String {
        let digest = xxh64(url.as_bytes(), attempt as u64);
        encode_base62(digest % self.space, self.length)
    }

    fn name(&self) -> &'static str {
        "hash"
    }
}
