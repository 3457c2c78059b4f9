use std::collections::HashSet;
use std::hash::{BuildHasher, Hasher};

use xxhash_rust::xxh3::{xxh3_64, Xxh3};

#[derive(Default, Clone)]
pub struct Xxh3Hasher(Xxh3);

impl Hasher for Xxh3Hasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.0.finish()
    }
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        self.0.write(bytes);
    }
}

#[derive(Clone, Default)]
pub struct Xxh3Builder;

impl BuildHasher for Xxh3Builder {
    type Hasher = Xxh3Hasher;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        Xxh3Hasher(Xxh3::new())
    }
}

/// Set of pre-hashed keys.
pub type KeySet = HashSet<u64, Xxh3Builder>;

/// Hash a rendered key value.
#[inline]
pub fn hash_key(key: &str) -> u64 {
    xxh3_64(key.as_bytes())
}
