//! Content hashing for cache keys and block ids.
//!
//! 32-bit FNV-1a over the UTF-8 bytes. Not collision resistant, and it does
//! not need to be: a collision only means one briefly stale render.

use std::fmt;

use serde::{Serialize, Serializer};

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(u32);

impl ContentHash {
    pub fn value(self) -> u32 {
        self.0
    }
}

/// Hashes `content`. Order sensitive and stable for the life of the process
/// (and across processes, the algorithm has no random seed).
pub fn content_hash(content: &str) -> ContentHash {
    let mut hash = FNV_OFFSET;
    for byte in content.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    ContentHash(hash)
}

impl fmt::Display for ContentHash {
    /// Base 36, the short form used inside cache keys and block ids.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
        let mut buf = [0u8; 7];
        let mut pos = buf.len();
        let mut n = self.0;
        loop {
            pos -= 1;
            buf[pos] = DIGITS[(n % 36) as usize];
            n /= 36;
            if n == 0 {
                break;
            }
        }
        // Only ASCII digits were written.
        f.write_str(std::str::from_utf8(&buf[pos..]).map_err(|_| fmt::Error)?)
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
