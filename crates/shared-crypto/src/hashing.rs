//! # SHA-512 Hashing
//!
//! Every content hash on the ledger (transaction checksums, block checksums,
//! address digests) is a double SHA-512, optionally truncated.
//!
//! ```text
//! sha512_sq(x)          = SHA512(SHA512(x))
//! sha512_sq_trunc(x, n) = sha512_sq(x)[..n]
//! ```

use sha2::{Digest, Sha512};

/// Single SHA-512.
pub fn sha512(data: &[u8]) -> [u8; 64] {
    let mut out = [0u8; 64];
    out.copy_from_slice(&Sha512::digest(data));
    out
}

/// Double SHA-512.
pub fn sha512_sq(data: &[u8]) -> [u8; 64] {
    sha512(&sha512(data))
}

/// Double SHA-512 truncated to `len` bytes (at most 64).
pub fn sha512_sq_trunc(data: &[u8], len: usize) -> Vec<u8> {
    sha512_sq(data)[..len.min(64)].to_vec()
}

/// Double SHA-512 truncated to 32 bytes.
pub fn sha512_sq_trunc32(data: &[u8]) -> [u8; 32] {
    let full = sha512_sq(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&full[..32]);
    out
}

/// Streaming double SHA-512 hasher.
///
/// Feeds the inner digest incrementally; the outer round runs on finalize.
#[derive(Clone, Default)]
pub struct Sha512SqHasher {
    inner: Sha512,
}

impl Sha512SqHasher {
    /// Create new hasher.
    pub fn new() -> Self {
        Self {
            inner: Sha512::new(),
        }
    }

    /// Update with data.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    /// Finalize and return the full 64-byte digest.
    pub fn finalize(self) -> [u8; 64] {
        let first = self.inner.finalize();
        sha512(&first)
    }

    /// Finalize and truncate to 32 bytes.
    pub fn finalize_trunc32(self) -> [u8; 32] {
        let full = self.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&full[..32]);
        out
    }
}
