//! # Wallet Addresses
//!
//! ```text
//! ┌─────────┬──────────────────────────┬────────────┐
//! │ version │ hash44                   │ checksum3  │
//! │ 0x01    │ sha512_sq(key)[..44]     │ 3 bytes    │
//! └─────────┴──────────────────────────┴────────────┘
//! ```
//!
//! Derived addresses replace `key` with `base_address ‖ nonce` for a
//! 16-byte nonce. The single-byte nonce `[0]` selects the base address.

use crate::errors::CodecError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use shared_crypto::sha512_sq;
use std::fmt;

/// Current address version byte.
pub const ADDRESS_VERSION: u8 = 0x01;

/// Encoded length of a version-1 address.
pub const ADDRESS_LEN: usize = 48;

const HASH_LEN: usize = 44;
const CHECKSUM_LEN: usize = 3;

/// A 48-byte checksummed wallet address.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(Vec<u8>);

impl Address {
    /// Derives the address for `public_key` and an input `nonce`.
    ///
    /// `public_key` may already be an address, in which case it is the base.
    pub fn from_public_key(public_key: &[u8], nonce: &[u8]) -> Self {
        let base = if Self::validate_checksum(public_key) {
            Self(public_key.to_vec())
        } else {
            Self::build(&sha512_sq(public_key)[..HASH_LEN])
        };

        if is_base_nonce(nonce) {
            return base;
        }

        let mut input = Vec::with_capacity(ADDRESS_LEN + nonce.len());
        input.extend_from_slice(&base.0);
        input.extend_from_slice(nonce);
        Self::build(&sha512_sq(&input)[..HASH_LEN])
    }

    /// Wraps raw bytes after checking length and checksum.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        if !Self::validate_checksum(bytes) {
            return Err(CodecError::InvalidHex(format!(
                "invalid address {}",
                hex::encode(bytes)
            )));
        }
        Ok(Self(bytes.to_vec()))
    }

    /// Wraps raw bytes without validation (payload decoding).
    pub fn from_bytes_unchecked(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Parses a hex-encoded address.
    pub fn from_hex(text: &str) -> Result<Self, CodecError> {
        let bytes = hex::decode(text).map_err(|e| CodecError::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Returns true if `bytes` is a well-formed address with a valid checksum.
    pub fn validate_checksum(bytes: &[u8]) -> bool {
        if bytes.len() != ADDRESS_LEN || bytes[0] != ADDRESS_VERSION {
            return false;
        }
        let body = &bytes[..1 + HASH_LEN];
        sha512_sq(body)[..CHECKSUM_LEN] == bytes[1 + HASH_LEN..]
    }

    /// Instance form of [`Address::validate_checksum`].
    pub fn is_valid(&self) -> bool {
        Self::validate_checksum(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    fn build(hash: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(ADDRESS_LEN);
        bytes.push(ADDRESS_VERSION);
        bytes.extend_from_slice(hash);
        let checksum = sha512_sq(&bytes);
        bytes.extend_from_slice(&checksum[..CHECKSUM_LEN]);
        Self(bytes)
    }
}

/// True for the nonce that selects the base address.
pub fn is_base_nonce(nonce: &[u8]) -> bool {
    nonce.is_empty() || nonce == [0u8]
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Address({}..)", &hex[..hex.len().min(12)])
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let text = String::deserialize(deserializer)?;
            let bytes = hex::decode(text).map_err(serde::de::Error::custom)?;
            Ok(Self(bytes))
        } else {
            let bytes = Vec::<u8>::deserialize(deserializer)?;
            Ok(Self(bytes))
        }
    }
}
