//! # Shared Crypto - Cryptographic Primitives
//!
//! The node consumes cryptography as pure functions. This crate holds the
//! primitives and the two verification ports the consensus path depends on.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-512 (double) | Checksums, addresses, ids |
//! | `signatures` | Ed25519 | Transaction and block signatures |
//! | `pow` | Versioned hash-target functions | PoW solution verification |
//!
//! ## Ports
//!
//! - [`SignatureVerifier`]: `verify(pubkey, message, signature)`
//! - [`PowVerifier`]: `verify_nonce(algorithm, block, solver, nonce, difficulty)`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod pow;
pub mod signatures;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{sha512, sha512_sq, sha512_sq_trunc, sha512_sq_trunc32, Sha512SqHasher};
pub use pow::{leading_zero_bits, HashTargetPowVerifier, PowAlgorithm, PowVerifier};
pub use signatures::{
    Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature, Ed25519Verifier, SignatureVerifier,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
