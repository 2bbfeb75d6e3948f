//! # Proof-of-Work Difficulty Functions
//!
//! A PoW solution is a nonce that, hashed together with the target block's
//! checksum (and, from V1 on, the solver's address), produces a digest with
//! at least `difficulty` leading zero bits.
//!
//! The hash input layout changed with the block version; all nodes must
//! pick the same function for a given target block:
//!
//! | Block version | Algorithm | Input |
//! |---------------|-----------|-------|
//! | 0 | `V0` | `sha512(block ‖ nonce)` |
//! | 1 | `V1` | `sha512_sq(block ‖ nonce ‖ solver)` |
//! | 2..=4 | `V2` | `sha512_sq(solver ‖ block ‖ nonce)` |
//! | 5+ | `V3` | `sha512_sq(solver ‖ sha512_sq(block) ‖ nonce)` |

use crate::hashing::{sha512, sha512_sq};

/// Versioned difficulty function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PowAlgorithm {
    V0,
    V1,
    V2,
    V3,
}

impl PowAlgorithm {
    /// Selects the difficulty function for a target block version.
    pub fn for_block_version(version: u32) -> Self {
        match version {
            0 => Self::V0,
            1 => Self::V1,
            2..=4 => Self::V2,
            _ => Self::V3,
        }
    }
}

/// PoW verification port.
pub trait PowVerifier: Send + Sync {
    /// Returns true if `nonce` solves the target block at `difficulty`.
    fn verify_nonce(
        &self,
        algorithm: PowAlgorithm,
        block_checksum: &[u8],
        solver_address: &[u8],
        nonce: &[u8],
        difficulty: u64,
    ) -> bool;
}

/// Counts leading zero bits of a digest.
pub fn leading_zero_bits(hash: &[u8]) -> u32 {
    let mut bits = 0;
    for byte in hash {
        if *byte == 0 {
            bits += 8;
        } else {
            bits += byte.leading_zeros();
            break;
        }
    }
    bits
}

/// Computes the PoW digest for the given algorithm.
pub fn pow_hash(
    algorithm: PowAlgorithm,
    block_checksum: &[u8],
    solver_address: &[u8],
    nonce: &[u8],
) -> [u8; 64] {
    let mut input = Vec::with_capacity(block_checksum.len() + solver_address.len() + nonce.len());
    match algorithm {
        PowAlgorithm::V0 => {
            input.extend_from_slice(block_checksum);
            input.extend_from_slice(nonce);
            sha512(&input)
        }
        PowAlgorithm::V1 => {
            input.extend_from_slice(block_checksum);
            input.extend_from_slice(nonce);
            input.extend_from_slice(solver_address);
            sha512_sq(&input)
        }
        PowAlgorithm::V2 => {
            input.extend_from_slice(solver_address);
            input.extend_from_slice(block_checksum);
            input.extend_from_slice(nonce);
            sha512_sq(&input)
        }
        PowAlgorithm::V3 => {
            input.extend_from_slice(solver_address);
            input.extend_from_slice(&sha512_sq(block_checksum));
            input.extend_from_slice(nonce);
            sha512_sq(&input)
        }
    }
}

/// Hash-target verifier implementing all four difficulty functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashTargetPowVerifier;

impl PowVerifier for HashTargetPowVerifier {
    fn verify_nonce(
        &self,
        algorithm: PowAlgorithm,
        block_checksum: &[u8],
        solver_address: &[u8],
        nonce: &[u8],
        difficulty: u64,
    ) -> bool {
        if nonce.is_empty() || nonce.len() > 128 {
            return false;
        }
        let hash = pow_hash(algorithm, block_checksum, solver_address, nonce);
        u64::from(leading_zero_bits(&hash)) >= difficulty
    }
}

/// Brute-forces a nonce for low difficulties (tooling and tests).
pub fn find_nonce(
    algorithm: PowAlgorithm,
    block_checksum: &[u8],
    solver_address: &[u8],
    difficulty: u64,
    max_attempts: u64,
) -> Option<Vec<u8>> {
    (0..max_attempts)
        .map(|counter| counter.to_le_bytes().to_vec())
        .find(|nonce| {
            let hash = pow_hash(algorithm, block_checksum, solver_address, nonce);
            u64::from(leading_zero_bits(&hash)) >= difficulty
        })
}
