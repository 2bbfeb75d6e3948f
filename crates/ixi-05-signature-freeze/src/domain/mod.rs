//! # Domain Layer - Signature Freeze
//!
//! A block moves through three stages:
//!
//! ```text
//! Candidate ──accept──→ SignatureFreezing ──block N+5 accepted──→ Frozen
//! (height+1, in memory)  (stored, live signatures)   (stored, frozen set)
//! ```
//!
//! Block `N` commits to the frozen signatures of block `N - 5` through its
//! `signature_freeze_checksum`.

pub mod config;

pub use config::FreezeConfig;

/// Stage of a block in the freeze lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStage {
    Candidate,
    SignatureFreezing,
    Frozen,
}

/// Result of trying to accept the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
    Accepted(u64),
    /// Not enough signatures yet.
    Pending { have: usize, need: usize },
    NoCandidate,
}

/// Result of receiving a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOutcome {
    Accepted(u64),
    /// Became or merged into the candidate; waiting for signatures.
    Candidate { have: usize, need: usize },
    /// Transactions referenced by the candidate were requested.
    AwaitingTransactions { missing: usize },
    /// Already stored with the same checksum.
    AlreadyStored,
    /// Stored block at that height has a different checksum.
    Fork,
    /// Beyond `height + 1`; the next block was requested instead.
    Ahead,
}

/// Result of receiving a single block signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureOutcome {
    /// Added; carries the block number if this completed acceptance.
    Added { accepted: Option<u64> },
    Duplicate,
    /// Target block is already frozen.
    Stale,
    Future,
    UnknownSigner,
    InvalidSignature,
    HashMismatch,
    /// No candidate for `height + 1`; the block was requested.
    BlockRequested,
}

/// Result of a sigfreeze announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigFreezeOutcome {
    /// Local frozen set replaced by the announced one.
    Updated,
    /// Announced set equals the local one.
    Unchanged,
    /// Target block unknown locally; requested.
    Requested,
    /// Target checksum differs: another fork.
    Fork,
    /// No block declaring a freeze checksum for the target yet.
    Unverifiable,
    /// Announced set does not match the declared freeze checksum.
    Rejected,
}

/// Signatures block `N` needs: the configured floor or `percent` of block
/// `N - 1`'s effective signatures, rounded up, whichever is larger.
pub fn required_signatures(previous_signatures: usize, minimum: usize, percent: u64) -> usize {
    let scaled = (previous_signatures as u64 * percent).div_ceil(100) as usize;
    scaled.max(minimum)
}
