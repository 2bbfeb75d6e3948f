//! Error types for the signature-freeze coordinator.

use ixi_02_transaction_pool::BlockApplyError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FreezeError {
    /// Candidate lock not acquired in time; the request is dropped.
    #[error("Timed out waiting for the candidate block lock")]
    LockTimeout,

    #[error("Block #{block_num} checksum does not match its contents")]
    InvalidBlockChecksum { block_num: u64 },

    #[error("Block #{block_num} does not extend the local tip")]
    ParentMismatch { block_num: u64 },

    #[error("Block #{block_num} lacks a signature freeze checksum")]
    FreezeChecksumMissing { block_num: u64 },

    #[error("Block #{block_num} freeze checksum disagrees with local signatures of #{target}")]
    FreezeChecksumMismatch { block_num: u64, target: u64 },

    #[error("Freeze target #{target} is not stored")]
    FreezeTargetMissing { target: u64 },

    #[error("Applying block transactions failed: {0}")]
    Apply(#[from] BlockApplyError),

    #[error("Chain refused block #{block_num}")]
    AppendRejected { block_num: u64 },
}

impl FreezeError {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::LockTimeout => "lock_timeout",
            Self::InvalidBlockChecksum { .. } => "invalid_checksum",
            Self::ParentMismatch { .. } => "parent_mismatch",
            Self::FreezeChecksumMissing { .. } => "freeze_checksum_missing",
            Self::FreezeChecksumMismatch { .. } => "freeze_checksum_mismatch",
            Self::FreezeTargetMissing { .. } => "freeze_target_missing",
            Self::Apply(_) => "apply_failed",
            Self::AppendRejected { .. } => "append_rejected",
        }
    }
}

pub type FreezeResult<T> = Result<T, FreezeError>;
