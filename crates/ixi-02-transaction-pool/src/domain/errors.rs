//! Error types for the transaction pool.
//!
//! Validation never panics: every rejection is a [`TxRejection`] returned to
//! the caller, which logs it at `warn` and drops the transaction.

use shared_types::{Address, Amount, TxId, WalletType};

/// Why a transaction was refused by verification, admission or application.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TxRejection {
    #[error("Genesis transaction outside block #1")]
    GenesisOutsideFirstBlock,

    #[error("Chain has no blocks yet")]
    ChainNotStarted,

    #[error("Only bootstrap transactions accepted at height {height}")]
    BootstrapWindow { height: u64 },

    #[error("Transaction version {version} not allowed for block version {block_version}")]
    UnsupportedVersion { version: u32, block_version: u32 },

    #[error("Transaction bound to block height 0")]
    ZeroBlockHeight,

    #[error("Block height {block_height} outside window [{min}, {max}]")]
    BlockHeightOutOfWindow { block_height: u64, min: u64, max: u64 },

    #[error("Zero amount")]
    ZeroAmount,

    #[error("Negative amount")]
    NegativeAmount,

    #[error("Negative fee")]
    NegativeFee,

    #[error("Multisig payload does not match transaction type")]
    MultisigPayloadMismatch,

    #[error("Multisig transaction must have exactly one input")]
    MultisigInputCount,

    #[error("Multisig operation must not carry outputs")]
    MultisigUnexpectedOutputs,

    #[error("Invalid required signature count {0}")]
    InvalidRequiredSigs(u8),

    #[error("Invalid multisig signer key")]
    InvalidSignerKey,

    #[error("Checksum mismatch")]
    ChecksumMismatch,

    #[error("Data checksum mismatch")]
    DataChecksumMismatch,

    #[error("Invalid input nonce length {len}")]
    InvalidNonce { len: usize },

    #[error("Negative input or output amount")]
    NegativeEntry,

    #[error("Inputs {inputs} do not equal amount + fee {expected}")]
    InputSumMismatch { inputs: Amount, expected: Amount },

    #[error("Source wallet must be {expected:?}")]
    WalletTypeMismatch { expected: WalletType },

    #[error("Insufficient funds in {address}: balance {balance}, required {required}")]
    InsufficientFunds {
        address: Address,
        balance: Amount,
        required: Amount,
    },

    #[error("Invalid output address")]
    InvalidOutputAddress,

    #[error("Outputs {outputs} do not equal amount {amount}")]
    OutputSumMismatch { outputs: Amount, amount: Amount },

    #[error("Malformed PoW solution payload")]
    PowInvalidPayload,

    #[error("PoW target block {target} is ahead of height {height}")]
    PowFutureTarget { target: u64, height: u64 },

    #[error("PoW target block {0} already solved")]
    PowAlreadySolved(u64),

    #[error("PoW target block {target} too deep below height {height}")]
    PowTooDeep { target: u64, height: u64 },

    #[error("PoW nonce does not meet difficulty")]
    PowInvalidNonce,

    #[error("Unknown block {0}")]
    UnknownBlock(u64),

    #[error("Fee {fee} below minimum {minimum}")]
    FeeTooLow { fee: Amount, minimum: Amount },

    #[error("Public key length {len} outside [32, 2500]")]
    InvalidPublicKey { len: usize },

    #[error("Sender public key unknown")]
    MissingPublicKey,

    #[error("Input address does not derive from the signing key")]
    AddressMismatch,

    #[error("Signature verification failed")]
    InvalidSignature,

    #[error("Signer {0} not allowed for wallet")]
    SignerNotAllowed(Address),

    #[error("Premine wallet {address} may not drop below {floor}")]
    PremineCapExceeded { address: Address, floor: Amount },

    #[error("Duplicate transaction {0}")]
    Duplicate(TxId),

    #[error("Transaction {0} not in pool")]
    NotInPool(TxId),

    #[error("Block number 0 is not a valid application target")]
    ZeroBlockNum,

    #[error("Multisig quorum not met: {have} of {required}")]
    QuorumNotMet { have: usize, required: usize },

    #[error("Original multisig transaction {0} not found")]
    MissingOriginal(TxId),

    #[error("Signer {0} already present")]
    SignerAlreadyPresent(Address),

    #[error("Signer {0} not present")]
    SignerNotPresent(Address),

    #[error("Staking transaction does not target block {expected}")]
    StakingTargetMismatch { expected: u64 },

    #[error("Staking recipient {0} did not sign the target block")]
    StakingRecipientNotSigner(Address),

    #[error("Staker {0} rewarded twice in one block")]
    DuplicateStaker(Address),

    #[error("Transaction type not valid here")]
    UnexpectedType,
}

impl TxRejection {
    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::GenesisOutsideFirstBlock
            | Self::ChainNotStarted
            | Self::BootstrapWindow { .. } => "chain_state",
            Self::UnsupportedVersion { .. } => "version",
            Self::ZeroBlockHeight | Self::BlockHeightOutOfWindow { .. } => "block_height",
            Self::ZeroAmount
            | Self::NegativeAmount
            | Self::NegativeFee
            | Self::NegativeEntry
            | Self::InputSumMismatch { .. }
            | Self::OutputSumMismatch { .. } => "amount",
            Self::MultisigPayloadMismatch
            | Self::MultisigInputCount
            | Self::MultisigUnexpectedOutputs
            | Self::InvalidRequiredSigs(_)
            | Self::InvalidSignerKey
            | Self::QuorumNotMet { .. }
            | Self::MissingOriginal(_)
            | Self::SignerAlreadyPresent(_)
            | Self::SignerNotPresent(_)
            | Self::SignerNotAllowed(_) => "multisig",
            Self::ChecksumMismatch | Self::DataChecksumMismatch => "checksum",
            Self::InvalidNonce { .. }
            | Self::InvalidPublicKey { .. }
            | Self::MissingPublicKey
            | Self::AddressMismatch
            | Self::InvalidSignature => "signature",
            Self::WalletTypeMismatch { .. } => "wallet_type",
            Self::InsufficientFunds { .. } => "overspend",
            Self::InvalidOutputAddress => "address",
            Self::PowInvalidPayload
            | Self::PowFutureTarget { .. }
            | Self::PowAlreadySolved(_)
            | Self::PowTooDeep { .. }
            | Self::PowInvalidNonce => "pow",
            Self::UnknownBlock(_) => "unknown_block",
            Self::FeeTooLow { .. } => "fee",
            Self::PremineCapExceeded { .. } => "premine",
            Self::Duplicate(_) => "duplicate",
            Self::NotInPool(_) | Self::ZeroBlockNum => "state",
            Self::StakingTargetMismatch { .. }
            | Self::StakingRecipientNotSigner(_)
            | Self::DuplicateStaker(_) => "staking",
            Self::UnexpectedType => "type",
        }
    }
}

/// Why a block's transactions could not be applied. No wallet effect survives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockApplyError {
    #[error("Wallet state already inside a block bracket")]
    WalletBracketBusy,

    #[error("Transaction {0} referenced by block is not in the pool")]
    MissingTransaction(TxId),

    #[error("Staking transactions in pool do not match the block's staking list")]
    StakingSetMismatch,

    #[error("{count} transaction(s) failed, first {first}: {reason}")]
    TransactionsFailed {
        count: usize,
        first: TxId,
        reason: TxRejection,
    },

    #[error("Transaction {0} not ready to apply")]
    NotReady(TxId),

    #[error("Cannot reward miners of unknown block {0}")]
    MinerRewardTarget(u64),
}

impl BlockApplyError {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::WalletBracketBusy => "bracket_busy",
            Self::MissingTransaction(_) => "missing_transaction",
            Self::StakingSetMismatch => "staking_mismatch",
            Self::TransactionsFailed { .. } => "transaction_failed",
            Self::NotReady(_) => "not_ready",
            Self::MinerRewardTarget(_) => "miner_reward",
        }
    }
}

pub type PoolResult<T> = Result<T, TxRejection>;
