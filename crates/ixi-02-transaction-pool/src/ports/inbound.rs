//! # Inbound Port - TransactionPoolApi
//!
//! | Method | Caller |
//! |--------|--------|
//! | `add_transaction` | Protocol handlers, local wallet |
//! | `apply_transactions_from_block` | Signature-freeze coordinator |
//! | `get_applied_transaction` | Protocol handlers |
//! | `redact_transactions_for_block` | Chain maintenance |
//! | `generate_staking_transactions` | Signature-freeze coordinator |
//! | `confirm_pending` | Protocol handlers |

use crate::domain::{ApplyMode, BlockApplyError, PoolCounts, TxRejection};
use shared_types::{Block, EndpointId, Transaction, TxId};

/// Primary API of the transaction pool.
pub trait TransactionPoolApi: Send + Sync {
    /// Validates against the current chain head without touching the pool.
    fn verify_transaction(
        &self,
        tx: &Transaction,
        origin: Option<&EndpointId>,
        full_check: bool,
    ) -> Result<(), TxRejection>;

    /// Verifies and inserts a transaction, then broadcasts it.
    ///
    /// With `verify == false` only the checksums are re-checked.
    fn add_transaction(
        &self,
        tx: Transaction,
        no_broadcast: bool,
        origin: Option<&EndpointId>,
        verify: bool,
    ) -> Result<(), TxRejection>;

    /// Applies every transaction of `block` atomically.
    fn apply_transactions_from_block(
        &self,
        block: &Block,
        mode: ApplyMode,
    ) -> Result<(), BlockApplyError>;

    fn get_unapplied_transaction(&self, txid: &TxId) -> Option<Transaction>;

    fn get_applied_transaction(
        &self,
        txid: &TxId,
        block_num: u64,
        search_storage: bool,
    ) -> Option<Transaction>;

    fn has_transaction(&self, txid: &TxId) -> bool;

    fn redact_transactions_for_block(&self, block: &Block) -> usize;

    fn unredact_transactions_for_block(&self, block: &Block) -> usize;

    fn counts(&self) -> PoolCounts;

    /// Staking rewards block `block_num` must carry.
    fn generate_staking_transactions(&self, block_num: u64) -> Vec<Transaction>;

    /// Records that `endpoint` relayed a locally originated transaction.
    fn confirm_pending(&self, txid: &TxId, endpoint: EndpointId) -> Option<usize>;
}
