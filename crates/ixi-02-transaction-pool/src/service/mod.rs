//! Transaction Pool Service
//!
//! Owns the pool lock and drives the application engine. Every operation
//! that touches both maps runs under the single `state` mutex; block
//! application holds it for the whole pass so no thread observes a
//! partially applied block.
//!
//! Lock order: `state` before `pending`.

mod apply;
mod maintenance;
mod multisig;
mod verify;

#[cfg(test)]
mod tests;

use crate::domain::{
    AppliedEntry, ApplyMode, BlockApplyError, PendingTracker, PoolConfig, PoolCounts, PoolState,
    TxRejection,
};
use crate::metrics;
use crate::ports::{
    ActivityEntry, ActivityLog, ActivityStatus, AddressTopic, TimeSource, TransactionEventKind,
    TransactionEvents, TransactionPoolApi,
};
use parking_lot::Mutex;
use shared_crypto::{PowVerifier, SignatureVerifier};
use shared_types::{
    Block, BlockChain, EndpointId, NodeType, PeerNetwork, ProtocolMessageCode, Transaction,
    TransactionStorage, TxId, WalletState,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Node roles that relay transactions.
pub const TX_RELAY_NODE_TYPES: [NodeType; 3] = [NodeType::Master, NodeType::Relay, NodeType::Full];

/// Collaborators of the pool.
pub struct PoolDependencies {
    pub chain: Arc<dyn BlockChain>,
    pub wallets: Arc<dyn WalletState>,
    pub storage: Arc<dyn TransactionStorage>,
    pub network: Arc<dyn PeerNetwork>,
    pub signatures: Arc<dyn SignatureVerifier>,
    pub pow: Arc<dyn PowVerifier>,
    pub events: Arc<dyn TransactionEvents>,
    pub activity: Arc<dyn ActivityLog>,
    pub time: Arc<dyn TimeSource>,
}

/// The transaction pool and consensus application engine.
pub struct TransactionPoolService {
    chain: Arc<dyn BlockChain>,
    wallets: Arc<dyn WalletState>,
    storage: Arc<dyn TransactionStorage>,
    network: Arc<dyn PeerNetwork>,
    signatures: Arc<dyn SignatureVerifier>,
    pow: Arc<dyn PowVerifier>,
    events: Arc<dyn TransactionEvents>,
    activity: Arc<dyn ActivityLog>,
    time: Arc<dyn TimeSource>,
    config: PoolConfig,
    state: Mutex<PoolState>,
    pending: Mutex<PendingTracker>,
}

impl TransactionPoolService {
    pub fn new(deps: PoolDependencies, config: PoolConfig) -> Self {
        Self {
            chain: deps.chain,
            wallets: deps.wallets,
            storage: deps.storage,
            network: deps.network,
            signatures: deps.signatures,
            pow: deps.pow,
            events: deps.events,
            activity: deps.activity,
            time: deps.time,
            config,
            state: Mutex::new(PoolState::new()),
            pending: Mutex::new(PendingTracker::new()),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    // === ADMISSION ===

    /// Verifies and inserts a transaction.
    ///
    /// With `verify == false` only checksums are re-checked (trusted replays).
    pub fn add_transaction(
        &self,
        tx: Transaction,
        no_broadcast: bool,
        origin: Option<&EndpointId>,
        verify: bool,
    ) -> Result<(), TxRejection> {
        let txid = tx.id.clone();
        let result = self.add_transaction_inner(tx, no_broadcast, origin, verify);
        match &result {
            Ok(()) => metrics::record_transaction_accepted(),
            Err(reason) => {
                debug!(%txid, %reason, "Transaction not added");
                metrics::record_transaction_rejected(reason.reason());
            }
        }
        result
    }

    fn add_transaction_inner(
        &self,
        tx: Transaction,
        no_broadcast: bool,
        origin: Option<&EndpointId>,
        verify: bool,
    ) -> Result<(), TxRejection> {
        if verify {
            self.verify_transaction(&tx, origin, true)?;
        } else if !tx.verify_checksums() {
            return Err(TxRejection::ChecksumMismatch);
        }

        {
            let mut state = self.state.lock();
            if state.contains_unapplied(&tx.id) || state.contains_applied(&tx.id) {
                return Err(TxRejection::Duplicate(tx.id.clone()));
            }
            // Redacted out of the applied map but still stored.
            if self.storage.get_transaction(&tx.id, 0).is_some() {
                return Err(TxRejection::Duplicate(tx.id.clone()));
            }
            state.insert_unapplied(tx.clone());
        }

        if !tx.from_local_storage {
            self.activity.record(ActivityEntry {
                txid: tx.id.clone(),
                addresses: tx.to_list.keys().cloned().collect(),
                amount: tx.amount.clone(),
                status: ActivityStatus::Pending,
                block_num: 0,
                timestamp: tx.timestamp,
            });
        }

        if !self.chain.is_synchronizing() {
            if !no_broadcast {
                self.broadcast_transaction(&tx, origin);
                if origin.is_none() {
                    self.pending.lock().track(tx.id.clone(), self.time.now());
                }
            }
            self.publish_events(TransactionEventKind::Added, &tx);
        }

        info!(
            txid = %tx.id,
            tx_type = ?tx.tx_type,
            amount = %tx.amount,
            "Transaction added to pool"
        );
        Ok(())
    }

    fn broadcast_transaction(&self, tx: &Transaction, skip: Option<&EndpointId>) {
        match tx.to_bytes() {
            Ok(payload) => {
                self.network.broadcast(
                    &TX_RELAY_NODE_TYPES,
                    ProtocolMessageCode::NewTransaction,
                    payload,
                    skip,
                );
            }
            Err(e) => error!(txid = %tx.id, error = %e, "Failed to encode transaction"),
        }
    }

    fn publish_events(&self, kind: TransactionEventKind, tx: &Transaction) {
        for (address, _) in tx.input_addresses() {
            self.events.publish(kind, AddressTopic::From, &address, tx);
        }
        for address in tx.to_list.keys() {
            self.events.publish(kind, AddressTopic::To, address, tx);
        }
    }

    // === APPLIED FLAG ===

    /// Moves a transaction from unapplied to applied.
    pub fn set_applied_flag(
        &self,
        txid: &TxId,
        block_num: u64,
        add_to_storage: bool,
    ) -> Result<(), TxRejection> {
        let mut state = self.state.lock();
        self.set_applied_flag_locked(&mut state, txid, block_num, add_to_storage)
    }

    fn set_applied_flag_locked(
        &self,
        state: &mut PoolState,
        txid: &TxId,
        block_num: u64,
        add_to_storage: bool,
    ) -> Result<(), TxRejection> {
        if block_num == 0 {
            error!(%txid, "set_applied_flag called with block number 0");
            return Err(TxRejection::ZeroBlockNum);
        }
        let tx = state
            .mark_applied(txid, block_num)
            .ok_or_else(|| TxRejection::NotInPool(txid.clone()))?;

        self.activity
            .update_status(txid, ActivityStatus::Final, block_num);
        self.pending.lock().remove(txid);
        if add_to_storage && !self.storage.insert_transaction(&tx) {
            debug!(%txid, "Transaction already in storage");
        }
        self.publish_events(TransactionEventKind::Applied, &tx);
        Ok(())
    }

    // === QUERIES ===

    pub fn get_unapplied_transaction(&self, txid: &TxId) -> Option<Transaction> {
        self.state.lock().unapplied(txid).cloned()
    }

    /// Unapplied transactions ordered by id.
    pub fn get_unapplied_transactions(&self) -> Vec<Transaction> {
        self.state
            .lock()
            .unapplied_sorted()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Looks up an applied transaction, falling back to storage for
    /// tombstones and misses when `search_storage` is set.
    pub fn get_applied_transaction(
        &self,
        txid: &TxId,
        block_num: u64,
        search_storage: bool,
    ) -> Option<Transaction> {
        if let Some(tx) = self
            .state
            .lock()
            .applied(txid)
            .and_then(AppliedEntry::transaction)
        {
            return Some(tx.clone());
        }
        if search_storage {
            return self.storage.get_transaction(txid, block_num);
        }
        None
    }

    pub fn has_transaction(&self, txid: &TxId) -> bool {
        let state = self.state.lock();
        state.contains_unapplied(txid) || state.contains_applied(txid)
    }

    pub fn remove_transaction(&self, txid: &TxId) -> bool {
        let mut state = self.state.lock();
        let removed = state.remove_unapplied(txid).is_some();
        self.pending.lock().remove(txid);
        removed
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.clear();
        self.pending.lock().clear();
    }

    pub fn counts(&self) -> PoolCounts {
        let state = self.state.lock();
        PoolCounts {
            pending: self.pending.lock().len(),
            ..state.counts()
        }
    }

    pub fn is_pending(&self, txid: &TxId) -> bool {
        self.pending.lock().contains(txid)
    }

    // === REDACTION ===

    /// Drops a block's transactions from the applied map.
    pub fn redact_transactions_for_block(&self, block: &Block) -> usize {
        let mut state = self.state.lock();
        block
            .transactions
            .iter()
            .filter(|txid| state.remove_applied(txid))
            .count()
    }

    /// Reloads a block's transactions from storage into the applied map.
    pub fn unredact_transactions_for_block(&self, block: &Block) -> usize {
        let mut state = self.state.lock();
        let mut restored = 0;
        for txid in &block.transactions {
            match self.storage.get_transaction(txid, block.block_num) {
                Some(tx) => {
                    state.restore_applied(tx);
                    restored += 1;
                }
                None => {
                    warn!(%txid, block_num = block.block_num, "Cannot unredact: not in storage")
                }
            }
        }
        restored
    }

    /// Replaces a block's applied entries with tombstones.
    pub fn compact_transactions_for_block(&self, block: &Block) -> usize {
        let mut state = self.state.lock();
        block
            .transactions
            .iter()
            .filter(|txid| state.compact(txid))
            .count()
    }
}

impl TransactionPoolApi for TransactionPoolService {
    fn verify_transaction(
        &self,
        tx: &Transaction,
        origin: Option<&EndpointId>,
        full_check: bool,
    ) -> Result<(), TxRejection> {
        TransactionPoolService::verify_transaction(self, tx, origin, full_check)
    }

    fn add_transaction(
        &self,
        tx: Transaction,
        no_broadcast: bool,
        origin: Option<&EndpointId>,
        verify: bool,
    ) -> Result<(), TxRejection> {
        TransactionPoolService::add_transaction(self, tx, no_broadcast, origin, verify)
    }

    fn apply_transactions_from_block(
        &self,
        block: &Block,
        mode: ApplyMode,
    ) -> Result<(), BlockApplyError> {
        TransactionPoolService::apply_transactions_from_block(self, block, mode)
    }

    fn get_unapplied_transaction(&self, txid: &TxId) -> Option<Transaction> {
        TransactionPoolService::get_unapplied_transaction(self, txid)
    }

    fn get_applied_transaction(
        &self,
        txid: &TxId,
        block_num: u64,
        search_storage: bool,
    ) -> Option<Transaction> {
        TransactionPoolService::get_applied_transaction(self, txid, block_num, search_storage)
    }

    fn has_transaction(&self, txid: &TxId) -> bool {
        TransactionPoolService::has_transaction(self, txid)
    }

    fn redact_transactions_for_block(&self, block: &Block) -> usize {
        TransactionPoolService::redact_transactions_for_block(self, block)
    }

    fn unredact_transactions_for_block(&self, block: &Block) -> usize {
        TransactionPoolService::unredact_transactions_for_block(self, block)
    }

    fn counts(&self) -> PoolCounts {
        TransactionPoolService::counts(self)
    }

    fn generate_staking_transactions(&self, block_num: u64) -> Vec<Transaction> {
        TransactionPoolService::generate_staking_transactions(self, block_num)
    }

    fn confirm_pending(&self, txid: &TxId, endpoint: EndpointId) -> Option<usize> {
        TransactionPoolService::confirm_pending(self, txid, endpoint)
    }
}
