//! # Pool State
//!
//! The two transaction maps guarded by the pool lock.
//!
//! ```text
//!            add                    set_applied_flag
//! (network) ─────→ [unapplied] ──────────────────────→ [applied: Live(tx)]
//!                                                          │ compact
//!                                                          ↓
//!                                                    [applied: Tombstone] ──redact──→ (storage only)
//! ```
//!
//! ## Invariants
//!
//! - An id lives in at most one map.
//! - A transaction with status `Applied(_)` is never in `unapplied`.

use super::entities::PoolCounts;
use shared_types::{Transaction, TxId, TxStatus};
use std::collections::HashMap;

/// Entry of the applied map.
#[derive(Debug, Clone, PartialEq)]
pub enum AppliedEntry {
    Live(Transaction),
    /// Compacted; the transaction is in storage. Carries the applying block.
    Tombstone(u64),
}

impl AppliedEntry {
    pub fn transaction(&self) -> Option<&Transaction> {
        match self {
            Self::Live(tx) => Some(tx),
            Self::Tombstone(_) => None,
        }
    }

    pub fn block_num(&self) -> Option<u64> {
        match self {
            Self::Live(tx) => tx.applied_block(),
            Self::Tombstone(block_num) => Some(*block_num),
        }
    }
}

/// Unapplied and applied transactions.
#[derive(Debug, Default)]
pub struct PoolState {
    unapplied: HashMap<TxId, Transaction>,
    applied: HashMap<TxId, AppliedEntry>,
}

impl PoolState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unapplied(&self, txid: &TxId) -> Option<&Transaction> {
        self.unapplied.get(txid)
    }

    pub fn unapplied_mut(&mut self, txid: &TxId) -> Option<&mut Transaction> {
        self.unapplied.get_mut(txid)
    }

    pub fn contains_unapplied(&self, txid: &TxId) -> bool {
        self.unapplied.contains_key(txid)
    }

    /// Unapplied transactions ordered by id.
    pub fn unapplied_sorted(&self) -> Vec<&Transaction> {
        let mut txs: Vec<&Transaction> = self.unapplied.values().collect();
        txs.sort_by(|a, b| a.id.cmp(&b.id));
        txs
    }

    pub fn unapplied_ids(&self) -> Vec<TxId> {
        let mut ids: Vec<TxId> = self.unapplied.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Inserts an unapplied transaction. Returns false if the id is already known.
    pub fn insert_unapplied(&mut self, mut tx: Transaction) -> bool {
        if self.unapplied.contains_key(&tx.id) || self.applied.contains_key(&tx.id) {
            return false;
        }
        tx.status = TxStatus::Unapplied;
        self.unapplied.insert(tx.id.clone(), tx);
        true
    }

    pub fn remove_unapplied(&mut self, txid: &TxId) -> Option<Transaction> {
        self.unapplied.remove(txid)
    }

    pub fn applied(&self, txid: &TxId) -> Option<&AppliedEntry> {
        self.applied.get(txid)
    }

    pub fn contains_applied(&self, txid: &TxId) -> bool {
        self.applied.contains_key(txid)
    }

    /// Moves a transaction to the applied map with `Applied(block_num)`.
    pub fn mark_applied(&mut self, txid: &TxId, block_num: u64) -> Option<Transaction> {
        let mut tx = self.unapplied.remove(txid)?;
        tx.status = TxStatus::Applied(block_num);
        self.applied
            .insert(txid.clone(), AppliedEntry::Live(tx.clone()));
        Some(tx)
    }

    /// Re-inserts an applied transaction loaded from storage.
    pub fn restore_applied(&mut self, tx: Transaction) {
        self.unapplied.remove(&tx.id);
        self.applied.insert(tx.id.clone(), AppliedEntry::Live(tx));
    }

    pub fn remove_applied(&mut self, txid: &TxId) -> bool {
        self.applied.remove(txid).is_some()
    }

    /// Replaces a live applied entry with a tombstone.
    pub fn compact(&mut self, txid: &TxId) -> bool {
        let Some(entry) = self.applied.get_mut(txid) else {
            return false;
        };
        let block_num = match entry {
            AppliedEntry::Live(tx) => tx.applied_block(),
            AppliedEntry::Tombstone(_) => None,
        };
        match block_num {
            Some(block_num) => {
                *entry = AppliedEntry::Tombstone(block_num);
                true
            }
            None => false,
        }
    }

    /// Removes applied entries (live or tombstoned) applied before `min_block`.
    pub fn redact_below(&mut self, min_block: u64) -> usize {
        let before = self.applied.len();
        self.applied
            .retain(|_, entry| entry.block_num().is_some_and(|b| b >= min_block));
        before - self.applied.len()
    }

    /// Removes unapplied transactions matching `predicate`, returning their ids.
    pub fn drain_unapplied_where(
        &mut self,
        mut predicate: impl FnMut(&Transaction) -> bool,
    ) -> Vec<TxId> {
        let ids: Vec<TxId> = self
            .unapplied
            .values()
            .filter(|tx| predicate(tx))
            .map(|tx| tx.id.clone())
            .collect();
        for id in &ids {
            self.unapplied.remove(id);
        }
        ids
    }

    /// Resets every `ReadyToApply(block_num)` mark back to `Unapplied`.
    pub fn clear_ready_marks(&mut self, block_num: u64) {
        for tx in self.unapplied.values_mut() {
            if tx.status.is_ready_for(block_num) {
                tx.status = TxStatus::Unapplied;
            }
        }
    }

    pub fn clear(&mut self) {
        self.unapplied.clear();
        self.applied.clear();
    }

    pub fn counts(&self) -> PoolCounts {
        let tombstones = self
            .applied
            .values()
            .filter(|e| matches!(e, AppliedEntry::Tombstone(_)))
            .count();
        PoolCounts {
            unapplied: self.unapplied.len(),
            applied: self.applied.len() - tombstones,
            tombstones,
            pending: 0,
        }
    }
}
