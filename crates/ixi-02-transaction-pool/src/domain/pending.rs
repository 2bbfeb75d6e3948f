//! Pending-broadcast tracker for locally originated transactions.
//!
//! A tracked transaction is re-broadcast until enough peers confirm they
//! hold it, or until it is applied, expires or stops verifying.

use super::entities::Timestamp;
use shared_types::{EndpointId, TxId};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub added_at: Timestamp,
    pub last_broadcast: Timestamp,
    /// Set when an inquiry was sent since the last broadcast.
    pub inquired: bool,
    pub confirmations: HashSet<EndpointId>,
}

/// Next step for a pending entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    Rebroadcast,
    Inquire,
    Wait,
}

#[derive(Debug, Default)]
pub struct PendingTracker {
    entries: BTreeMap<TxId, PendingEntry>,
}

impl PendingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, txid: TxId, now: Timestamp) {
        self.entries.entry(txid).or_insert(PendingEntry {
            added_at: now,
            last_broadcast: now,
            inquired: false,
            confirmations: HashSet::new(),
        });
    }

    pub fn remove(&mut self, txid: &TxId) -> bool {
        self.entries.remove(txid).is_some()
    }

    pub fn contains(&self, txid: &TxId) -> bool {
        self.entries.contains_key(txid)
    }

    /// Records a peer confirming it holds `txid`. Returns the confirmation count.
    pub fn confirm(&mut self, txid: &TxId, endpoint: EndpointId) -> Option<usize> {
        let entry = self.entries.get_mut(txid)?;
        entry.confirmations.insert(endpoint);
        Some(entry.confirmations.len())
    }

    pub fn ids(&self) -> Vec<TxId> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Decides the next step for `txid` and records it as taken.
    pub fn next_action(
        &mut self,
        txid: &TxId,
        now: Timestamp,
        rebroadcast_ms: u64,
        inquiry_ms: u64,
        confirmations_needed: usize,
    ) -> PendingAction {
        let Some(entry) = self.entries.get_mut(txid) else {
            return PendingAction::Wait;
        };
        if entry.confirmations.len() >= confirmations_needed {
            return PendingAction::Wait;
        }
        let elapsed = now.saturating_sub(entry.last_broadcast);
        if elapsed >= rebroadcast_ms {
            entry.last_broadcast = now;
            entry.inquired = false;
            return PendingAction::Rebroadcast;
        }
        if elapsed >= inquiry_ms && !entry.inquired {
            entry.inquired = true;
            return PendingAction::Inquire;
        }
        PendingAction::Wait
    }
}
