//! In-memory activity log.

use crate::ports::{ActivityEntry, ActivityLog, ActivityStatus};
use parking_lot::RwLock;
use shared_types::TxId;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct InMemoryActivityLog {
    entries: RwLock<HashMap<TxId, ActivityEntry>>,
}

impl InMemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, txid: &TxId) -> Option<ActivityEntry> {
        self.entries.read().get(txid).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl ActivityLog for InMemoryActivityLog {
    fn record(&self, entry: ActivityEntry) {
        self.entries.write().insert(entry.txid.clone(), entry);
    }

    fn update_status(&self, txid: &TxId, status: ActivityStatus, block_num: u64) {
        if let Some(entry) = self.entries.write().get_mut(txid) {
            entry.status = status;
            entry.block_num = block_num;
        }
    }
}
