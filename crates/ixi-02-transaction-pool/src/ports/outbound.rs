//! Outbound (driven) ports owned by the transaction pool.
//!
//! Chain, wallet, storage, network and clock ports come from
//! `shared_types::ports`; signature and PoW verification from `shared_crypto`.

use shared_types::{Address, Amount, Transaction, TxId};

pub use shared_types::ports::{SystemTimeSource, TimeSource};

/// Address topic an event is published on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressTopic {
    From,
    To,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionEventKind {
    /// Entered the unapplied map.
    Added,
    /// Moved to the applied map.
    Applied,
}

/// Subscriber notifications.
pub trait TransactionEvents: Send + Sync {
    fn publish(
        &self,
        kind: TransactionEventKind,
        topic: AddressTopic,
        address: &Address,
        tx: &Transaction,
    );
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityStatus {
    Pending,
    Final,
    Error,
}

/// A wallet activity record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    pub txid: TxId,
    pub addresses: Vec<Address>,
    pub amount: Amount,
    pub status: ActivityStatus,
    pub block_num: u64,
    pub timestamp: i64,
}

/// Wallet activity history.
pub trait ActivityLog: Send + Sync {
    fn record(&self, entry: ActivityEntry);

    fn update_status(&self, txid: &TxId, status: ActivityStatus, block_num: u64);
}
