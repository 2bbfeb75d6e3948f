//! Event publisher adapters.

use crate::ports::{AddressTopic, TransactionEventKind, TransactionEvents};
use parking_lot::Mutex;
use shared_types::{Address, Transaction, TxId};
use tracing::debug;

/// Publisher for nodes without subscribers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEvents;

impl TransactionEvents for NoOpEvents {
    fn publish(&self, _: TransactionEventKind, _: AddressTopic, _: &Address, _: &Transaction) {}
}

/// Publisher that writes each event to the log at `debug`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEvents;

impl TransactionEvents for TracingEvents {
    fn publish(
        &self,
        kind: TransactionEventKind,
        topic: AddressTopic,
        address: &Address,
        tx: &Transaction,
    ) {
        debug!(?kind, ?topic, %address, txid = %tx.id, "Transaction event");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub kind: TransactionEventKind,
    pub topic: AddressTopic,
    pub address: Address,
    pub txid: TxId,
}

/// Publisher that keeps every event.
#[derive(Debug, Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self, kind: TransactionEventKind) -> usize {
        self.events.lock().iter().filter(|e| e.kind == kind).count()
    }
}

impl TransactionEvents for RecordingEvents {
    fn publish(
        &self,
        kind: TransactionEventKind,
        topic: AddressTopic,
        address: &Address,
        tx: &Transaction,
    ) {
        self.events.lock().push(RecordedEvent {
            kind,
            topic,
            address: address.clone(),
            txid: tx.id.clone(),
        });
    }
}
