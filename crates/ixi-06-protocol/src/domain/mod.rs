//! # Domain Layer - Protocol
//!
//! Outcomes reported by the message handlers, their configuration and
//! errors. Payload codecs live in `shared_types::messages`.

pub mod config;
pub mod errors;

pub use config::ProtocolConfig;
pub use errors::{ProtocolError, ProtocolResult};

use ixi_04_inventory::InventoryReport;
use ixi_05_signature_freeze::{BlockOutcome, SigFreezeOutcome};

/// What handling one inbound message did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Transactions offered to the pool.
    Transactions {
        added: usize,
        known: usize,
        rejected: usize,
    },
    Block(BlockOutcome),
    /// Incremental signatures offered to the coordinator.
    Signatures { added: usize, ignored: usize },
    SigFreeze(SigFreezeOutcome),
    KeepAlives { updated: usize, ignored: usize },
    Inventory(InventoryReport),
    /// A request answered with this many messages.
    Replied(usize),
    /// A request for content not held locally.
    NotFound,
}
