//! # Inventory Subsystem (ixi-04)
//!
//! Deduplicates peer announcements and fetches each announced item at most
//! once, retrying through other announcers when a request goes unanswered.
//!
//! ## Architecture Role
//!
//! ```text
//! [Peer] ──Inventory──→ [Protocol (6)] ──process_inventory──→ [Inventory (4)]
//!                                                                  │
//!                          GetBlock / GetBlockSignatures /         │
//!                          GetTransactions / GetKeepAlives ←───────┘
//! ```
//!
//! ## Cache
//!
//! | Type | Default capacity |
//! |------|------------------|
//! | Block | 100 |
//! | BlockSignature | 200,000 |
//! | Transaction | 600,000 |
//! | KeepAlive | 600,000 |
//!
//! Entries are evicted oldest-announcement-first. Unprocessed entries are
//! retried every `throttle_ms` (10 s) and dropped after `max_retries` (5).

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{ChainSignatureLookup, PoolTransactionLookup};
pub use domain::*;
pub use ports::{InventoryApi, SignatureLookup, TransactionLookup};
pub use service::{InventoryDependencies, InventoryService};
