//! # Protocol Subsystem
//!
//! **Subsystem ID:** 6
//!
//! ## Purpose
//!
//! Decodes inbound peer messages and hands them to the subsystem that owns
//! their content. Requests for local content are answered directly.
//!
//! ## Dispatch
//!
//! | Code | Target |
//! |------|--------|
//! | `NewTransaction`, `TransactionData`, `TransactionsChunk` | Pool (2) `add_transaction` |
//! | `GetTransaction`, `GetTransactions` | reply `TransactionData` / `TransactionsChunk` |
//! | `BlockData` | Signature freeze (5) `on_block_received` |
//! | `GetBlock` | reply `BlockData` (+ `TransactionsChunk`) |
//! | `BlockSignature` | Signature freeze (5) `on_signature_received` |
//! | `BlockSignatures`, `SignaturesChunk` | Signature freeze (5) chunk or sigfreeze |
//! | `GetBlockSignatures` | reply `BlockSignatures` |
//! | `GetKeepAlives`, `GetPresence` | reply `KeepAlivesChunk` |
//! | `KeepAlivesChunk` | Presence directory |
//! | `Inventory` | Inventory (4) `process_inventory` |
//!
//! Every received content item is marked processed in the inventory cache
//! so later announcements of it are not fetched again.

pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

pub use domain::*;
pub use ports::ProtocolApi;
pub use service::{ProtocolDependencies, ProtocolMessageHandler};
