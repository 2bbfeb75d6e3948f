//! # Transaction Pool Subsystem
//!
//! **Subsystem ID:** 2
//!
//! ## Purpose
//!
//! Admits, verifies and holds unapplied transactions, and applies the
//! transactions of an accepted block atomically against wallet state.
//! The pool is the consensus application engine: a block is valid only if
//! every transaction it names can be applied here.
//!
//! ## Pool Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | A txid is never both unapplied and applied | `domain/pool.rs` - `insert_unapplied()` / `mark_applied()` |
//! | Block application is all-or-nothing | `service/apply.rs` - wallet bracket, revert on any failure |
//! | Failed transactions leave the pool | `service/apply.rs` - purge after the pass |
//! | Staking set in block equals pool staking set | `service/apply.rs` - `apply_staking_transactions()` |
//! | Multisig quorum counts distinct signers | `service/multisig.rs` - `get_related_multisig_transactions()` |
//!
//! ## Transaction Lifecycle
//!
//! ```text
//! [UNAPPLIED] ──apply pass──→ [READY_TO_APPLY(n)] ──commit──→ [APPLIED(n)]
//!      ↑                              │                          │
//!      └──────── verify / revert ─────┘               compact ──→ [TOMBSTONE]
//!                                                     redact  ──→ (removed)
//! ```
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  adapters/ - manual clock, event recorder, activity log        │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ports/inbound.rs  - TransactionPoolApi                        │
//! │  ports/outbound.rs - TimeSource, TransactionEvents, ActivityLog│
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  service/ - verification, block application, maintenance       │
//! │  domain/  - pool maps, pending tracker, consensus rules        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::*;
pub use domain::*;
pub use ports::*;
pub use service::{PoolDependencies, TransactionPoolService, TX_RELAY_NODE_TYPES};
