//! # Signature Freeze Subsystem
//!
//! **Subsystem ID:** 5
//!
//! ## Purpose
//!
//! Collects signatures for the next block, commits it through the
//! transaction pool once enough signers agree, and freezes the signature
//! set of the block five behind it.
//!
//! ## Rules
//!
//! | Rule | Enforcement |
//! |------|-------------|
//! | Signer must have a presence and a valid signature | `service.rs` - `check_signer()` |
//! | Candidate needs `max(min, ceil(75% of sigs(N-1)))` signatures | `domain/mod.rs` - `required_signatures()` |
//! | Block `N > 5` commits to the frozen set of `N - 5` | `service.rs` - `check_freeze_checksum()` |
//! | Frozen sets only change when the freezing block agrees | `service.rs` - `handle_sig_freezed_block()` |
//! | Candidate access is bounded by `lock_timeout_ms` | `service.rs` - `lock_candidate()` |
//!
//! ## Data Flow
//!
//! ```text
//! [Protocol (6)] ─BlockData / BlockSignature / SigFreeze─→ [Coordinator (5)]
//!                                                              │
//!                      apply_transactions_from_block(Commit) ──┼──→ [Pool (2)]
//!                      append_block / update_frozen_signatures ┴──→ [Chain]
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

pub use domain::*;
pub use error::{FreezeError, FreezeResult};
pub use ports::SignatureFreezeApi;
pub use service::{FreezeDependencies, SignatureFreezeCoordinator, SIGNATURE_RELAY_NODE_TYPES};
