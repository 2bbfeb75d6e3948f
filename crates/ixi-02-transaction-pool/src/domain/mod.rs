//! # Domain Layer - Transaction Pool
//!
//! - `entities`: configuration, apply mode, reports
//! - `pool`: the unapplied/applied maps
//! - `pending`: re-broadcast tracker for local transactions
//! - `rules`: version bands, fees, reward schedules
//! - `staking`: staking-reward distribution
//! - `errors`: `TxRejection`, `BlockApplyError`

pub mod entities;
pub mod errors;
pub mod pending;
pub mod pool;
pub mod rules;
pub mod staking;

pub use entities::*;
pub use errors::*;
pub use pending::{PendingAction, PendingEntry, PendingTracker};
pub use pool::{AppliedEntry, PoolState};
pub use rules::*;
pub use staking::distribute_staking_reward;
