//! Cross-subsystem scenarios.
//!
//! Each module drives one or two [`crate::harness::TestNode`]s through
//! protocol messages only and asserts on wallets, chain and pool state.

pub mod multisig;
pub mod rewards;
pub mod sync;
pub mod transfers;
