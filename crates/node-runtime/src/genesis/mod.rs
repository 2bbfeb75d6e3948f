//! # Genesis Module
//!
//! Chain initialization for a node that starts without stored blocks.
//!
//! Block 1 is the genesis block:
//!
//! - No transactions, no signatures, no freeze checksum
//! - `last_block_checksum` empty
//! - Initial balances written straight into wallet state (no bracket)

pub mod builder;

pub use builder::{GenesisAllocation, GenesisBuilder, GenesisConfig, GenesisError};
