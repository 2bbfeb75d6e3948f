//! # Genesis Block Builder
//!
//! Creates the genesis block and seeds initial wallet balances.

use shared_types::{Address, Amount, Block, BlockChain, WalletState};
use thiserror::Error;
use tracing::info;

/// Genesis creation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenesisError {
    /// Chain already holds blocks.
    #[error("Genesis block already exists (chain height {0})")]
    AlreadyExists(u64),

    /// Block storage refused the genesis block.
    #[error("Failed to store genesis block")]
    StorageFailed,

    /// Invalid genesis configuration.
    #[error("Invalid genesis configuration: {0}")]
    InvalidConfig(String),
}

/// One initial balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisAllocation {
    pub address: Address,
    pub balance: Amount,
}

/// Genesis block configuration.
#[derive(Debug, Clone)]
pub struct GenesisConfig {
    /// Block version of the genesis block.
    pub version: u32,
    /// Genesis timestamp (Unix seconds).
    pub timestamp: i64,
    pub difficulty: u64,
    pub allocations: Vec<GenesisAllocation>,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            version: 5,
            timestamp: 0,
            difficulty: 0,
            allocations: Vec::new(),
        }
    }
}

impl GenesisConfig {
    /// Add an initial balance.
    pub fn with_allocation(mut self, address: Address, balance: Amount) -> Self {
        self.allocations.push(GenesisAllocation { address, balance });
        self
    }
}

/// Builds and installs block 1.
pub struct GenesisBuilder {
    config: GenesisConfig,
}

impl GenesisBuilder {
    pub fn new(config: GenesisConfig) -> Self {
        Self { config }
    }

    /// Validate the configuration and produce the sealed genesis block.
    pub fn build(&self) -> Result<Block, GenesisError> {
        for allocation in &self.config.allocations {
            if !allocation.address.is_valid() {
                return Err(GenesisError::InvalidConfig(format!(
                    "malformed address {}",
                    allocation.address
                )));
            }
            if allocation.balance.is_negative() {
                return Err(GenesisError::InvalidConfig(format!(
                    "negative balance for {}",
                    allocation.address
                )));
            }
        }

        let mut block = Block {
            block_num: 1,
            version: self.config.version,
            difficulty: self.config.difficulty,
            timestamp: self.config.timestamp,
            ..Default::default()
        };
        block.seal();
        Ok(block)
    }

    /// Seed balances and append the genesis block to an empty chain.
    pub fn install(
        &self,
        chain: &dyn BlockChain,
        wallets: &dyn WalletState,
    ) -> Result<Block, GenesisError> {
        let height = chain.last_block_num();
        if height > 0 {
            return Err(GenesisError::AlreadyExists(height));
        }

        let block = self.build()?;
        for allocation in &self.config.allocations {
            wallets.set_wallet_balance(&allocation.address, allocation.balance.clone());
        }
        if !chain.append_block(block.clone()) {
            return Err(GenesisError::StorageFailed);
        }

        info!(
            checksum = %hex::encode(&block.block_checksum),
            allocations = self.config.allocations.len(),
            "Genesis block installed"
        );
        Ok(block)
    }
}
