//! # Adapters Layer
//!
//! Port implementations backed by the stored chain and the transaction pool.

use crate::ports::{SignatureLookup, TransactionLookup};
use ixi_02_transaction_pool::TransactionPoolApi;
use shared_types::{Address, BlockChain, TxId};
use std::sync::Arc;

/// Signature lookup over stored blocks only.
pub struct ChainSignatureLookup {
    chain: Arc<dyn BlockChain>,
}

impl ChainSignatureLookup {
    pub fn new(chain: Arc<dyn BlockChain>) -> Self {
        Self { chain }
    }
}

impl SignatureLookup for ChainSignatureLookup {
    fn block_checksum(&self, block_num: u64) -> Option<Vec<u8>> {
        self.chain.get_block(block_num).map(|b| b.block_checksum)
    }

    fn has_signature(&self, block_num: u64, block_hash: &[u8], signer: &Address) -> bool {
        self.chain
            .get_block(block_num)
            .is_some_and(|b| b.block_checksum == block_hash && b.has_signer(signer))
    }
}

/// Transaction lookup over the pool's unapplied and applied maps.
pub struct PoolTransactionLookup {
    pool: Arc<dyn TransactionPoolApi>,
}

impl PoolTransactionLookup {
    pub fn new(pool: Arc<dyn TransactionPoolApi>) -> Self {
        Self { pool }
    }
}

impl TransactionLookup for PoolTransactionLookup {
    fn has_transaction(&self, txid: &TxId) -> bool {
        self.pool.has_transaction(txid)
    }
}
