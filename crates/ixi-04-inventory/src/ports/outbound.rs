//! Outbound (driven) ports of the inventory subsystem.
//!
//! Chain, presence, network and clock ports come from `shared_types::ports`.

use shared_types::{Address, TxId};

/// Local view of block signatures.
///
/// The signature-freeze coordinator implements this so the pending
/// candidate block is consulted before the stored chain.
pub trait SignatureLookup: Send + Sync {
    /// Checksum of the local block `block_num`, candidate or stored.
    fn block_checksum(&self, block_num: u64) -> Option<Vec<u8>>;

    /// True if the local block with `block_hash` already carries a
    /// signature from `signer`.
    fn has_signature(&self, block_num: u64, block_hash: &[u8], signer: &Address) -> bool;
}

/// Transactions already held by the node.
pub trait TransactionLookup: Send + Sync {
    fn has_transaction(&self, txid: &TxId) -> bool;
}
