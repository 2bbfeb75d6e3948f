//! # Adapters Layer
//!
//! Exposes the coordinator to the inventory subsystem, so signature
//! announcements for the candidate block are judged against it rather
//! than the stored chain.

use crate::service::SignatureFreezeCoordinator;
use ixi_04_inventory::SignatureLookup;
use shared_types::Address;

impl SignatureLookup for SignatureFreezeCoordinator {
    fn block_checksum(&self, block_num: u64) -> Option<Vec<u8>> {
        self.local_block_checksum(block_num)
    }

    fn has_signature(&self, block_num: u64, block_hash: &[u8], signer: &Address) -> bool {
        self.has_local_signature(block_num, block_hash, signer)
    }
}
