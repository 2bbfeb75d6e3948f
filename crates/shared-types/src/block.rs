//! # Blocks
//!
//! A block references its transactions by id and accumulates signatures
//! from signers. Five blocks later the signature set is frozen: block
//! `N` carries `signature_freeze_checksum`, the checksum of the frozen
//! signatures of block `N - 5`.

use crate::address::Address;
use crate::errors::CodecError;
use crate::transaction::TxId;
use crate::varint::BinaryWriter;
use serde::{Deserialize, Serialize};
use shared_crypto::sha512_sq_trunc32;

/// Distance between a block and the block whose signatures it freezes.
pub const SIGNATURE_FREEZE_DEPTH: u64 = 5;

/// Distance between a block and the block its staking rewards target.
pub const STAKING_TARGET_DEPTH: u64 = 6;

/// A signer's signature over a block checksum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockSignature {
    pub signer_address: Address,
    /// Present when the signer's key is not yet known to the network.
    pub signer_pub_key: Option<Vec<u8>>,
    pub signature: Vec<u8>,
}

/// A ledger block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Block {
    pub block_num: u64,
    pub version: u32,
    pub block_checksum: Vec<u8>,
    pub last_block_checksum: Vec<u8>,
    /// Transaction ids in application order.
    pub transactions: Vec<TxId>,
    pub signatures: Vec<BlockSignature>,
    /// Signature set frozen by block `block_num + 5`.
    pub frozen_signatures: Option<Vec<BlockSignature>>,
    pub signature_freeze_checksum: Option<Vec<u8>>,
    /// Set once a PoW solution for this block was rewarded.
    pub pow_field: Option<Vec<u8>>,
    pub difficulty: u64,
    pub timestamp: i64,
}

impl Block {
    /// Checksum over the block header fields and transaction ids.
    pub fn calculate_checksum(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::with_capacity(128 + self.transactions.len() * 72);
        writer
            .write_varint(self.block_num)
            .write_varint(u64::from(self.version))
            .write_bytes(&self.last_block_checksum)
            .write_varint(self.transactions.len() as u64);
        for txid in &self.transactions {
            writer.write_str(txid.as_str());
        }
        writer
            .write_bytes(self.signature_freeze_checksum.as_deref().unwrap_or(&[]))
            .write_varint(self.difficulty)
            .write_i64(self.timestamp);
        sha512_sq_trunc32(writer.as_bytes()).to_vec()
    }

    /// Sets `block_checksum` from the current contents.
    pub fn seal(&mut self) {
        self.block_checksum = self.calculate_checksum();
    }

    /// Frozen signatures if present, otherwise the live set.
    pub fn effective_signatures(&self) -> &[BlockSignature] {
        self.frozen_signatures
            .as_deref()
            .unwrap_or(self.signatures.as_slice())
    }

    /// Checksum of the effective signature set, order independent.
    pub fn calculate_signature_checksum(&self) -> Vec<u8> {
        let mut sorted: Vec<&BlockSignature> = self.effective_signatures().iter().collect();
        sorted.sort_by(|a, b| a.signer_address.cmp(&b.signer_address));

        let mut writer = BinaryWriter::with_capacity(sorted.len() * 128);
        writer
            .write_varint(self.block_num)
            .write_bytes(&self.block_checksum)
            .write_varint(sorted.len() as u64);
        for sig in sorted {
            writer
                .write_bytes(sig.signer_address.as_bytes())
                .write_bytes(&sig.signature);
        }
        sha512_sq_trunc32(writer.as_bytes()).to_vec()
    }

    /// Signer addresses of the effective signature set.
    pub fn get_signatures_wallet_addresses(&self) -> Vec<Address> {
        self.effective_signatures()
            .iter()
            .map(|sig| sig.signer_address.clone())
            .collect()
    }

    pub fn has_signer(&self, address: &Address) -> bool {
        self.signatures
            .iter()
            .any(|sig| &sig.signer_address == address)
    }

    /// Adds a live signature; returns false for a repeated signer.
    pub fn add_signature(&mut self, signature: BlockSignature) -> bool {
        if self.has_signer(&signature.signer_address) {
            return false;
        }
        self.signatures.push(signature);
        true
    }

    /// Freezes the current live signature set.
    pub fn freeze_signatures(&mut self) {
        self.frozen_signatures = Some(self.signatures.clone());
    }

    pub fn staking_transaction_ids(&self) -> Vec<TxId> {
        self.transactions
            .iter()
            .filter(|id| id.is_staking())
            .cloned()
            .collect()
    }

    /// Wire encoding (`bincode`).
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Number of the block whose signatures this block freezes.
    pub fn freeze_target(&self) -> Option<u64> {
        self.block_num
            .checked_sub(SIGNATURE_FREEZE_DEPTH)
            .filter(|n| *n > 0)
    }
}
