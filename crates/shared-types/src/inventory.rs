//! # Inventory Items
//!
//! Announcements of content a peer holds. The content key returned by
//! [`InventoryItem::hash`] is what the inventory cache deduplicates on.
//!
//! ## Wire Format
//!
//! ```text
//! varint(type) ‖ varbytes(hash) ‖ variant fields
//!
//! Block           varint(block_num)
//! BlockSignature  varint(block_num) ‖ varbytes(block_hash) ‖ varbytes(signer)
//! Transaction     varbytes(txid)
//! KeepAlive       varbytes(address) ‖ varbytes(device_id) ‖ i64(last_seen)
//! ```

use crate::address::Address;
use crate::errors::CodecError;
use crate::transaction::TxId;
use crate::varint::{BinaryReader, BinaryWriter};
use serde::{Deserialize, Serialize};
use shared_crypto::sha512_sq_trunc32;

/// Inventory item kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InventoryItemType {
    KeepAlive = 0,
    Transaction = 1,
    BlockSignature = 2,
    Block = 3,
}

impl InventoryItemType {
    pub const ALL: [InventoryItemType; 4] = [
        Self::KeepAlive,
        Self::Transaction,
        Self::BlockSignature,
        Self::Block,
    ];

    pub fn from_u64(value: u64) -> Result<Self, CodecError> {
        match value {
            0 => Ok(Self::KeepAlive),
            1 => Ok(Self::Transaction),
            2 => Ok(Self::BlockSignature),
            3 => Ok(Self::Block),
            tag => Err(CodecError::UnknownTag {
                kind: "inventory item",
                tag,
            }),
        }
    }
}

/// An announced inventory item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InventoryItem {
    Block {
        hash: Vec<u8>,
        block_num: u64,
    },
    BlockSignature {
        block_num: u64,
        block_hash: Vec<u8>,
        signer: Address,
    },
    Transaction {
        txid: TxId,
    },
    KeepAlive {
        address: Address,
        device_id: Vec<u8>,
        last_seen: i64,
    },
}

impl InventoryItem {
    pub fn item_type(&self) -> InventoryItemType {
        match self {
            Self::Block { .. } => InventoryItemType::Block,
            Self::BlockSignature { .. } => InventoryItemType::BlockSignature,
            Self::Transaction { .. } => InventoryItemType::Transaction,
            Self::KeepAlive { .. } => InventoryItemType::KeepAlive,
        }
    }

    /// Content key used for deduplication.
    pub fn hash(&self) -> Vec<u8> {
        match self {
            Self::Block { hash, .. } => hash.clone(),
            Self::BlockSignature {
                block_hash, signer, ..
            } => {
                let mut input = block_hash.clone();
                input.extend_from_slice(signer.as_bytes());
                sha512_sq_trunc32(&input).to_vec()
            }
            Self::Transaction { txid } => txid.as_bytes().to_vec(),
            Self::KeepAlive {
                address,
                device_id,
                last_seen,
            } => {
                let mut writer = BinaryWriter::new();
                writer
                    .write_bytes(address.as_bytes())
                    .write_bytes(device_id)
                    .write_i64(*last_seen);
                sha512_sq_trunc32(writer.as_bytes()).to_vec()
            }
        }
    }

    pub fn encode_into(&self, writer: &mut BinaryWriter) {
        writer
            .write_varint(self.item_type() as u64)
            .write_bytes(&self.hash());
        match self {
            Self::Block { block_num, .. } => {
                writer.write_varint(*block_num);
            }
            Self::BlockSignature {
                block_num,
                block_hash,
                signer,
            } => {
                writer
                    .write_varint(*block_num)
                    .write_bytes(block_hash)
                    .write_bytes(signer.as_bytes());
            }
            Self::Transaction { txid } => {
                writer.write_str(txid.as_str());
            }
            Self::KeepAlive {
                address,
                device_id,
                last_seen,
            } => {
                writer
                    .write_bytes(address.as_bytes())
                    .write_bytes(device_id)
                    .write_i64(*last_seen);
            }
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        self.encode_into(&mut writer);
        writer.into_bytes()
    }

    /// Decodes one item and checks its declared hash.
    pub fn decode_from(reader: &mut BinaryReader<'_>) -> Result<Self, CodecError> {
        let item_type = InventoryItemType::from_u64(reader.read_varint()?)?;
        let declared_hash = reader.read_bytes()?;
        let item = match item_type {
            InventoryItemType::Block => Self::Block {
                hash: declared_hash.clone(),
                block_num: reader.read_varint()?,
            },
            InventoryItemType::BlockSignature => Self::BlockSignature {
                block_num: reader.read_varint()?,
                block_hash: reader.read_bytes()?,
                signer: Address::from_bytes_unchecked(reader.read_bytes()?),
            },
            InventoryItemType::Transaction => Self::Transaction {
                txid: TxId(reader.read_string()?),
            },
            InventoryItemType::KeepAlive => Self::KeepAlive {
                address: Address::from_bytes_unchecked(reader.read_bytes()?),
                device_id: reader.read_bytes()?,
                last_seen: reader.read_i64()?,
            },
        };
        if item.hash() != declared_hash {
            return Err(CodecError::HashMismatch);
        }
        Ok(item)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        Self::decode_from(&mut BinaryReader::new(bytes))
    }
}
