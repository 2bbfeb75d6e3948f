//! # Message Payloads
//!
//! IxiVarInt-framed bodies of the request, signature and keepalive
//! messages. Blocks and transactions themselves travel as `bincode`.
//!
//! | Code | Payload |
//! |------|---------|
//! | `GetTransaction` | [`TransactionRequest`] |
//! | `GetTransactions` | [`TransactionsRequest`] |
//! | `TransactionsChunk` | [`TransactionsChunk`] |
//! | `GetBlock` | [`BlockRequest`] |
//! | `BlockSignature` | [`SignatureMessage`] |
//! | `BlockSignatures`, `SignaturesChunk` | [`SignaturesChunk`] |
//! | `GetBlockSignatures` | [`SignaturesRequest`] |
//! | `GetKeepAlives` | [`KeepAlivesRequest`] |
//! | `KeepAlivesChunk` | [`KeepAlivesChunk`] |
//! | `GetPresence` | [`PresenceRequest`] |
//!
//! Addresses are decoded unchecked; the consumer validates them against
//! presence or wallet state.

use crate::address::Address;
use crate::block::BlockSignature;
use crate::errors::CodecError;
use crate::transaction::{Transaction, TxId};
use crate::varint::{BinaryReader, BinaryWriter};

/// Reads a list count, rejecting counts the remaining input cannot hold.
fn read_count(reader: &mut BinaryReader<'_>) -> Result<usize, CodecError> {
    let count = reader.read_varint()?;
    let max = reader.remaining() as u64;
    if count > max {
        return Err(CodecError::LengthTooLarge { len: count, max });
    }
    Ok(count as usize)
}

fn read_address(reader: &mut BinaryReader<'_>) -> Result<Address, CodecError> {
    Ok(Address::from_bytes_unchecked(reader.read_bytes()?))
}

fn write_signature(writer: &mut BinaryWriter, signature: &BlockSignature) {
    writer.write_bytes(signature.signer_address.as_bytes());
    match &signature.signer_pub_key {
        Some(key) => {
            writer.write_bool(true).write_bytes(key);
        }
        None => {
            writer.write_bool(false);
        }
    }
    writer.write_bytes(&signature.signature);
}

fn read_signature(reader: &mut BinaryReader<'_>) -> Result<BlockSignature, CodecError> {
    let signer_address = read_address(reader)?;
    let signer_pub_key = if reader.read_bool()? {
        Some(reader.read_bytes()?)
    } else {
        None
    };
    Ok(BlockSignature {
        signer_address,
        signer_pub_key,
        signature: reader.read_bytes()?,
    })
}

// =============================================================================
// TRANSACTIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub txid: TxId,
}

impl TransactionRequest {
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        writer.write_str(self.txid.as_str());
        writer.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut reader = BinaryReader::new(bytes);
        Ok(Self {
            txid: TxId(reader.read_string()?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransactionsRequest {
    pub txids: Vec<TxId>,
}

impl TransactionsRequest {
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        writer.write_varint(self.txids.len() as u64);
        for txid in &self.txids {
            writer.write_str(txid.as_str());
        }
        writer.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut reader = BinaryReader::new(bytes);
        let count = read_count(&mut reader)?;
        let txids = (0..count)
            .map(|_| reader.read_string().map(TxId))
            .collect::<Result<_, _>>()?;
        Ok(Self { txids })
    }
}

/// Transactions answering a `GetTransactions` request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransactionsChunk {
    pub transactions: Vec<Transaction>,
}

impl TransactionsChunk {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut writer = BinaryWriter::new();
        writer.write_varint(self.transactions.len() as u64);
        for tx in &self.transactions {
            writer.write_bytes(&tx.to_bytes()?);
        }
        Ok(writer.into_bytes())
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut reader = BinaryReader::new(bytes);
        let count = read_count(&mut reader)?;
        let transactions = (0..count)
            .map(|_| Transaction::from_bytes(&reader.read_bytes()?))
            .collect::<Result<_, _>>()?;
        Ok(Self { transactions })
    }
}

// =============================================================================
// BLOCKS AND SIGNATURES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRequest {
    pub block_num: u64,
    /// Also send the block's transactions.
    pub include_transactions: bool,
}

impl BlockRequest {
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::with_capacity(10);
        writer
            .write_varint(self.block_num)
            .write_bool(self.include_transactions);
        writer.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut reader = BinaryReader::new(bytes);
        Ok(Self {
            block_num: reader.read_varint()?,
            include_transactions: reader.read_bool()?,
        })
    }
}

/// A single signature for a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureMessage {
    pub block_num: u64,
    pub block_hash: Vec<u8>,
    pub signature: BlockSignature,
}

impl SignatureMessage {
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        writer
            .write_varint(self.block_num)
            .write_bytes(&self.block_hash);
        write_signature(&mut writer, &self.signature);
        writer.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut reader = BinaryReader::new(bytes);
        Ok(Self {
            block_num: reader.read_varint()?,
            block_hash: reader.read_bytes()?,
            signature: read_signature(&mut reader)?,
        })
    }
}

/// A batch of signatures for one block.
///
/// `frozen` marks a sigfreeze announcement: the list is the complete frozen
/// set rather than an incremental batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignaturesChunk {
    pub block_num: u64,
    pub block_hash: Vec<u8>,
    pub frozen: bool,
    pub signatures: Vec<BlockSignature>,
}

impl SignaturesChunk {
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        writer
            .write_varint(self.block_num)
            .write_bytes(&self.block_hash)
            .write_bool(self.frozen)
            .write_varint(self.signatures.len() as u64);
        for signature in &self.signatures {
            write_signature(&mut writer, signature);
        }
        writer.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut reader = BinaryReader::new(bytes);
        let block_num = reader.read_varint()?;
        let block_hash = reader.read_bytes()?;
        let frozen = reader.read_bool()?;
        let count = read_count(&mut reader)?;
        let signatures = (0..count)
            .map(|_| read_signature(&mut reader))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            block_num,
            block_hash,
            frozen,
            signatures,
        })
    }
}

/// Requests signatures of a block. An empty signer list asks for all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignaturesRequest {
    pub block_num: u64,
    pub block_hash: Vec<u8>,
    pub signers: Vec<Address>,
}

impl SignaturesRequest {
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        writer
            .write_varint(self.block_num)
            .write_bytes(&self.block_hash)
            .write_varint(self.signers.len() as u64);
        for signer in &self.signers {
            writer.write_bytes(signer.as_bytes());
        }
        writer.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut reader = BinaryReader::new(bytes);
        let block_num = reader.read_varint()?;
        let block_hash = reader.read_bytes()?;
        let count = read_count(&mut reader)?;
        let signers = (0..count)
            .map(|_| read_address(&mut reader))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            block_num,
            block_hash,
            signers,
        })
    }
}

// =============================================================================
// PRESENCE
// =============================================================================

/// A device keepalive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepAliveRecord {
    pub address: Address,
    pub device_id: Vec<u8>,
    pub last_seen: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeepAlivesRequest {
    /// `(wallet, device_id)` pairs.
    pub entries: Vec<(Address, Vec<u8>)>,
}

impl KeepAlivesRequest {
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        writer.write_varint(self.entries.len() as u64);
        for (address, device_id) in &self.entries {
            writer.write_bytes(address.as_bytes()).write_bytes(device_id);
        }
        writer.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut reader = BinaryReader::new(bytes);
        let count = read_count(&mut reader)?;
        let entries = (0..count)
            .map(|_| Ok((read_address(&mut reader)?, reader.read_bytes()?)))
            .collect::<Result<_, CodecError>>()?;
        Ok(Self { entries })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeepAlivesChunk {
    pub records: Vec<KeepAliveRecord>,
}

impl KeepAlivesChunk {
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        writer.write_varint(self.records.len() as u64);
        for record in &self.records {
            writer
                .write_bytes(record.address.as_bytes())
                .write_bytes(&record.device_id)
                .write_i64(record.last_seen);
        }
        writer.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut reader = BinaryReader::new(bytes);
        let count = read_count(&mut reader)?;
        let records = (0..count)
            .map(|_| {
                Ok(KeepAliveRecord {
                    address: read_address(&mut reader)?,
                    device_id: reader.read_bytes()?,
                    last_seen: reader.read_i64()?,
                })
            })
            .collect::<Result<_, CodecError>>()?;
        Ok(Self { records })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceRequest {
    pub address: Address,
}

impl PresenceRequest {
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        writer.write_bytes(self.address.as_bytes());
        writer.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut reader = BinaryReader::new(bytes);
        Ok(Self {
            address: read_address(&mut reader)?,
        })
    }
}
