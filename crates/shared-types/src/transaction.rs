//! # Transactions
//!
//! A transaction moves value from one or more inputs of a single sender
//! (keyed by address nonce) to one or more output addresses. Its identity
//! is the `checksum` over a canonical IxiVarInt encoding; the id embeds the
//! bound block height and that checksum.
//!
//! ## Invariants
//!
//! - `sum(from_list) == amount + fee`
//! - `sum(to_list) == amount`
//! - `signature` is over `checksum`
//! - `status` is lifecycle only and never part of the identity

use crate::address::Address;
use crate::amount::Amount;
use crate::errors::CodecError;
use crate::varint::BinaryWriter;
use serde::{Deserialize, Serialize};
use shared_crypto::{sha512_sq_trunc32, Ed25519KeyPair};
use std::collections::BTreeMap;
use std::fmt;

/// Prefix of staking-reward transaction ids.
pub const STAKING_ID_PREFIX: &str = "stk-";

/// First transaction version that carries a separate `data_checksum`.
pub const DATA_CHECKSUM_VERSION: u32 = 4;

// =============================================================================
// IDENTITY
// =============================================================================

/// Transaction identifier: `"{block_height}-{hex(checksum)}"`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct TxId(pub String);

impl TxId {
    pub fn new(block_height: u64, checksum: &[u8]) -> Self {
        Self(format!("{}-{}", block_height, hex::encode(checksum)))
    }

    /// Id of a staking-reward transaction.
    pub fn staking(block_height: u64, checksum: &[u8]) -> Self {
        Self(format!(
            "{}{}-{}",
            STAKING_ID_PREFIX,
            block_height,
            hex::encode(checksum)
        ))
    }

    pub fn is_staking(&self) -> bool {
        self.0.starts_with(STAKING_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", self.0)
    }
}

impl From<&str> for TxId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Transaction kinds. Discriminants are part of the canonical encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TransactionType {
    Normal = 0,
    PoWSolution = 1,
    StakingReward = 2,
    Genesis = 3,
    MultisigTX = 4,
    ChangeMultisigWallet = 5,
    MultisigAddTxSignature = 6,
    RegName = 7,
}

impl TransactionType {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::Normal,
            1 => Self::PoWSolution,
            2 => Self::StakingReward,
            3 => Self::Genesis,
            4 => Self::MultisigTX,
            5 => Self::ChangeMultisigWallet,
            6 => Self::MultisigAddTxSignature,
            7 => Self::RegName,
            _ => return None,
        })
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Types that create currency instead of spending it.
    pub fn is_minted(self) -> bool {
        matches!(self, Self::Genesis | Self::StakingReward)
    }

    /// Types that may legitimately carry a zero amount.
    pub fn allows_zero_amount(self) -> bool {
        matches!(
            self,
            Self::ChangeMultisigWallet
                | Self::MultisigAddTxSignature
                | Self::PoWSolution
                | Self::StakingReward
        )
    }

    /// Types operating on a multisig wallet.
    pub fn is_multisig(self) -> bool {
        matches!(
            self,
            Self::MultisigTX | Self::ChangeMultisigWallet | Self::MultisigAddTxSignature
        )
    }
}

/// Pool lifecycle of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TxStatus {
    #[default]
    Unapplied,
    /// Passed validation while applying the given block.
    ReadyToApply(u64),
    /// Included in the given finalized block.
    Applied(u64),
}

impl TxStatus {
    pub fn applied_block(self) -> Option<u64> {
        match self {
            Self::Applied(block) => Some(block),
            _ => None,
        }
    }

    pub fn is_ready_for(self, block_num: u64) -> bool {
        self == Self::ReadyToApply(block_num)
    }
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// A multisig co-signer: public key (or address) plus address nonce.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MultisigSigner {
    pub pub_key: Vec<u8>,
    pub nonce: Vec<u8>,
}

impl MultisigSigner {
    pub fn new(pub_key: Vec<u8>, nonce: Vec<u8>) -> Self {
        Self { pub_key, nonce }
    }

    /// Address the signer signs for.
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.pub_key, &self.nonce)
    }
}

/// Multisig operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MultisigPayload {
    /// Originates a multisig spend.
    TxData { signer: MultisigSigner },
    /// Adds a co-signature to a pending multisig transaction.
    AddTxSignature {
        orig_txid: TxId,
        signer: MultisigSigner,
    },
    AddrAdd {
        signer: MultisigSigner,
        address: Address,
    },
    AddrDel {
        signer: MultisigSigner,
        address: Address,
    },
    ChSig {
        signer: MultisigSigner,
        required_sigs: u8,
    },
}

impl MultisigPayload {
    pub fn signer(&self) -> &MultisigSigner {
        match self {
            Self::TxData { signer }
            | Self::AddTxSignature { signer, .. }
            | Self::AddrAdd { signer, .. }
            | Self::AddrDel { signer, .. }
            | Self::ChSig { signer, .. } => signer,
        }
    }

    /// Whether this payload belongs with a transaction of `tx_type`.
    pub fn matches_type(&self, tx_type: TransactionType) -> bool {
        match self {
            Self::TxData { .. } => tx_type == TransactionType::MultisigTX,
            Self::AddTxSignature { .. } => tx_type == TransactionType::MultisigAddTxSignature,
            Self::AddrAdd { .. } | Self::AddrDel { .. } | Self::ChSig { .. } => {
                tx_type == TransactionType::ChangeMultisigWallet
            }
        }
    }

    fn encode_into(&self, writer: &mut BinaryWriter) {
        let write_signer = |writer: &mut BinaryWriter, signer: &MultisigSigner| {
            writer.write_bytes(&signer.pub_key);
            writer.write_bytes(&signer.nonce);
        };
        match self {
            Self::TxData { signer } => {
                writer.write_varint(0);
                write_signer(writer, signer);
            }
            Self::AddTxSignature { orig_txid, signer } => {
                writer.write_varint(1);
                writer.write_str(orig_txid.as_str());
                write_signer(writer, signer);
            }
            Self::AddrAdd { signer, address } => {
                writer.write_varint(2);
                write_signer(writer, signer);
                writer.write_bytes(address.as_bytes());
            }
            Self::AddrDel { signer, address } => {
                writer.write_varint(3);
                write_signer(writer, signer);
                writer.write_bytes(address.as_bytes());
            }
            Self::ChSig {
                signer,
                required_sigs,
            } => {
                writer.write_varint(4);
                write_signer(writer, signer);
                writer.write_u8(*required_sigs);
            }
        }
    }
}

/// Typed transaction payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TransactionPayload {
    #[default]
    None,
    Multisig(MultisigPayload),
    PowSolution {
        block_num: u64,
        nonce: Vec<u8>,
    },
    Staking {
        target_block: u64,
    },
    /// Name registrations and opaque data.
    Raw(Vec<u8>),
}

impl TransactionPayload {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Canonical payload bytes; empty for `None`.
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        match self {
            Self::None => {}
            Self::Multisig(payload) => {
                writer.write_varint(1);
                payload.encode_into(&mut writer);
            }
            Self::PowSolution { block_num, nonce } => {
                writer.write_varint(2);
                writer.write_varint(*block_num);
                writer.write_bytes(nonce);
            }
            Self::Staking { target_block } => {
                writer.write_varint(3);
                writer.write_varint(*target_block);
            }
            Self::Raw(bytes) => {
                writer.write_varint(4);
                writer.write_bytes(bytes);
            }
        }
        writer.into_bytes()
    }
}

// =============================================================================
// TRANSACTION
// =============================================================================

/// A ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxId,
    pub tx_type: TransactionType,
    pub version: u32,
    /// Input address nonce → amount.
    pub from_list: BTreeMap<Vec<u8>, Amount>,
    /// Output address → amount.
    pub to_list: BTreeMap<Address, Amount>,
    pub amount: Amount,
    pub fee: Amount,
    /// Block height the transaction is bound to.
    pub block_height: u64,
    /// Sender public key, or the sender address once the key is bound.
    pub pub_key: Vec<u8>,
    pub data: TransactionPayload,
    pub timestamp: i64,
    pub checksum: Vec<u8>,
    pub data_checksum: Option<Vec<u8>>,
    pub signature: Vec<u8>,
    #[serde(skip)]
    pub status: TxStatus,
    #[serde(skip)]
    pub pow_verified: bool,
    #[serde(skip)]
    pub from_local_storage: bool,
}

impl Transaction {
    /// Canonical encoding of every identity field except the checksum and signature.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::with_capacity(256);
        writer.write_varint(u64::from(self.version));
        writer.write_varint(u64::from(self.tx_type.as_u8()));
        writer.write_bytes(&self.amount.to_canonical_bytes());
        writer.write_bytes(&self.fee.to_canonical_bytes());

        writer.write_varint(self.to_list.len() as u64);
        for (address, amount) in &self.to_list {
            writer.write_bytes(address.as_bytes());
            writer.write_bytes(&amount.to_canonical_bytes());
        }

        writer.write_varint(self.from_list.len() as u64);
        for (nonce, amount) in &self.from_list {
            writer.write_bytes(nonce);
            writer.write_bytes(&amount.to_canonical_bytes());
        }

        match (&self.data_checksum, self.version >= DATA_CHECKSUM_VERSION) {
            (Some(data_checksum), true) => {
                writer.write_bytes(data_checksum);
            }
            _ => {
                writer.write_bytes(&self.data.encode());
            }
        }

        writer.write_varint(self.block_height);
        writer.write_bytes(&self.pub_key);
        writer.write_i64(self.timestamp);
        writer.into_bytes()
    }

    pub fn calculate_checksum(&self) -> Vec<u8> {
        sha512_sq_trunc32(&self.canonical_bytes()).to_vec()
    }

    /// Expected `data_checksum` for this version and payload.
    pub fn calculate_data_checksum(&self) -> Option<Vec<u8>> {
        if self.version < DATA_CHECKSUM_VERSION || self.data.is_none() {
            return None;
        }
        Some(sha512_sq_trunc32(&self.data.encode()).to_vec())
    }

    /// Id derived from `block_height` and `checksum`.
    pub fn calculate_id(&self) -> TxId {
        if self.tx_type == TransactionType::StakingReward {
            TxId::staking(self.block_height, &self.checksum)
        } else {
            TxId::new(self.block_height, &self.checksum)
        }
    }

    /// Checks `checksum`, `id` and, where applicable, `data_checksum`.
    pub fn verify_checksums(&self) -> bool {
        if self.version >= DATA_CHECKSUM_VERSION
            && !self.data.is_none()
            && self.data_checksum != self.calculate_data_checksum()
        {
            return false;
        }
        self.checksum == self.calculate_checksum() && self.id == self.calculate_id()
    }

    /// Recomputes `data_checksum`, `checksum` and `id`.
    pub fn finalize(&mut self) {
        self.data_checksum = self.calculate_data_checksum();
        self.checksum = self.calculate_checksum();
        self.id = self.calculate_id();
    }

    /// Signs `checksum` with `keypair`.
    pub fn sign_with(&mut self, keypair: &Ed25519KeyPair) {
        self.signature = keypair.sign(&self.checksum).as_bytes().to_vec();
    }

    /// Size used for fee calculation.
    pub fn encoded_len(&self) -> usize {
        self.canonical_bytes().len() + self.checksum.len() + self.signature.len()
    }

    pub fn from_total(&self) -> Amount {
        self.from_list.values().sum()
    }

    pub fn to_total(&self) -> Amount {
        self.to_list.values().sum()
    }

    /// Input addresses derived from `pub_key`.
    pub fn input_addresses(&self) -> Vec<(Address, Amount)> {
        self.from_list
            .iter()
            .map(|(nonce, amount)| {
                (
                    Address::from_public_key(&self.pub_key, nonce),
                    amount.clone(),
                )
            })
            .collect()
    }

    /// Address of the first input.
    pub fn primary_source_address(&self) -> Option<Address> {
        self.from_list
            .keys()
            .next()
            .map(|nonce| Address::from_public_key(&self.pub_key, nonce))
    }

    pub fn multisig_payload(&self) -> Option<&MultisigPayload> {
        match &self.data {
            TransactionPayload::Multisig(payload) => Some(payload),
            _ => None,
        }
    }

    /// `(target_block, nonce)` of a PoW solution.
    pub fn pow_solution(&self) -> Option<(u64, &[u8])> {
        match &self.data {
            TransactionPayload::PowSolution { block_num, nonce } => Some((*block_num, nonce)),
            _ => None,
        }
    }

    pub fn applied_block(&self) -> Option<u64> {
        self.status.applied_block()
    }

    /// Wire encoding (`bincode`).
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Assembles a finalized (unsigned) transaction.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    tx_type: TransactionType,
    version: u32,
    from_list: BTreeMap<Vec<u8>, Amount>,
    to_list: BTreeMap<Address, Amount>,
    amount: Option<Amount>,
    fee: Amount,
    block_height: u64,
    pub_key: Vec<u8>,
    data: TransactionPayload,
    timestamp: i64,
}

impl TransactionBuilder {
    pub fn new(tx_type: TransactionType, version: u32) -> Self {
        Self {
            tx_type,
            version,
            from_list: BTreeMap::new(),
            to_list: BTreeMap::new(),
            amount: None,
            fee: Amount::zero(),
            block_height: 0,
            pub_key: Vec::new(),
            data: TransactionPayload::None,
            timestamp: 0,
        }
    }

    pub fn to(mut self, address: Address, amount: Amount) -> Self {
        self.to_list.insert(address, amount);
        self
    }

    pub fn from(mut self, nonce: Vec<u8>, amount: Amount) -> Self {
        self.from_list.insert(nonce, amount);
        self
    }

    /// Overrides the default `amount = sum(to_list)`.
    pub fn amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn fee(mut self, fee: Amount) -> Self {
        self.fee = fee;
        self
    }

    pub fn block_height(mut self, block_height: u64) -> Self {
        self.block_height = block_height;
        self
    }

    pub fn pub_key(mut self, pub_key: Vec<u8>) -> Self {
        self.pub_key = pub_key;
        self
    }

    pub fn payload(mut self, data: TransactionPayload) -> Self {
        self.data = data;
        self
    }

    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Builds the transaction. An empty input list becomes `{[0]: amount + fee}`.
    pub fn build(self) -> Transaction {
        let amount = self
            .amount
            .unwrap_or_else(|| self.to_list.values().sum());
        let mut from_list = self.from_list;
        if from_list.is_empty() {
            from_list.insert(vec![0], &amount + &self.fee);
        }
        let mut tx = Transaction {
            id: TxId::default(),
            tx_type: self.tx_type,
            version: self.version,
            from_list,
            to_list: self.to_list,
            amount,
            fee: self.fee,
            block_height: self.block_height,
            pub_key: self.pub_key,
            data: self.data,
            timestamp: self.timestamp,
            checksum: Vec::new(),
            data_checksum: None,
            signature: Vec::new(),
            status: TxStatus::Unapplied,
            pow_verified: false,
            from_local_storage: false,
        };
        tx.finalize();
        tx
    }
}
