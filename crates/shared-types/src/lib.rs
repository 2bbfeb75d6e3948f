//! # Shared Types Crate
//!
//! Ledger entities, the IxiVarInt codec and the collaborator ports shared
//! by every subsystem of the node.
//!
//! ## Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | `amount` | Exact 8-decimal [`Amount`] |
//! | `address` | Checksummed 48-byte [`Address`] with nonce derivation |
//! | `transaction` | [`Transaction`], [`TxId`], typed payloads, builder |
//! | `block` | [`Block`], [`BlockSignature`] |
//! | `wallet` | [`Wallet`] |
//! | `inventory` | [`InventoryItem`] announcements |
//! | `presence` | [`Presence`] and [`NodeType`] |
//! | `protocol` | [`ProtocolMessageCode`], [`EndpointId`] |
//! | `messages` | Request and signature message payloads |
//! | `varint` | IxiVarInt reader/writer |
//! | `ports` | Collaborator traits |
//! | `in_memory` | In-memory port adapters |

pub mod address;
pub mod amount;
pub mod block;
pub mod errors;
pub mod in_memory;
pub mod inventory;
pub mod messages;
pub mod ports;
pub mod presence;
pub mod protocol;
pub mod transaction;
pub mod varint;
pub mod wallet;

pub use address::{Address, ADDRESS_LEN};
pub use amount::Amount;
pub use block::{Block, BlockSignature, SIGNATURE_FREEZE_DEPTH, STAKING_TARGET_DEPTH};
pub use errors::*;
pub use inventory::{InventoryItem, InventoryItemType};
pub use ports::{
    BlockChain, PeerNetwork, PresenceDirectory, SystemTimeSource, TimeSource, Timestamp,
    TransactionStorage, WalletState,
};
pub use presence::{NodeType, Presence, PresenceAddress};
pub use protocol::{EndpointId, ProtocolMessageCode};
pub use transaction::{
    MultisigPayload, MultisigSigner, Transaction, TransactionBuilder, TransactionPayload,
    TransactionType, TxId, TxStatus,
};
pub use varint::{encode_varint, varint_len, BinaryReader, BinaryWriter};
pub use wallet::{Wallet, WalletType};
