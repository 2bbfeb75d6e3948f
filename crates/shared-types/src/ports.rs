//! # Collaborator Ports
//!
//! The consensus core depends on these traits only. Storage, wallet state,
//! presence gossip and the transport live behind them.
//!
//! | Port | Provides |
//! |------|----------|
//! | [`BlockChain`] | Chain height, stored blocks, block append |
//! | [`WalletState`] | Balances, keys, multisig settings, atomic brackets |
//! | [`TransactionStorage`] | Persisted applied transactions |
//! | [`PresenceDirectory`] | Presence lookups and keepalive updates |
//! | [`PeerNetwork`] | Direct sends and broadcasts |
//! | [`TimeSource`] | Millisecond clock |

use crate::address::Address;
use crate::amount::Amount;
use crate::block::{Block, BlockSignature};
use crate::presence::{NodeType, Presence};
use crate::protocol::{EndpointId, ProtocolMessageCode};
use crate::transaction::{Transaction, TxId};
use crate::wallet::{Wallet, WalletType};

/// Stored chain.
pub trait BlockChain: Send + Sync {
    /// Height of the last stored block (0 for an empty chain).
    fn last_block_num(&self) -> u64;

    fn last_block_version(&self) -> u32;

    /// Highest block number announced by peers.
    fn highest_network_block_num(&self) -> u64;

    fn is_synchronizing(&self) -> bool;

    fn get_block(&self, block_num: u64) -> Option<Block>;

    /// Stamps a block as PoW-solved. Returns false if the block is unknown.
    fn set_block_pow_field(&self, block_num: u64, pow_field: Vec<u8>) -> bool;

    /// Adds a live signature to a stored block. Returns false if the block
    /// is unknown, already frozen, or already signed by the signer.
    fn add_block_signature(&self, block_num: u64, signature: BlockSignature) -> bool;

    fn update_frozen_signatures(&self, block_num: u64, signatures: Vec<BlockSignature>) -> bool;

    /// Appends the next block. Returns false if it does not extend the tip.
    fn append_block(&self, block: Block) -> bool;
}

/// Wallet state with an atomic bracket per applied block.
pub trait WalletState: Send + Sync {
    /// Returns the wallet, or an empty normal wallet if unknown.
    fn get_wallet(&self, address: &Address) -> Wallet;

    fn set_wallet_balance(&self, address: &Address, balance: Amount);

    fn set_wallet_public_key(&self, address: &Address, public_key: Vec<u8>);

    fn set_wallet_multisig(
        &self,
        address: &Address,
        wallet_type: WalletType,
        allowed_signers: Vec<Address>,
        required_sigs: u8,
    );

    fn total_supply(&self) -> Amount;

    /// Opens a bracket; returns false if one is already open.
    fn begin_transaction(&self, block_num: u64) -> bool;

    fn commit_transaction(&self);

    /// Discards every change since `begin_transaction`.
    fn revert_transaction(&self);

    fn in_transaction(&self) -> bool;
}

/// Persisted transactions.
pub trait TransactionStorage: Send + Sync {
    fn insert_transaction(&self, tx: &Transaction) -> bool;

    /// `block_num == 0` searches every block.
    fn get_transaction(&self, txid: &TxId, block_num: u64) -> Option<Transaction>;
}

/// Presence lookups.
pub trait PresenceDirectory: Send + Sync {
    fn get_presence_by_address(&self, address: &Address) -> Option<Presence>;

    /// Records a keepalive; returns true if it advanced the device's `last_seen`.
    fn receive_keepalive(&self, address: &Address, device_id: &[u8], last_seen: i64) -> bool;
}

/// Outbound transport.
pub trait PeerNetwork: Send + Sync {
    fn send_data(&self, endpoint: &EndpointId, code: ProtocolMessageCode, payload: Vec<u8>) -> bool;

    /// Sends to every peer of the given roles except `skip`.
    fn broadcast(
        &self,
        node_types: &[NodeType],
        code: ProtocolMessageCode,
        payload: Vec<u8>,
        skip: Option<&EndpointId>,
    ) -> bool;
}

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// Time source, abstracted for deterministic tests.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }
}
