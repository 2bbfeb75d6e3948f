//! # In-Memory Collaborators
//!
//! `parking_lot`-guarded implementations of every collaborator port. The
//! node runtime wires these by default and the test suites drive them
//! directly.

use crate::address::Address;
use crate::amount::Amount;
use crate::block::{Block, BlockSignature};
use crate::ports::{
    BlockChain, PeerNetwork, PresenceDirectory, TimeSource, Timestamp, TransactionStorage,
    WalletState,
};
use crate::presence::{NodeType, Presence};
use crate::protocol::{EndpointId, ProtocolMessageCode};
use crate::transaction::{Transaction, TxId};
use crate::wallet::{Wallet, WalletType};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, warn};

// =============================================================================
// BLOCK CHAIN
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemoryBlockChain {
    blocks: RwLock<BTreeMap<u64, Block>>,
    highest_network: AtomicU64,
    synchronizing: AtomicBool,
}

impl InMemoryBlockChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_highest_network_block_num(&self, block_num: u64) {
        self.highest_network.store(block_num, Ordering::SeqCst);
    }

    pub fn set_synchronizing(&self, synchronizing: bool) {
        self.synchronizing.store(synchronizing, Ordering::SeqCst);
    }

    pub fn block_count(&self) -> usize {
        self.blocks.read().len()
    }
}

impl BlockChain for InMemoryBlockChain {
    fn last_block_num(&self) -> u64 {
        self.blocks.read().keys().next_back().copied().unwrap_or(0)
    }

    fn last_block_version(&self) -> u32 {
        self.blocks
            .read()
            .values()
            .next_back()
            .map(|b| b.version)
            .unwrap_or(0)
    }

    fn highest_network_block_num(&self) -> u64 {
        self.highest_network
            .load(Ordering::SeqCst)
            .max(self.last_block_num())
    }

    fn is_synchronizing(&self) -> bool {
        self.synchronizing.load(Ordering::SeqCst)
    }

    fn get_block(&self, block_num: u64) -> Option<Block> {
        self.blocks.read().get(&block_num).cloned()
    }

    fn set_block_pow_field(&self, block_num: u64, pow_field: Vec<u8>) -> bool {
        match self.blocks.write().get_mut(&block_num) {
            Some(block) => {
                block.pow_field = Some(pow_field);
                true
            }
            None => false,
        }
    }

    fn add_block_signature(&self, block_num: u64, signature: BlockSignature) -> bool {
        match self.blocks.write().get_mut(&block_num) {
            Some(block) if block.frozen_signatures.is_none() => block.add_signature(signature),
            _ => false,
        }
    }

    fn update_frozen_signatures(&self, block_num: u64, signatures: Vec<BlockSignature>) -> bool {
        match self.blocks.write().get_mut(&block_num) {
            Some(block) => {
                block.frozen_signatures = Some(signatures);
                true
            }
            None => false,
        }
    }

    fn append_block(&self, block: Block) -> bool {
        let mut blocks = self.blocks.write();
        let expected = blocks.keys().next_back().map(|n| n + 1).unwrap_or(1);
        if block.block_num != expected {
            warn!(
                block_num = block.block_num,
                expected, "Rejected block append: does not extend tip"
            );
            return false;
        }
        debug!(block_num = block.block_num, "Block appended");
        blocks.insert(block.block_num, block);
        true
    }
}

// =============================================================================
// WALLET STATE
// =============================================================================

#[derive(Debug, Default)]
struct WalletStore {
    wallets: HashMap<Address, Wallet>,
    snapshot: Option<(u64, HashMap<Address, Wallet>)>,
}

/// Wallet state with snapshot-based begin/commit/revert.
#[derive(Debug, Default)]
pub struct InMemoryWalletState {
    store: Mutex<WalletStore>,
}

impl InMemoryWalletState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a balance outside any bracket.
    pub fn with_balance(self, address: &Address, balance: Amount) -> Self {
        self.set_wallet_balance(address, balance);
        self
    }

    pub fn wallet_count(&self) -> usize {
        self.store.lock().wallets.len()
    }

    fn update(&self, address: &Address, f: impl FnOnce(&mut Wallet)) {
        let mut store = self.store.lock();
        let wallet = store
            .wallets
            .entry(address.clone())
            .or_insert_with(|| Wallet::empty(address.clone()));
        f(wallet);
    }
}

impl WalletState for InMemoryWalletState {
    fn get_wallet(&self, address: &Address) -> Wallet {
        self.store
            .lock()
            .wallets
            .get(address)
            .cloned()
            .unwrap_or_else(|| Wallet::empty(address.clone()))
    }

    fn set_wallet_balance(&self, address: &Address, balance: Amount) {
        self.update(address, |w| w.balance = balance);
    }

    fn set_wallet_public_key(&self, address: &Address, public_key: Vec<u8>) {
        self.update(address, |w| w.public_key = Some(public_key));
    }

    fn set_wallet_multisig(
        &self,
        address: &Address,
        wallet_type: WalletType,
        allowed_signers: Vec<Address>,
        required_sigs: u8,
    ) {
        self.update(address, |w| {
            w.wallet_type = wallet_type;
            w.allowed_signers = allowed_signers;
            w.required_sigs = required_sigs;
        });
    }

    fn total_supply(&self) -> Amount {
        self.store
            .lock()
            .wallets
            .values()
            .map(|w| &w.balance)
            .sum()
    }

    fn begin_transaction(&self, block_num: u64) -> bool {
        let mut store = self.store.lock();
        if store.snapshot.is_some() {
            return false;
        }
        let snapshot = store.wallets.clone();
        store.snapshot = Some((block_num, snapshot));
        true
    }

    fn commit_transaction(&self) {
        self.store.lock().snapshot = None;
    }

    fn revert_transaction(&self) {
        let mut store = self.store.lock();
        if let Some((block_num, snapshot)) = store.snapshot.take() {
            debug!(block_num, "Wallet state reverted");
            store.wallets = snapshot;
        }
    }

    fn in_transaction(&self) -> bool {
        self.store.lock().snapshot.is_some()
    }
}

// =============================================================================
// TRANSACTION STORAGE
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemoryTransactionStorage {
    transactions: RwLock<HashMap<TxId, Transaction>>,
}

impl InMemoryTransactionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.transactions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.read().is_empty()
    }
}

impl TransactionStorage for InMemoryTransactionStorage {
    fn insert_transaction(&self, tx: &Transaction) -> bool {
        self.transactions
            .write()
            .insert(tx.id.clone(), tx.clone())
            .is_none()
    }

    fn get_transaction(&self, txid: &TxId, block_num: u64) -> Option<Transaction> {
        let transactions = self.transactions.read();
        let tx = transactions.get(txid)?;
        if block_num != 0 && tx.applied_block() != Some(block_num) {
            return None;
        }
        Some(tx.clone())
    }
}

// =============================================================================
// PRESENCE
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemoryPresenceDirectory {
    entries: RwLock<HashMap<Address, Presence>>,
}

impl InMemoryPresenceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, presence: Presence) {
        self.entries.write().insert(presence.wallet.clone(), presence);
    }
}

impl PresenceDirectory for InMemoryPresenceDirectory {
    fn get_presence_by_address(&self, address: &Address) -> Option<Presence> {
        self.entries.read().get(address).cloned()
    }

    fn receive_keepalive(&self, address: &Address, device_id: &[u8], last_seen: i64) -> bool {
        let mut entries = self.entries.write();
        let Some(presence) = entries.get_mut(address) else {
            return false;
        };
        match presence
            .addresses
            .iter_mut()
            .find(|a| a.device_id == device_id)
        {
            Some(device) if device.last_seen < last_seen => {
                device.last_seen = last_seen;
                true
            }
            _ => false,
        }
    }
}

// =============================================================================
// CLOCK
// =============================================================================

/// Manually advanced clock.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    time: AtomicU64,
}

impl ManualTimeSource {
    pub fn new(initial: Timestamp) -> Self {
        Self {
            time: AtomicU64::new(initial),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.time.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, time: Timestamp) {
        self.time.store(time, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Timestamp {
        self.time.load(Ordering::SeqCst)
    }
}

// =============================================================================
// NETWORK
// =============================================================================

/// Destination of a recorded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageTarget {
    Endpoint(EndpointId),
    Broadcast {
        node_types: Vec<NodeType>,
        skip: Option<EndpointId>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub target: MessageTarget,
    pub code: ProtocolMessageCode,
    pub payload: Vec<u8>,
}

/// Network that records every outbound message.
#[derive(Debug, Default)]
pub struct RecordingNetwork {
    sent: Mutex<Vec<SentMessage>>,
}

impl RecordingNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    /// Drains the recorded messages.
    pub fn take(&self) -> Vec<SentMessage> {
        std::mem::take(&mut *self.sent.lock())
    }

    pub fn count(&self, code: ProtocolMessageCode) -> usize {
        self.sent.lock().iter().filter(|m| m.code == code).count()
    }
}

impl PeerNetwork for RecordingNetwork {
    fn send_data(
        &self,
        endpoint: &EndpointId,
        code: ProtocolMessageCode,
        payload: Vec<u8>,
    ) -> bool {
        self.sent.lock().push(SentMessage {
            target: MessageTarget::Endpoint(endpoint.clone()),
            code,
            payload,
        });
        true
    }

    fn broadcast(
        &self,
        node_types: &[NodeType],
        code: ProtocolMessageCode,
        payload: Vec<u8>,
        skip: Option<&EndpointId>,
    ) -> bool {
        self.sent.lock().push(SentMessage {
            target: MessageTarget::Broadcast {
                node_types: node_types.to_vec(),
                skip: skip.cloned(),
            },
            code,
            payload,
        });
        true
    }
}
