//! # Test Node Harness
//!
//! A fully wired [`NodeContainer`] on in-memory collaborators, with the
//! concrete adapters kept at hand so scenarios can seed wallets, move the
//! clock and inspect outbound traffic.
//!
//! Every node starts from the same deterministic chain: a genesis block
//! followed by blocks signed by [`SIGNERS`], with signatures frozen five
//! blocks behind the tip. Two nodes built to the same height therefore
//! share an identical prefix.

use std::sync::Arc;

use ixi_06_protocol::{MessageOutcome, ProtocolApi, ProtocolResult};
use node_runtime::container::{NodeCollaborators, NodeConfig, NodeContainer};
use node_runtime::genesis::{GenesisBuilder, GenesisConfig};
use node_runtime::wiring::{MaintenanceLoop, MaintenanceReport};
use shared_crypto::pow::find_nonce;
use shared_crypto::{Ed25519KeyPair, Ed25519Verifier, HashTargetPowVerifier, PowAlgorithm};
use shared_types::in_memory::{
    InMemoryBlockChain, InMemoryPresenceDirectory, InMemoryTransactionStorage,
    InMemoryWalletState, ManualTimeSource, MessageTarget, RecordingNetwork, SentMessage,
};
use shared_types::{
    Address, Amount, Block, BlockChain, BlockSignature, EndpointId, MultisigPayload,
    MultisigSigner, NodeType, Presence, PresenceAddress, ProtocolMessageCode, Transaction,
    TransactionBuilder, TransactionPayload, TransactionType, TxId, WalletState,
    SIGNATURE_FREEZE_DEPTH,
};

// =============================================================================
// KEYS AND AMOUNTS
// =============================================================================

/// Seeds of the keys signing every harness block.
pub const SIGNERS: [u8; 2] = [1, 2];

/// Height scenarios start from; past the bootstrap range.
pub const START_HEIGHT: u64 = 12;

/// Start of the manual clock, in milliseconds.
pub const START_TIME: u64 = 100_000;

pub fn keypair(seed: u8) -> Ed25519KeyPair {
    Ed25519KeyPair::from_seed([seed; 32])
}

pub fn pub_key(key: &Ed25519KeyPair) -> Vec<u8> {
    key.public_key().as_bytes().to_vec()
}

pub fn address_of(key: &Ed25519KeyPair) -> Address {
    Address::from_public_key(&pub_key(key), &[0])
}

pub fn coins(n: i64) -> Amount {
    Amount::from_coins(n)
}

pub fn small_fee() -> Amount {
    Amount::parse("0.001").unwrap()
}

pub fn peer(name: &str) -> EndpointId {
    EndpointId::new(name)
}

// =============================================================================
// TRANSACTIONS
// =============================================================================

/// Signed single-input transfer bound to `block_height`.
pub fn transfer(
    key: &Ed25519KeyPair,
    to: &Address,
    amount: Amount,
    fee: Amount,
    block_height: u64,
) -> Transaction {
    let mut tx = TransactionBuilder::new(TransactionType::Normal, 3)
        .to(to.clone(), amount)
        .fee(fee)
        .block_height(block_height)
        .pub_key(pub_key(key))
        .timestamp(1_700_000_000)
        .build();
    tx.sign_with(key);
    tx
}

/// Proof-of-work solution for `target` mined by `key`.
pub fn pow_solution(key: &Ed25519KeyPair, target: &Block, block_height: u64) -> Transaction {
    let solver = address_of(key);
    let nonce = find_nonce(
        PowAlgorithm::for_block_version(target.version),
        &target.block_checksum,
        solver.as_bytes(),
        target.difficulty,
        100_000,
    )
    .expect("low difficulty nonce");
    let mut tx = TransactionBuilder::new(TransactionType::PoWSolution, 3)
        .amount(Amount::zero())
        .block_height(block_height)
        .pub_key(pub_key(key))
        .payload(TransactionPayload::PowSolution {
            block_num: target.block_num,
            nonce,
        })
        .timestamp(1_700_000_001)
        .build();
    tx.sign_with(key);
    tx
}

/// Multisig transaction spending from `wallet`, signed by `signer`.
pub fn multisig_tx(
    tx_type: TransactionType,
    wallet: &Address,
    signer: &Ed25519KeyPair,
    payload: MultisigPayload,
    to: Option<(&Address, Amount)>,
    timestamp: i64,
) -> Transaction {
    let mut builder = TransactionBuilder::new(tx_type, 3)
        .fee(small_fee())
        .block_height(START_HEIGHT)
        .pub_key(wallet.as_bytes().to_vec())
        .payload(TransactionPayload::Multisig(payload))
        .timestamp(timestamp);
    builder = match to {
        Some((address, amount)) => builder.to(address.clone(), amount),
        None => builder.amount(Amount::zero()),
    };
    let mut tx = builder.build();
    tx.sign_with(signer);
    tx
}

pub fn multisig_signer(key: &Ed25519KeyPair) -> MultisigSigner {
    MultisigSigner::new(pub_key(key), vec![0])
}

// =============================================================================
// BLOCKS
// =============================================================================

fn sign(key: &Ed25519KeyPair, block: &Block) -> BlockSignature {
    BlockSignature {
        signer_address: address_of(key),
        signer_pub_key: Some(pub_key(key)),
        signature: key.sign(&block.block_checksum).as_bytes().to_vec(),
    }
}

/// Sealed block on top of `chain`, signed by `signers`.
pub fn build_block(
    chain: &dyn BlockChain,
    block_num: u64,
    transactions: Vec<TxId>,
    signers: &[u8],
) -> Block {
    let mut block = Block {
        block_num,
        version: 5,
        last_block_checksum: chain
            .get_block(block_num - 1)
            .map(|b| b.block_checksum)
            .unwrap_or_default(),
        signature_freeze_checksum: block_num
            .checked_sub(SIGNATURE_FREEZE_DEPTH)
            .filter(|n| *n > 0)
            .and_then(|n| chain.get_block(n))
            .map(|b| b.calculate_signature_checksum()),
        transactions,
        difficulty: 2,
        timestamp: block_num as i64,
        ..Default::default()
    };
    block.seal();
    block.signatures = signers.iter().map(|s| sign(&keypair(*s), &block)).collect();
    block
}

// =============================================================================
// TEST NODE
// =============================================================================

/// One wired node plus handles on its concrete collaborators.
pub struct TestNode {
    pub container: Arc<NodeContainer>,
    pub chain: Arc<InMemoryBlockChain>,
    pub wallets: Arc<InMemoryWalletState>,
    pub presence: Arc<InMemoryPresenceDirectory>,
    pub network: Arc<RecordingNetwork>,
    pub time: Arc<ManualTimeSource>,
}

impl TestNode {
    /// Node whose chain holds genesis plus signed blocks up to `height`.
    pub fn new(height: u64) -> Self {
        let chain = Arc::new(InMemoryBlockChain::new());
        let wallets = Arc::new(InMemoryWalletState::new());
        let presence = Arc::new(InMemoryPresenceDirectory::new());
        let network = Arc::new(RecordingNetwork::new());
        let time = Arc::new(ManualTimeSource::new(START_TIME));

        let collaborators = NodeCollaborators {
            chain: chain.clone(),
            wallets: wallets.clone(),
            storage: Arc::new(InMemoryTransactionStorage::new()),
            presence: presence.clone(),
            network: network.clone(),
            time: time.clone(),
            signatures: Arc::new(Ed25519Verifier),
            pow: Arc::new(HashTargetPowVerifier),
        };
        let container = Arc::new(NodeContainer::new(NodeConfig::for_testing(), collaborators));

        GenesisBuilder::new(GenesisConfig {
            difficulty: 2,
            ..GenesisConfig::default()
        })
        .install(chain.as_ref(), wallets.as_ref())
        .unwrap();

        for seed in SIGNERS {
            let key = keypair(seed);
            presence.insert(Presence {
                wallet: address_of(&key),
                pub_key: pub_key(&key),
                addresses: vec![PresenceAddress {
                    device_id: vec![seed],
                    node_type: NodeType::Master,
                    last_seen: 100,
                }],
            });
        }

        let node = Self {
            container,
            chain,
            wallets,
            presence,
            network,
            time,
        };
        for n in 2..=height {
            let block = build_block(node.chain.as_ref(), n, Vec::new(), &SIGNERS);
            node.append_frozen(block);
        }
        node
    }

    /// Appends directly, bypassing the pool, and freezes the block five back.
    fn append_frozen(&self, block: Block) {
        let block_num = block.block_num;
        assert!(self.chain.append_block(block));
        if let Some(target) = block_num
            .checked_sub(SIGNATURE_FREEZE_DEPTH)
            .filter(|t| *t > 0)
        {
            let signatures = self.chain.get_block(target).unwrap().signatures;
            self.chain.update_frozen_signatures(target, signatures);
        }
    }

    pub fn height(&self) -> u64 {
        self.chain.last_block_num()
    }

    pub fn fund(&self, address: &Address, amount: Amount) {
        self.wallets.set_wallet_balance(address, amount);
    }

    pub fn balance(&self, address: &Address) -> Amount {
        self.wallets.get_wallet(address).balance
    }

    pub fn supply(&self) -> Amount {
        self.wallets.total_supply()
    }

    /// Next block on this node's tip, signed by every harness signer.
    pub fn next_block(&self, transactions: Vec<TxId>) -> Block {
        build_block(
            self.chain.as_ref(),
            self.height() + 1,
            transactions,
            &SIGNERS,
        )
    }

    // =========================================================================
    // MESSAGING
    // =========================================================================

    /// Hands one inbound message to the protocol handler.
    pub fn deliver_from(
        &self,
        endpoint: &EndpointId,
        code: ProtocolMessageCode,
        payload: &[u8],
    ) -> ProtocolResult<MessageOutcome> {
        self.container
            .protocol
            .handle_message(endpoint, code.as_u16(), payload)
    }

    pub fn deliver(
        &self,
        code: ProtocolMessageCode,
        payload: &[u8],
    ) -> ProtocolResult<MessageOutcome> {
        self.deliver_from(&peer("peer-1"), code, payload)
    }

    pub fn submit(&self, tx: &Transaction) -> MessageOutcome {
        self.deliver(ProtocolMessageCode::NewTransaction, &tx.to_bytes().unwrap())
            .unwrap()
    }

    pub fn deliver_block(&self, block: &Block) -> ProtocolResult<MessageOutcome> {
        self.deliver(ProtocolMessageCode::BlockData, &block.to_bytes().unwrap())
    }

    /// Drains outbound messages addressed to a single endpoint.
    pub fn take_requests(&self) -> Vec<SentMessage> {
        self.network
            .take()
            .into_iter()
            .filter(|m| matches!(m.target, MessageTarget::Endpoint(_)))
            .collect()
    }

    /// Delivers every endpoint-addressed message of `self` to `other`.
    ///
    /// Returns the number of messages relayed.
    pub fn relay_to(&self, other: &TestNode, as_endpoint: &EndpointId) -> usize {
        let messages = self.take_requests();
        for message in &messages {
            let _ = other.deliver_from(as_endpoint, message.code, &message.payload);
        }
        messages.len()
    }

    pub fn advance_time(&self, ms: u64) {
        self.time.advance(ms);
    }

    pub fn tick(&self) -> MaintenanceReport {
        MaintenanceLoop::new(self.container.clone()).tick()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodes_share_identical_prefix() {
        let a = TestNode::new(START_HEIGHT);
        let b = TestNode::new(START_HEIGHT + 2);

        assert_eq!(a.height(), START_HEIGHT);
        for n in 1..=START_HEIGHT {
            assert_eq!(
                a.chain.get_block(n).unwrap().block_checksum,
                b.chain.get_block(n).unwrap().block_checksum
            );
        }
    }

    #[test]
    fn test_relay_carries_endpoint_replies_only() {
        let a = TestNode::new(START_HEIGHT);
        let b = TestNode::new(START_HEIGHT);
        let request = shared_types::messages::BlockRequest {
            block_num: 3,
            include_transactions: false,
        };

        a.deliver(ProtocolMessageCode::GetBlock, &request.encode())
            .unwrap();
        assert_eq!(a.relay_to(&b, &peer("a")), 1);
        assert!(a.network.sent().is_empty());
    }
}
