use super::*;
use crate::adapters::{InMemoryActivityLog, ManualTimeSource, RecordingEvents};
use crate::domain::staking::staking_reward_for_supply;
use crate::domain::CleanupReport;
use shared_crypto::pow::find_nonce;
use shared_crypto::{Ed25519KeyPair, Ed25519Verifier, HashTargetPowVerifier, PowAlgorithm};
use shared_types::in_memory::{
    InMemoryBlockChain, InMemoryTransactionStorage, InMemoryWalletState, RecordingNetwork,
};
use shared_types::{
    encode_varint, Address, Amount, BlockSignature, MultisigPayload, MultisigSigner,
    TransactionBuilder, TransactionPayload, TransactionType, TxStatus, WalletType,
};

// =============================================================================
// FIXTURE
// =============================================================================

fn keypair(seed: u8) -> Ed25519KeyPair {
    Ed25519KeyPair::from_seed([seed; 32])
}

fn pub_key(key: &Ed25519KeyPair) -> Vec<u8> {
    key.public_key().as_bytes().to_vec()
}

fn address_of(key: &Ed25519KeyPair) -> Address {
    Address::from_public_key(&pub_key(key), &[0])
}

fn coins(n: i64) -> Amount {
    Amount::from_coins(n)
}

fn small_fee() -> Amount {
    Amount::parse("0.001").unwrap()
}

/// Block signers used for every fixture block.
fn block_signers() -> [Ed25519KeyPair; 2] {
    [keypair(1), keypair(2)]
}

fn block(block_num: u64, version: u32, transactions: Vec<TxId>) -> Block {
    let mut block = Block {
        block_num,
        version,
        transactions,
        difficulty: 2,
        timestamp: block_num as i64,
        signatures: block_signers()
            .iter()
            .map(|key| BlockSignature {
                signer_address: address_of(key),
                signer_pub_key: None,
                signature: vec![1],
            })
            .collect(),
        ..Default::default()
    };
    block.seal();
    block
}

fn transfer(
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

fn pow_solution(key: &Ed25519KeyPair, target: &Block, block_height: u64) -> Transaction {
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

fn multisig_payload_tx(
    tx_type: TransactionType,
    wallet: &Address,
    signer: &Ed25519KeyPair,
    payload: MultisigPayload,
    to: Option<(&Address, Amount)>,
    timestamp: i64,
) -> Transaction {
    let mut builder = TransactionBuilder::new(tx_type, 3)
        .fee(small_fee())
        .block_height(12)
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

fn signer(key: &Ed25519KeyPair) -> MultisigSigner {
    MultisigSigner::new(pub_key(key), vec![0])
}

struct Fixture {
    chain: Arc<InMemoryBlockChain>,
    wallets: Arc<InMemoryWalletState>,
    storage: Arc<InMemoryTransactionStorage>,
    network: Arc<RecordingNetwork>,
    events: Arc<RecordingEvents>,
    activity: Arc<InMemoryActivityLog>,
    time: Arc<ManualTimeSource>,
    pool: TransactionPoolService,
}

impl Fixture {
    fn new(height: u64) -> Self {
        Self::with_config(PoolConfig::for_testing(), height)
    }

    fn with_config(config: PoolConfig, height: u64) -> Self {
        let chain = Arc::new(InMemoryBlockChain::new());
        for n in 1..=height {
            assert!(chain.append_block(block(n, 5, Vec::new())));
        }
        let wallets = Arc::new(InMemoryWalletState::new());
        let storage = Arc::new(InMemoryTransactionStorage::new());
        let network = Arc::new(RecordingNetwork::new());
        let events = Arc::new(RecordingEvents::new());
        let activity = Arc::new(InMemoryActivityLog::new());
        let time = Arc::new(ManualTimeSource::new(0));

        let pool = TransactionPoolService::new(
            PoolDependencies {
                chain: chain.clone(),
                wallets: wallets.clone(),
                storage: storage.clone(),
                network: network.clone(),
                signatures: Arc::new(Ed25519Verifier),
                pow: Arc::new(HashTargetPowVerifier),
                events: events.clone(),
                activity: activity.clone(),
                time: time.clone(),
            },
            config,
        );
        Self {
            chain,
            wallets,
            storage,
            network,
            events,
            activity,
            time,
            pool,
        }
    }

    fn fund(&self, address: &Address, amount: Amount) {
        self.wallets.set_wallet_balance(address, amount);
    }

    fn balance(&self, address: &Address) -> Amount {
        self.wallets.get_wallet(address).balance
    }

    fn next_block(&self, transactions: Vec<TxId>) -> Block {
        block(self.chain.last_block_num() + 1, 5, transactions)
    }

    /// Applies in commit mode and appends the block.
    fn commit(&self, block: Block) -> Result<(), BlockApplyError> {
        self.pool
            .apply_transactions_from_block(&block, ApplyMode::Commit)?;
        assert!(self.chain.append_block(block));
        Ok(())
    }
}

// =============================================================================
// ADMISSION AND VERIFICATION
// =============================================================================

#[test]
fn test_add_transaction_broadcasts_and_tracks() {
    let f = Fixture::new(12);
    let (a, b) = (keypair(20), keypair(21));
    f.fund(&address_of(&a), coins(100));

    let tx = transfer(&a, &address_of(&b), coins(40), coins(10), 12);
    f.pool.add_transaction(tx.clone(), false, None, true).unwrap();

    assert_eq!(f.pool.counts().unapplied, 1);
    assert_eq!(f.pool.counts().pending, 1);
    assert!(f.pool.is_pending(&tx.id));
    assert_eq!(f.network.count(ProtocolMessageCode::NewTransaction), 1);
    assert_eq!(f.events.count(TransactionEventKind::Added), 2);
    let activity = f.activity.get(&tx.id).unwrap();
    assert_eq!(activity.status, ActivityStatus::Pending);
}

#[test]
fn test_add_from_peer_is_not_tracked() {
    let f = Fixture::new(12);
    let (a, b) = (keypair(20), keypair(21));
    f.fund(&address_of(&a), coins(100));

    let tx = transfer(&a, &address_of(&b), coins(40), coins(10), 12);
    let peer = EndpointId::new("peer-1");
    f.pool.add_transaction(tx.clone(), false, Some(&peer), true).unwrap();

    assert!(!f.pool.is_pending(&tx.id));
    let sent = f.network.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].target,
        shared_types::in_memory::MessageTarget::Broadcast {
            node_types: TX_RELAY_NODE_TYPES.to_vec(),
            skip: Some(peer),
        }
    );
}

#[test]
fn test_duplicate_transaction_rejected() {
    let f = Fixture::new(12);
    let (a, b) = (keypair(20), keypair(21));
    f.fund(&address_of(&a), coins(100));
    let tx = transfer(&a, &address_of(&b), coins(40), coins(10), 12);

    f.pool.add_transaction(tx.clone(), true, None, true).unwrap();
    assert_eq!(
        f.pool.add_transaction(tx.clone(), true, None, true),
        Err(TxRejection::Duplicate(tx.id.clone()))
    );

    f.commit(f.next_block(vec![tx.id.clone()])).unwrap();
    assert!(matches!(
        f.pool.add_transaction(tx, true, None, false),
        Err(TxRejection::Duplicate(_))
    ));
}

#[test]
fn test_applied_transaction_bound_to_later_height_is_not_readmitted() {
    let f = Fixture::new(12);
    let (a, b) = (keypair(20), keypair(21));
    f.fund(&address_of(&a), coins(100));
    let tx = transfer(&a, &address_of(&b), coins(40), coins(10), 20);

    f.pool.add_transaction(tx.clone(), true, None, true).unwrap();
    f.commit(f.next_block(vec![tx.id.clone()])).unwrap();

    assert_eq!(
        f.pool.add_transaction(tx.clone(), true, None, true),
        Err(TxRejection::Duplicate(tx.id.clone()))
    );
    assert_eq!(f.pool.counts().unapplied, 0);
    assert_eq!(
        f.pool
            .apply_transactions_from_block(&f.next_block(vec![tx.id.clone()]), ApplyMode::Commit),
        Err(BlockApplyError::MissingTransaction(tx.id.clone()))
    );
    assert_eq!(f.balance(&address_of(&a)), coins(50));
    assert_eq!(f.balance(&address_of(&b)), coins(40));
}

#[test]
fn test_redacted_transaction_is_not_readmitted() {
    let f = Fixture::new(12);
    let (a, b) = (keypair(20), keypair(21));
    f.fund(&address_of(&a), coins(100));
    let tx = transfer(&a, &address_of(&b), coins(1), coins(1), 12);
    f.pool.add_transaction(tx.clone(), true, None, true).unwrap();
    let block = f.next_block(vec![tx.id.clone()]);
    f.commit(block.clone()).unwrap();

    assert_eq!(f.pool.redact_transactions_for_block(&block), 1);
    assert!(matches!(
        f.pool.add_transaction(tx, true, None, false),
        Err(TxRejection::Duplicate(_))
    ));
    assert_eq!(f.pool.counts().unapplied, 0);
}

#[test]
fn test_relabelled_transaction_rejected() {
    let f = Fixture::new(12);
    let (a, b) = (keypair(20), keypair(21));
    f.fund(&address_of(&a), coins(100));
    let tx = transfer(&a, &address_of(&b), coins(40), coins(10), 12);
    f.pool.add_transaction(tx.clone(), true, None, true).unwrap();

    let mut copy = tx.clone();
    copy.id = TxId(format!("{}-copy", tx.id));
    assert_eq!(
        f.pool.add_transaction(copy.clone(), true, None, true),
        Err(TxRejection::ChecksumMismatch)
    );
    assert_eq!(
        f.pool.add_transaction(copy.clone(), true, None, false),
        Err(TxRejection::ChecksumMismatch)
    );
    assert!(!f.pool.has_transaction(&copy.id));

    f.commit(f.next_block(vec![tx.id.clone()])).unwrap();
    assert_eq!(f.balance(&address_of(&a)), coins(50));
    assert_eq!(f.balance(&address_of(&b)), coins(40));
}

#[test]
fn test_no_transactions_before_first_block() {
    let f = Fixture::new(0);
    let (a, b) = (keypair(20), keypair(21));
    let tx = transfer(&a, &address_of(&b), coins(1), coins(1), 1);
    assert_eq!(
        f.pool.verify_transaction(&tx, None, true),
        Err(TxRejection::ChainNotStarted)
    );
}

#[test]
fn test_bootstrap_window_admits_only_minted() {
    let f = Fixture::new(5);
    let (a, b) = (keypair(20), keypair(21));
    f.fund(&address_of(&a), coins(100));
    let tx = transfer(&a, &address_of(&b), coins(1), coins(1), 5);
    assert_eq!(
        f.pool.verify_transaction(&tx, None, true),
        Err(TxRejection::BootstrapWindow { height: 5 })
    );
}

#[test]
fn test_block_height_window() {
    let f = Fixture::new(12);
    let (a, b) = (keypair(20), keypair(21));
    f.fund(&address_of(&a), coins(100));

    let ahead = transfer(&a, &address_of(&b), coins(1), coins(1), 23);
    assert!(matches!(
        f.pool.verify_transaction(&ahead, None, true),
        Err(TxRejection::BlockHeightOutOfWindow { max: 22, .. })
    ));

    f.chain.set_highest_network_block_num(20);
    assert!(f.pool.verify_transaction(&ahead, None, true).is_ok());
}

#[test]
fn test_unsupported_version() {
    let f = Fixture::new(12);
    let (a, b) = (keypair(20), keypair(21));
    f.fund(&address_of(&a), coins(100));
    let mut tx = TransactionBuilder::new(TransactionType::Normal, 5)
        .to(address_of(&b), coins(1))
        .fee(coins(1))
        .block_height(12)
        .pub_key(pub_key(&a))
        .build();
    tx.sign_with(&a);
    assert_eq!(
        f.pool.verify_transaction(&tx, None, true),
        Err(TxRejection::UnsupportedVersion {
            version: 5,
            block_version: 5
        })
    );
}

#[test]
fn test_overspend_rejected_unless_synchronizing() {
    let f = Fixture::new(12);
    let (a, b) = (keypair(20), keypair(21));
    f.fund(&address_of(&a), coins(5));
    let tx = transfer(&a, &address_of(&b), coins(40), coins(10), 12);

    assert!(matches!(
        f.pool.verify_transaction(&tx, None, true),
        Err(TxRejection::InsufficientFunds { .. })
    ));
    f.chain.set_synchronizing(true);
    assert!(f.pool.verify_transaction(&tx, None, true).is_ok());
}

#[test]
fn test_fee_below_minimum() {
    let f = Fixture::new(12);
    let (a, b) = (keypair(20), keypair(21));
    f.fund(&address_of(&a), coins(100));
    let tx = transfer(&a, &address_of(&b), coins(1), Amount::zero(), 12);
    assert!(matches!(
        f.pool.verify_transaction(&tx, None, true),
        Err(TxRejection::FeeTooLow { .. })
    ));
}

#[test]
fn test_bad_signature_only_fails_full_check() {
    let f = Fixture::new(12);
    let (a, b, c) = (keypair(20), keypair(21), keypair(22));
    f.fund(&address_of(&a), coins(100));
    let mut tx = transfer(&a, &address_of(&b), coins(1), coins(1), 12);
    tx.sign_with(&c);

    assert_eq!(
        f.pool.verify_transaction(&tx, None, true),
        Err(TxRejection::InvalidSignature)
    );
    assert!(f.pool.verify_transaction(&tx, None, false).is_ok());
}

#[test]
fn test_bound_key_must_match_inputs() {
    let f = Fixture::new(12);
    let (a, b, c) = (keypair(20), keypair(21), keypair(22));
    f.fund(&address_of(&a), coins(100));
    f.wallets.set_wallet_public_key(&address_of(&a), pub_key(&c));

    let tx = transfer(&a, &address_of(&b), coins(1), coins(1), 12);
    assert_eq!(
        f.pool.verify_transaction(&tx, None, true),
        Err(TxRejection::AddressMismatch)
    );
}

#[test]
fn test_tampered_checksum_rejected() {
    let f = Fixture::new(12);
    let (a, b) = (keypair(20), keypair(21));
    f.fund(&address_of(&a), coins(100));
    let mut tx = transfer(&a, &address_of(&b), coins(1), coins(1), 12);
    tx.timestamp += 1;
    assert_eq!(
        f.pool.verify_transaction(&tx, None, true),
        Err(TxRejection::ChecksumMismatch)
    );
}

#[test]
fn test_premine_floor_enforced() {
    let (a, b) = (keypair(20), keypair(21));
    let config = PoolConfig {
        premine_addresses: vec![address_of(&a)],
        ..PoolConfig::for_testing()
    };
    let f = Fixture::with_config(config, 12);
    f.fund(&address_of(&a), coins(900_000_050));

    let tx = transfer(&a, &address_of(&b), coins(100), coins(1), 12);
    assert!(matches!(
        f.pool.verify_transaction(&tx, None, true),
        Err(TxRejection::PremineCapExceeded { .. })
    ));
    let small = transfer(&a, &address_of(&b), coins(20), coins(1), 12);
    assert!(f.pool.verify_transaction(&small, None, true).is_ok());
}

// =============================================================================
// BLOCK APPLICATION
// =============================================================================

#[test]
fn test_commit_moves_balances_and_marks_applied() {
    let f = Fixture::new(12);
    let (a, b) = (keypair(20), keypair(21));
    f.fund(&address_of(&a), coins(100));
    f.fund(&address_of(&b), coins(100));

    let tx = transfer(&a, &address_of(&b), coins(40), coins(10), 12);
    f.pool.add_transaction(tx.clone(), false, None, true).unwrap();
    f.commit(f.next_block(vec![tx.id.clone()])).unwrap();

    assert_eq!(f.balance(&address_of(&a)), coins(50));
    assert_eq!(f.balance(&address_of(&b)), coins(140));
    assert_eq!(
        f.wallets.get_wallet(&address_of(&a)).public_key,
        Some(pub_key(&a))
    );

    let applied = f.pool.get_applied_transaction(&tx.id, 0, false).unwrap();
    assert_eq!(applied.status, TxStatus::Applied(13));
    assert!(f.pool.get_unapplied_transaction(&tx.id).is_none());
    assert!(!f.pool.is_pending(&tx.id));
    assert_eq!(f.storage.len(), 1);
    assert_eq!(f.events.count(TransactionEventKind::Applied), 2);
    assert_eq!(f.activity.get(&tx.id).unwrap().status, ActivityStatus::Final);
    assert!(!f.wallets.in_transaction());
}

#[test]
fn test_verify_mode_reverts_everything() {
    let f = Fixture::new(12);
    let (a, b) = (keypair(20), keypair(21));
    f.fund(&address_of(&a), coins(100));

    let tx = transfer(&a, &address_of(&b), coins(40), coins(10), 12);
    f.pool.add_transaction(tx.clone(), true, None, true).unwrap();
    let block = f.next_block(vec![tx.id.clone()]);
    f.pool
        .apply_transactions_from_block(&block, ApplyMode::Verify)
        .unwrap();

    assert_eq!(f.balance(&address_of(&a)), coins(100));
    assert_eq!(f.balance(&address_of(&b)), Amount::zero());
    let pooled = f.pool.get_unapplied_transaction(&tx.id).unwrap();
    assert_eq!(pooled.status, TxStatus::Unapplied);
    assert!(!f.wallets.in_transaction());
}

#[test]
fn test_failed_transaction_rejects_whole_block() {
    let f = Fixture::new(12);
    let (a, b, c) = (keypair(20), keypair(21), keypair(22));
    f.fund(&address_of(&a), coins(100));
    f.fund(&address_of(&c), coins(5));

    let good = transfer(&a, &address_of(&b), coins(40), coins(10), 12);
    let bad = transfer(&c, &address_of(&b), coins(40), coins(10), 12);
    f.pool.add_transaction(good.clone(), true, None, true).unwrap();
    f.pool.add_transaction(bad.clone(), true, None, false).unwrap();

    let block = f.next_block(vec![good.id.clone(), bad.id.clone()]);
    let err = f
        .pool
        .apply_transactions_from_block(&block, ApplyMode::Commit)
        .unwrap_err();
    match err {
        BlockApplyError::TransactionsFailed { count, first, .. } => {
            assert_eq!(count, 1);
            assert_eq!(first, bad.id);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(f.balance(&address_of(&a)), coins(100));
    assert_eq!(f.balance(&address_of(&b)), Amount::zero());
    assert!(f.pool.get_unapplied_transaction(&bad.id).is_none());
    assert_eq!(
        f.pool.get_unapplied_transaction(&good.id).unwrap().status,
        TxStatus::Unapplied
    );
}

#[test]
fn test_missing_transaction_rejects_block() {
    let f = Fixture::new(12);
    let missing = TxId::from("12-deadbeef");
    let block = f.next_block(vec![missing.clone()]);
    assert_eq!(
        f.pool.apply_transactions_from_block(&block, ApplyMode::Commit),
        Err(BlockApplyError::MissingTransaction(missing))
    );
    assert!(!f.wallets.in_transaction());
}

#[test]
fn test_open_wallet_bracket_blocks_application() {
    let f = Fixture::new(12);
    assert!(f.wallets.begin_transaction(99));
    let block = f.next_block(Vec::new());
    assert_eq!(
        f.pool.apply_transactions_from_block(&block, ApplyMode::Commit),
        Err(BlockApplyError::WalletBracketBusy)
    );
}

#[test]
fn test_genesis_applies_only_in_first_block() {
    let f = Fixture::new(0);
    let a = keypair(20);
    let genesis = TransactionBuilder::new(TransactionType::Genesis, 1)
        .to(address_of(&a), coins(1_000))
        .block_height(1)
        .build();

    f.pool.add_transaction(genesis.clone(), true, None, true).unwrap();
    f.commit(block(1, 1, vec![genesis.id.clone()])).unwrap();
    assert_eq!(f.balance(&address_of(&a)), coins(1_000));
}

#[test]
fn test_set_applied_flag_rejects_block_zero() {
    let f = Fixture::new(12);
    let (a, b) = (keypair(20), keypair(21));
    f.fund(&address_of(&a), coins(100));
    let tx = transfer(&a, &address_of(&b), coins(1), coins(1), 12);
    f.pool.add_transaction(tx.clone(), true, None, true).unwrap();

    assert_eq!(
        f.pool.set_applied_flag(&tx.id, 0, false),
        Err(TxRejection::ZeroBlockNum)
    );
    assert!(f.pool.get_unapplied_transaction(&tx.id).is_some());
}

// =============================================================================
// POW
// =============================================================================

#[test]
fn test_pow_reward_split_between_solvers() {
    let f = Fixture::new(12);
    let (x, y) = (keypair(30), keypair(31));
    let target = f.chain.get_block(5).unwrap();

    let sx = pow_solution(&x, &target, 12);
    let sy = pow_solution(&y, &target, 12);
    f.pool.add_transaction(sx.clone(), true, None, true).unwrap();
    f.pool.add_transaction(sy.clone(), true, None, true).unwrap();
    f.commit(f.next_block(vec![sx.id.clone(), sy.id.clone()]))
        .unwrap();

    let share = Amount::from_units(480_000_000);
    assert_eq!(f.balance(&address_of(&x)), share);
    assert_eq!(f.balance(&address_of(&y)), share);
    assert_eq!(
        f.chain.get_block(5).unwrap().pow_field,
        Some(encode_varint(13))
    );

    let late = pow_solution(&keypair(32), &target, 13);
    assert_eq!(
        f.pool.verify_transaction(&late, None, true),
        Err(TxRejection::PowAlreadySolved(5))
    );
}

#[test]
fn test_pow_reward_remainder_is_not_paid() {
    let f = Fixture::new(12);
    let target = f.chain.get_block(5).unwrap();
    let solvers: Vec<Ed25519KeyPair> = (40..47).map(keypair).collect();

    let solutions: Vec<Transaction> = solvers
        .iter()
        .map(|key| pow_solution(key, &target, 12))
        .collect();
    for tx in &solutions {
        f.pool.add_transaction(tx.clone(), true, None, true).unwrap();
    }
    let ids = solutions.iter().map(|tx| tx.id.clone()).collect();
    f.commit(f.next_block(ids)).unwrap();

    // 9.6 coins over 7 solvers leaves one base unit unpaid.
    let share = Amount::from_units(137_142_857);
    for key in &solvers {
        assert_eq!(f.balance(&address_of(key)), share);
    }
    assert_eq!(f.wallets.total_supply(), Amount::from_units(959_999_999));
}

#[test]
fn test_pow_future_target_rejected() {
    let f = Fixture::new(12);
    let target = block(20, 5, Vec::new());
    let tx = pow_solution(&keypair(30), &target, 12);
    assert_eq!(
        f.pool.verify_transaction(&tx, None, true),
        Err(TxRejection::PowFutureTarget {
            target: 20,
            height: 12
        })
    );
}

// =============================================================================
// MULTISIG
// =============================================================================

fn multisig_fixture() -> (Fixture, Ed25519KeyPair, Ed25519KeyPair, Address) {
    let f = Fixture::new(12);
    let (owner, cosigner) = (keypair(40), keypair(41));
    let wallet = address_of(&owner);
    f.fund(&wallet, coins(100));
    f.wallets.set_wallet_multisig(
        &wallet,
        WalletType::Multisig,
        vec![address_of(&cosigner)],
        2,
    );
    (f, owner, cosigner, wallet)
}

#[test]
fn test_multisig_requires_quorum() {
    let (f, owner, _, wallet) = multisig_fixture();
    let to = address_of(&keypair(21));
    let orig = multisig_payload_tx(
        TransactionType::MultisigTX,
        &wallet,
        &owner,
        MultisigPayload::TxData {
            signer: signer(&owner),
        },
        Some((&to, coins(10))),
        1,
    );
    f.pool.add_transaction(orig.clone(), true, None, true).unwrap();

    let err = f
        .pool
        .apply_transactions_from_block(&f.next_block(vec![orig.id.clone()]), ApplyMode::Commit)
        .unwrap_err();
    assert!(matches!(
        err,
        BlockApplyError::TransactionsFailed {
            reason: TxRejection::QuorumNotMet { have: 1, required: 2 },
            ..
        }
    ));
    assert_eq!(f.balance(&wallet), coins(100));
}

#[test]
fn test_multisig_applies_with_cosignature() {
    let (f, owner, cosigner, wallet) = multisig_fixture();
    let to = address_of(&keypair(21));
    let orig = multisig_payload_tx(
        TransactionType::MultisigTX,
        &wallet,
        &owner,
        MultisigPayload::TxData {
            signer: signer(&owner),
        },
        Some((&to, coins(10))),
        1,
    );
    let cosig = multisig_payload_tx(
        TransactionType::MultisigAddTxSignature,
        &wallet,
        &cosigner,
        MultisigPayload::AddTxSignature {
            orig_txid: orig.id.clone(),
            signer: signer(&cosigner),
        },
        None,
        2,
    );
    f.pool.add_transaction(orig.clone(), true, None, true).unwrap();
    f.pool.add_transaction(cosig.clone(), true, None, true).unwrap();

    // Co-signature listed first still waits for its original.
    f.commit(f.next_block(vec![cosig.id.clone(), orig.id.clone()]))
        .unwrap();

    let fees = &small_fee() + &small_fee();
    assert_eq!(f.balance(&to), coins(10));
    assert_eq!(f.balance(&wallet), &(coins(90)) - &fees);
    assert!(f.pool.get_applied_transaction(&cosig.id, 0, false).is_some());
}

#[test]
fn test_repeated_cosigner_is_invalid() {
    let (f, owner, cosigner, wallet) = multisig_fixture();
    let to = address_of(&keypair(21));
    let orig = multisig_payload_tx(
        TransactionType::MultisigTX,
        &wallet,
        &owner,
        MultisigPayload::TxData {
            signer: signer(&owner),
        },
        Some((&to, coins(10))),
        1,
    );
    f.pool.add_transaction(orig.clone(), true, None, true).unwrap();
    for timestamp in [2, 3] {
        let cosig = multisig_payload_tx(
            TransactionType::MultisigAddTxSignature,
            &wallet,
            &cosigner,
            MultisigPayload::AddTxSignature {
                orig_txid: orig.id.clone(),
                signer: signer(&cosigner),
            },
            None,
            timestamp,
        );
        f.pool.add_transaction(cosig, true, None, true).unwrap();
    }

    let related = f.pool.get_related_multisig_transactions(&orig.id, None, true);
    assert_eq!(related.len(), 1);
    assert_eq!(f.pool.counts().unapplied, 2);
}

#[test]
fn test_multisig_wallet_changes() {
    let f = Fixture::new(12);
    let (owner, cosigner) = (keypair(40), keypair(41));
    let wallet = address_of(&owner);
    f.fund(&wallet, coins(10));

    let add = multisig_payload_tx(
        TransactionType::ChangeMultisigWallet,
        &wallet,
        &owner,
        MultisigPayload::AddrAdd {
            signer: signer(&owner),
            address: address_of(&cosigner),
        },
        None,
        1,
    );
    f.pool.add_transaction(add.clone(), true, None, true).unwrap();
    f.commit(f.next_block(vec![add.id.clone()])).unwrap();

    let state = f.wallets.get_wallet(&wallet);
    assert!(state.is_multisig());
    assert_eq!(state.allowed_signers, vec![address_of(&cosigner)]);
    assert_eq!(state.required_sigs, 1);

    let raise = multisig_payload_tx(
        TransactionType::ChangeMultisigWallet,
        &wallet,
        &owner,
        MultisigPayload::ChSig {
            signer: signer(&owner),
            required_sigs: 2,
        },
        None,
        2,
    );
    f.pool.add_transaction(raise.clone(), true, None, true).unwrap();
    f.commit(f.next_block(vec![raise.id.clone()])).unwrap();
    assert_eq!(f.wallets.get_wallet(&wallet).required_sigs, 2);

    let too_many = multisig_payload_tx(
        TransactionType::ChangeMultisigWallet,
        &wallet,
        &owner,
        MultisigPayload::ChSig {
            signer: signer(&owner),
            required_sigs: 3,
        },
        None,
        3,
    );
    f.pool.add_transaction(too_many.clone(), true, None, true).unwrap();
    assert!(f
        .pool
        .apply_transactions_from_block(&f.next_block(vec![too_many.id.clone()]), ApplyMode::Commit)
        .is_err());
}

#[test]
fn test_signer_not_allowed() {
    let (f, _, _, wallet) = multisig_fixture();
    let stranger = keypair(50);
    let to = address_of(&keypair(21));
    let tx = multisig_payload_tx(
        TransactionType::MultisigTX,
        &wallet,
        &stranger,
        MultisigPayload::TxData {
            signer: signer(&stranger),
        },
        Some((&to, coins(1))),
        1,
    );
    assert_eq!(
        f.pool.verify_transaction(&tx, None, true),
        Err(TxRejection::SignerNotAllowed(address_of(&stranger)))
    );
}

// =============================================================================
// STAKING
// =============================================================================

#[test]
fn test_staking_rewards_applied() {
    let f = Fixture::new(12);
    let [s1, s2] = block_signers();
    f.fund(&address_of(&s1), coins(100));
    f.fund(&address_of(&s2), coins(300));
    let supply = f.wallets.total_supply();

    let rewards = f.pool.generate_staking_transactions(13);
    assert_eq!(rewards.len(), 2);
    for tx in &rewards {
        assert!(tx.id.is_staking());
        f.pool.add_transaction(tx.clone(), true, None, true).unwrap();
    }

    let ids = rewards.iter().map(|tx| tx.id.clone()).collect();
    f.commit(f.next_block(ids)).unwrap();

    let config = f.pool.config();
    let expected =
        staking_reward_for_supply(&supply, config.staking_inflation_ppm, config.blocks_per_year);
    assert_eq!(f.wallets.total_supply(), &supply + &expected);
}

#[test]
fn test_staking_set_must_match_pool() {
    let f = Fixture::new(12);
    let [s1, _] = block_signers();
    f.fund(&address_of(&s1), coins(100));
    for tx in f.pool.generate_staking_transactions(13) {
        f.pool.add_transaction(tx, true, None, true).unwrap();
    }

    assert_eq!(
        f.pool
            .apply_transactions_from_block(&f.next_block(Vec::new()), ApplyMode::Commit),
        Err(BlockApplyError::StakingSetMismatch)
    );
}

#[test]
fn test_staking_recipient_must_have_signed() {
    let f = Fixture::new(12);
    let outsider = address_of(&keypair(60));
    let tx = TransactionBuilder::new(TransactionType::StakingReward, 3)
        .to(outsider.clone(), Amount::from_units(1_000))
        .block_height(13)
        .payload(TransactionPayload::Staking { target_block: 7 })
        .build();
    f.pool.add_transaction(tx.clone(), true, None, true).unwrap();

    let err = f
        .pool
        .apply_transactions_from_block(&f.next_block(vec![tx.id.clone()]), ApplyMode::Commit)
        .unwrap_err();
    assert!(matches!(
        err,
        BlockApplyError::TransactionsFailed {
            reason: TxRejection::StakingRecipientNotSigner(_),
            ..
        }
    ));
    assert_eq!(f.balance(&outsider), Amount::zero());
}

// =============================================================================
// MAINTENANCE
// =============================================================================

#[test]
fn test_cleanup_drops_stale_expired_and_redacts() {
    let config = PoolConfig {
        redacted_window_size: 10,
        ..PoolConfig::for_testing()
    };
    let f = Fixture::with_config(config, 30);
    let (a, b) = (keypair(20), keypair(21));
    f.fund(&address_of(&a), coins(100));

    let old_applied = transfer(&a, &address_of(&b), coins(1), coins(1), 25);
    f.pool.add_transaction(old_applied.clone(), true, None, true).unwrap();
    f.pool.set_applied_flag(&old_applied.id, 15, false).unwrap();

    let expired = transfer(&a, &address_of(&b), coins(2), coins(1), 18);
    f.pool.add_transaction(expired.clone(), true, None, false).unwrap();

    let target = f.chain.get_block(22).unwrap();
    let stale = pow_solution(&keypair(30), &target, 25);
    f.pool.add_transaction(stale, true, None, false).unwrap();
    assert!(f.chain.set_block_pow_field(22, vec![1]));

    let report = f.pool.perform_cleanup();
    assert_eq!(
        report,
        CleanupReport {
            stale_pow_solutions: 1,
            expired: 1,
            redacted: 1,
        }
    );
    assert_eq!(f.pool.counts().unapplied, 0);
    assert_eq!(f.pool.counts().applied, 0);
}

#[test]
fn test_pending_inquiry_then_rebroadcast() {
    let f = Fixture::new(12);
    let (a, b) = (keypair(20), keypair(21));
    f.fund(&address_of(&a), coins(100));
    let tx = transfer(&a, &address_of(&b), coins(1), coins(1), 12);
    f.pool.add_transaction(tx.clone(), false, None, true).unwrap();

    f.time.advance(20_000);
    assert_eq!(f.pool.process_pending_transactions().inquiries, 1);
    assert_eq!(f.network.count(ProtocolMessageCode::GetTransaction), 1);

    f.time.advance(20_000);
    assert_eq!(f.pool.process_pending_transactions().rebroadcast, 1);
    assert_eq!(f.network.count(ProtocolMessageCode::NewTransaction), 2);

    for peer in ["p1", "p2", "p3"] {
        f.pool.confirm_pending(&tx.id, EndpointId::new(peer));
    }
    f.time.advance(60_000);
    assert_eq!(
        f.pool.process_pending_transactions(),
        crate::domain::PendingReport::default()
    );
}

#[test]
fn test_pending_drops_invalidated_transaction() {
    let f = Fixture::new(12);
    let (a, b) = (keypair(20), keypair(21));
    f.fund(&address_of(&a), coins(100));
    let tx = transfer(&a, &address_of(&b), coins(50), coins(1), 12);
    f.pool.add_transaction(tx.clone(), false, None, true).unwrap();

    f.fund(&address_of(&a), coins(1));
    assert_eq!(f.pool.process_pending_transactions().dropped, 1);
    assert!(!f.pool.is_pending(&tx.id));
}

#[test]
fn test_compact_redact_unredact() {
    let f = Fixture::new(12);
    let (a, b) = (keypair(20), keypair(21));
    f.fund(&address_of(&a), coins(100));
    let tx = transfer(&a, &address_of(&b), coins(1), coins(1), 12);
    f.pool.add_transaction(tx.clone(), true, None, true).unwrap();
    let block = f.next_block(vec![tx.id.clone()]);
    f.commit(block.clone()).unwrap();

    assert_eq!(f.pool.compact_transactions_for_block(&block), 1);
    assert_eq!(f.pool.counts().tombstones, 1);
    assert!(f.pool.get_applied_transaction(&tx.id, 13, false).is_none());
    assert!(f.pool.get_applied_transaction(&tx.id, 13, true).is_some());
    assert!(matches!(
        f.pool.add_transaction(tx.clone(), true, None, false),
        Err(TxRejection::Duplicate(_))
    ));

    assert_eq!(f.pool.redact_transactions_for_block(&block), 1);
    assert!(!f.pool.has_transaction(&tx.id));

    assert_eq!(f.pool.unredact_transactions_for_block(&block), 1);
    assert!(f.pool.get_applied_transaction(&tx.id, 13, false).is_some());
}
