//! # Inventory Service
//!
//! Turns peer announcements into at-most-once content requests.
//!
//! ## Handlers
//!
//! | Item | Done when | Request |
//! |------|-----------|---------|
//! | Block | `block_num <= height` | `GetBlock(height + 1)` |
//! | BlockSignature | stale, other fork, or signer already present | batched `GetBlockSignatures` |
//! | Transaction | already in the pool | batched `GetTransactions` |
//! | KeepAlive | local `last_seen` is as new | `GetPresence` or batched `GetKeepAlives` |
//!
//! Blocks are fetched strictly in sequence: an announcement of a block far
//! ahead requests `height + 1` and stays in the cache, so every retry
//! advances the local chain by one block until it reaches the announced one.
//!
//! Handlers consult the chain, the presence directory and the signature
//! lookup without holding the cache lock.

use crate::domain::{
    encode_inventory_chunks, Announcement, CacheReport, HandleOutcome, InventoryCache,
    InventoryConfig, InventoryReport,
};
use crate::metrics;
use crate::ports::{InventoryApi, SignatureLookup, TransactionLookup};
use parking_lot::Mutex;
use shared_types::messages::{
    BlockRequest, KeepAlivesRequest, PresenceRequest, SignaturesRequest, TransactionsRequest,
};
use shared_types::{
    Address, BlockChain, EndpointId, InventoryItem, InventoryItemType, NodeType, PeerNetwork,
    PresenceDirectory, ProtocolMessageCode, TimeSource, TxId, SIGNATURE_FREEZE_DEPTH,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Collaborators of the inventory service.
pub struct InventoryDependencies {
    pub chain: Arc<dyn BlockChain>,
    pub presence: Arc<dyn PresenceDirectory>,
    pub signatures: Arc<dyn SignatureLookup>,
    pub transactions: Arc<dyn TransactionLookup>,
    pub network: Arc<dyn PeerNetwork>,
    pub time: Arc<dyn TimeSource>,
}

/// Requests collected for one endpoint and sent together.
#[derive(Debug, Default)]
struct RequestBatch {
    transactions: Vec<TxId>,
    signatures: BTreeMap<(u64, Vec<u8>), Vec<Address>>,
    keepalives: Vec<(Address, Vec<u8>)>,
}

fn type_label(item_type: InventoryItemType) -> &'static str {
    match item_type {
        InventoryItemType::KeepAlive => "keepalive",
        InventoryItemType::Transaction => "transaction",
        InventoryItemType::BlockSignature => "signature",
        InventoryItemType::Block => "block",
    }
}

pub struct InventoryService {
    chain: Arc<dyn BlockChain>,
    presence: Arc<dyn PresenceDirectory>,
    signatures: Arc<dyn SignatureLookup>,
    transactions: Arc<dyn TransactionLookup>,
    network: Arc<dyn PeerNetwork>,
    time: Arc<dyn TimeSource>,
    config: InventoryConfig,
    cache: Mutex<InventoryCache>,
}

impl InventoryService {
    pub fn new(config: InventoryConfig, deps: InventoryDependencies) -> Self {
        Self {
            chain: deps.chain,
            presence: deps.presence,
            signatures: deps.signatures,
            transactions: deps.transactions,
            network: deps.network,
            time: deps.time,
            cache: Mutex::new(InventoryCache::new(&config)),
            config,
        }
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    pub fn cached_items(&self, item_type: InventoryItemType) -> usize {
        self.cache.lock().len(item_type)
    }

    pub fn is_processed(&self, item: &InventoryItem) -> bool {
        self.cache.lock().is_processed(item)
    }

    pub fn process_inventory(
        &self,
        endpoint: &EndpointId,
        items: Vec<InventoryItem>,
    ) -> InventoryReport {
        let now = self.time.now();
        let mut report = InventoryReport {
            received: items.len(),
            ..InventoryReport::default()
        };

        let mut fresh = Vec::new();
        {
            let mut cache = self.cache.lock();
            for item in items {
                match cache.announce(item.clone(), endpoint) {
                    Announcement::New => fresh.push(item),
                    Announcement::Known | Announcement::Processed => report.duplicates += 1,
                }
            }
        }
        report.new = fresh.len();

        let mut batch = RequestBatch::default();
        for item in fresh {
            metrics::record_item_received(type_label(item.item_type()));
            let outcome = self.handle_item(&item, endpoint, &mut batch);
            let mut cache = self.cache.lock();
            match outcome {
                HandleOutcome::Done => {
                    cache.mark_processed(&item);
                    report.done += 1;
                }
                HandleOutcome::Requested => {
                    cache.record_attempt(&item, now);
                    report.requested += 1;
                }
                HandleOutcome::Waiting => {
                    cache.record_attempt(&item, now);
                    report.waiting += 1;
                }
            }
        }
        self.flush_batch(endpoint, batch);

        debug!(
            %endpoint,
            received = report.received,
            new = report.new,
            requested = report.requested,
            "Processed inventory"
        );
        report
    }

    pub fn mark_processed(&self, item: &InventoryItem) -> bool {
        self.cache.lock().mark_processed(item)
    }

    pub fn broadcast_inventory(
        &self,
        items: &[InventoryItem],
        node_types: &[NodeType],
        skip: Option<&EndpointId>,
    ) -> usize {
        {
            let mut cache = self.cache.lock();
            for item in items {
                cache.mark_processed(item);
            }
        }
        let chunks = encode_inventory_chunks(
            items,
            self.config.max_message_size,
            self.config.max_items_per_chunk,
        );
        let sent = chunks.len();
        for chunk in chunks {
            self.network
                .broadcast(node_types, ProtocolMessageCode::Inventory, chunk, skip);
        }
        sent
    }

    pub fn process_cache(&self) -> CacheReport {
        let now = self.time.now();
        let due = self.cache.lock().collect_due(
            now,
            self.config.throttle_ms,
            self.config.max_retries,
        );
        let mut report = CacheReport {
            retried: due.items.len(),
            dropped: due.dropped,
            ..CacheReport::default()
        };
        if due.dropped > 0 {
            metrics::record_items_dropped(due.dropped);
        }

        let mut batches: BTreeMap<EndpointId, RequestBatch> = BTreeMap::new();
        for (item, endpoint) in due.items {
            let batch = batches.entry(endpoint.clone()).or_default();
            if self.handle_item(&item, &endpoint, batch) == HandleOutcome::Done {
                self.cache.lock().mark_processed(&item);
                report.completed += 1;
            }
        }
        for (endpoint, batch) in batches {
            self.flush_batch(&endpoint, batch);
        }

        if report.retried > 0 || report.dropped > 0 {
            info!(
                retried = report.retried,
                completed = report.completed,
                dropped = report.dropped,
                "Inventory cache pass"
            );
        }
        report
    }

    // =========================================================================
    // HANDLERS
    // =========================================================================

    fn handle_item(
        &self,
        item: &InventoryItem,
        endpoint: &EndpointId,
        batch: &mut RequestBatch,
    ) -> HandleOutcome {
        match item {
            InventoryItem::Block { block_num, .. } => self.handle_block(*block_num, endpoint),
            InventoryItem::BlockSignature {
                block_num,
                block_hash,
                signer,
            } => self.handle_signature(*block_num, block_hash, signer, endpoint, batch),
            InventoryItem::Transaction { txid } => {
                if self.transactions.has_transaction(txid) {
                    return HandleOutcome::Done;
                }
                batch.transactions.push(txid.clone());
                HandleOutcome::Requested
            }
            InventoryItem::KeepAlive {
                address,
                device_id,
                last_seen,
            } => self.handle_keepalive(address, device_id, *last_seen, endpoint, batch),
        }
    }

    fn handle_block(&self, block_num: u64, endpoint: &EndpointId) -> HandleOutcome {
        let height = self.chain.last_block_num();
        if block_num <= height {
            return HandleOutcome::Done;
        }
        self.request_block(height + 1, endpoint);
        if block_num == height + 1 {
            HandleOutcome::Requested
        } else {
            HandleOutcome::Waiting
        }
    }

    fn handle_signature(
        &self,
        block_num: u64,
        block_hash: &[u8],
        signer: &Address,
        endpoint: &EndpointId,
        batch: &mut RequestBatch,
    ) -> HandleOutcome {
        let height = self.chain.last_block_num();
        if block_num.saturating_add(SIGNATURE_FREEZE_DEPTH) <= height {
            trace!(block_num, height, "Stale signature announcement");
            return HandleOutcome::Done;
        }
        if block_num > height + 1 {
            return HandleOutcome::Waiting;
        }

        let Some(local_hash) = self.signatures.block_checksum(block_num) else {
            if block_num == height + 1 {
                self.request_block(block_num, endpoint);
            }
            return HandleOutcome::Waiting;
        };
        if local_hash != block_hash {
            debug!(block_num, "Signature announced for a different block hash");
            return HandleOutcome::Done;
        }
        if self.signatures.has_signature(block_num, block_hash, signer) {
            return HandleOutcome::Done;
        }

        batch
            .signatures
            .entry((block_num, block_hash.to_vec()))
            .or_default()
            .push(signer.clone());
        HandleOutcome::Requested
    }

    fn handle_keepalive(
        &self,
        address: &Address,
        device_id: &[u8],
        last_seen: i64,
        endpoint: &EndpointId,
        batch: &mut RequestBatch,
    ) -> HandleOutcome {
        let Some(presence) = self.presence.get_presence_by_address(address) else {
            self.send_request(
                endpoint,
                ProtocolMessageCode::GetPresence,
                PresenceRequest {
                    address: address.clone(),
                }
                .encode(),
            );
            return HandleOutcome::Requested;
        };
        if presence
            .device(device_id)
            .is_some_and(|device| device.last_seen >= last_seen)
        {
            return HandleOutcome::Done;
        }
        batch
            .keepalives
            .push((address.clone(), device_id.to_vec()));
        HandleOutcome::Requested
    }

    // =========================================================================
    // REQUESTS
    // =========================================================================

    fn request_block(&self, block_num: u64, endpoint: &EndpointId) {
        self.send_request(
            endpoint,
            ProtocolMessageCode::GetBlock,
            BlockRequest {
                block_num,
                include_transactions: true,
            }
            .encode(),
        );
    }

    fn send_request(&self, endpoint: &EndpointId, code: ProtocolMessageCode, payload: Vec<u8>) {
        if self.network.send_data(endpoint, code, payload) {
            metrics::record_request_sent(&code.to_string());
        } else {
            debug!(%endpoint, %code, "Request not delivered");
        }
    }

    fn flush_batch(&self, endpoint: &EndpointId, batch: RequestBatch) {
        let max_items = self.config.max_items_per_chunk.max(1);

        for txids in batch.transactions.chunks(max_items) {
            let request = TransactionsRequest {
                txids: txids.to_vec(),
            };
            self.send_request(endpoint, ProtocolMessageCode::GetTransactions, request.encode());
        }

        for ((block_num, block_hash), signers) in batch.signatures {
            for signers in signers.chunks(max_items) {
                let request = SignaturesRequest {
                    block_num,
                    block_hash: block_hash.clone(),
                    signers: signers.to_vec(),
                };
                self.send_request(
                    endpoint,
                    ProtocolMessageCode::GetBlockSignatures,
                    request.encode(),
                );
            }
        }

        for entries in batch.keepalives.chunks(max_items) {
            let request = KeepAlivesRequest {
                entries: entries.to_vec(),
            };
            self.send_request(endpoint, ProtocolMessageCode::GetKeepAlives, request.encode());
        }
    }
}

impl InventoryApi for InventoryService {
    fn process_inventory(
        &self,
        endpoint: &EndpointId,
        items: Vec<InventoryItem>,
    ) -> InventoryReport {
        InventoryService::process_inventory(self, endpoint, items)
    }

    fn mark_processed(&self, item: &InventoryItem) -> bool {
        InventoryService::mark_processed(self, item)
    }

    fn broadcast_inventory(
        &self,
        items: &[InventoryItem],
        node_types: &[NodeType],
        skip: Option<&EndpointId>,
    ) -> usize {
        InventoryService::broadcast_inventory(self, items, node_types, skip)
    }

    fn process_cache(&self) -> CacheReport {
        InventoryService::process_cache(self)
    }
}
