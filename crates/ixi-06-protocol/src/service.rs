//! # Protocol Message Handler
//!
//! Size check, decode, dispatch. Handlers never hold a lock of their own;
//! each collaborator guards its own state.
//!
//! ```text
//! payload ──size──→ decode ──→ pool / coordinator / presence / inventory
//!                     │
//!                     └──request──→ reply to the sender only
//! ```

use crate::domain::{MessageOutcome, ProtocolConfig, ProtocolError, ProtocolResult};
use crate::metrics;
use crate::ports::ProtocolApi;
use ixi_02_transaction_pool::{TransactionPoolApi, TxRejection};
use ixi_04_inventory::{decode_inventory, InventoryApi};
use ixi_05_signature_freeze::{
    BlockOutcome, SignatureFreezeApi, SignatureOutcome, SIGNATURE_RELAY_NODE_TYPES,
};
use shared_types::messages::{
    BlockRequest, KeepAliveRecord, KeepAlivesChunk, KeepAlivesRequest, PresenceRequest,
    SignatureMessage, SignaturesChunk, SignaturesRequest, TransactionRequest, TransactionsChunk,
    TransactionsRequest,
};
use shared_types::{
    Block, BlockChain, EndpointId, InventoryItem, NodeType, PeerNetwork, PresenceDirectory,
    ProtocolMessageCode, Transaction, TxId,
};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Roles keepalive announcements are relayed to.
pub const KEEPALIVE_RELAY_NODE_TYPES: [NodeType; 3] =
    [NodeType::Master, NodeType::Full, NodeType::Relay];

pub struct ProtocolDependencies {
    pub chain: Arc<dyn BlockChain>,
    pub pool: Arc<dyn TransactionPoolApi>,
    pub inventory: Arc<dyn InventoryApi>,
    pub freeze: Arc<dyn SignatureFreezeApi>,
    pub presence: Arc<dyn PresenceDirectory>,
    pub network: Arc<dyn PeerNetwork>,
}

/// How the pool took one received transaction.
enum Admission {
    Added,
    Known,
    Rejected,
}

pub struct ProtocolMessageHandler {
    chain: Arc<dyn BlockChain>,
    pool: Arc<dyn TransactionPoolApi>,
    inventory: Arc<dyn InventoryApi>,
    freeze: Arc<dyn SignatureFreezeApi>,
    presence: Arc<dyn PresenceDirectory>,
    network: Arc<dyn PeerNetwork>,
    config: ProtocolConfig,
}

impl ProtocolMessageHandler {
    pub fn new(config: ProtocolConfig, deps: ProtocolDependencies) -> Self {
        Self {
            chain: deps.chain,
            pool: deps.pool,
            inventory: deps.inventory,
            freeze: deps.freeze,
            presence: deps.presence,
            network: deps.network,
            config,
        }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Handles a message whose code is already known.
    pub fn handle(
        &self,
        endpoint: &EndpointId,
        code: ProtocolMessageCode,
        payload: &[u8],
    ) -> ProtocolResult<MessageOutcome> {
        if payload.len() > self.config.max_message_size {
            return Err(ProtocolError::MessageTooLarge {
                size: payload.len(),
                max: self.config.max_message_size,
            });
        }
        metrics::record_message(&code.to_string());
        trace!(%endpoint, %code, size = payload.len(), "Handling message");

        use ProtocolMessageCode as Code;
        match code {
            Code::NewTransaction | Code::TransactionData => {
                let tx = Transaction::from_bytes(payload)?;
                Ok(self.transactions_outcome(vec![tx], endpoint))
            }
            Code::TransactionsChunk => {
                let chunk = TransactionsChunk::decode(payload)?;
                self.check_items(chunk.transactions.len())?;
                Ok(self.transactions_outcome(chunk.transactions, endpoint))
            }
            Code::GetTransaction => {
                let request = TransactionRequest::decode(payload)?;
                self.on_get_transaction(&request.txid, endpoint)
            }
            Code::GetTransactions => {
                let request = TransactionsRequest::decode(payload)?;
                self.check_items(request.txids.len())?;
                self.on_get_transactions(&request.txids, endpoint)
            }
            Code::BlockData => self.on_block_data(Block::from_bytes(payload)?, endpoint),
            Code::GetBlock => self.on_get_block(BlockRequest::decode(payload)?, endpoint),
            Code::BlockSignature => {
                self.on_block_signature(SignatureMessage::decode(payload)?, endpoint)
            }
            Code::BlockSignatures | Code::SignaturesChunk => {
                self.on_signatures(SignaturesChunk::decode(payload)?, endpoint)
            }
            Code::GetBlockSignatures => {
                self.on_get_block_signatures(SignaturesRequest::decode(payload)?, endpoint)
            }
            Code::GetKeepAlives => {
                let request = KeepAlivesRequest::decode(payload)?;
                self.check_items(request.entries.len())?;
                self.on_get_keepalives(&request, endpoint)
            }
            Code::KeepAlivesChunk => {
                let chunk = KeepAlivesChunk::decode(payload)?;
                self.check_items(chunk.records.len())?;
                Ok(self.on_keepalives(chunk, endpoint))
            }
            Code::GetPresence => self.on_get_presence(PresenceRequest::decode(payload)?, endpoint),
            Code::Inventory => {
                let items = decode_inventory(payload, self.config.max_request_items)?;
                Ok(MessageOutcome::Inventory(
                    self.inventory.process_inventory(endpoint, items),
                ))
            }
        }
    }

    fn check_items(&self, count: usize) -> ProtocolResult<()> {
        if count > self.config.max_request_items {
            return Err(ProtocolError::TooManyItems {
                count,
                max: self.config.max_request_items,
            });
        }
        Ok(())
    }

    fn reply(&self, endpoint: &EndpointId, code: ProtocolMessageCode, payload: Vec<u8>) {
        metrics::record_reply(&code.to_string());
        self.network.send_data(endpoint, code, payload);
    }

    // =========================================================================
    // TRANSACTIONS
    // =========================================================================

    fn transactions_outcome(
        &self,
        transactions: Vec<Transaction>,
        endpoint: &EndpointId,
    ) -> MessageOutcome {
        let (mut added, mut known, mut rejected) = (0, 0, 0);
        for tx in transactions {
            match self.admit_transaction(tx, endpoint) {
                Admission::Added => added += 1,
                Admission::Known => known += 1,
                Admission::Rejected => rejected += 1,
            }
        }
        MessageOutcome::Transactions {
            added,
            known,
            rejected,
        }
    }

    fn admit_transaction(&self, tx: Transaction, endpoint: &EndpointId) -> Admission {
        let item = InventoryItem::Transaction { txid: tx.id.clone() };
        let txid = tx.id.clone();

        // A peer relaying our own transaction confirms its propagation.
        if let Some(confirmations) = self.pool.confirm_pending(&txid, endpoint.clone()) {
            debug!(%txid, %endpoint, confirmations, "Pending transaction relayed back");
        }
        let admission = if self.pool.has_transaction(&txid) {
            Admission::Known
        } else {
            match self.pool.add_transaction(tx, false, Some(endpoint), true) {
                Ok(()) => Admission::Added,
                Err(TxRejection::Duplicate(_)) => Admission::Known,
                Err(reason) => {
                    debug!(%txid, %endpoint, %reason, "Received transaction rejected");
                    Admission::Rejected
                }
            }
        };
        self.inventory.mark_processed(&item);
        admission
    }

    fn find_transaction(&self, txid: &TxId) -> Option<Transaction> {
        self.pool
            .get_unapplied_transaction(txid)
            .or_else(|| self.pool.get_applied_transaction(txid, 0, true))
    }

    fn on_get_transaction(
        &self,
        txid: &TxId,
        endpoint: &EndpointId,
    ) -> ProtocolResult<MessageOutcome> {
        let Some(tx) = self.find_transaction(txid) else {
            debug!(%txid, %endpoint, "Requested transaction not found");
            return Ok(MessageOutcome::NotFound);
        };
        self.reply(endpoint, ProtocolMessageCode::TransactionData, tx.to_bytes()?);
        Ok(MessageOutcome::Replied(1))
    }

    fn on_get_transactions(
        &self,
        txids: &[TxId],
        endpoint: &EndpointId,
    ) -> ProtocolResult<MessageOutcome> {
        let found: Vec<Transaction> = txids
            .iter()
            .filter_map(|txid| self.find_transaction(txid))
            .collect();
        if found.is_empty() {
            return Ok(MessageOutcome::NotFound);
        }
        self.send_transactions(found, endpoint)
            .map(MessageOutcome::Replied)
    }

    /// Sends `transactions` as `TransactionsChunk` replies; returns the
    /// number of chunks.
    fn send_transactions(
        &self,
        transactions: Vec<Transaction>,
        endpoint: &EndpointId,
    ) -> ProtocolResult<usize> {
        let mut sent = 0;
        for chunk in transactions.chunks(self.config.max_items_per_chunk.max(1)) {
            let payload = TransactionsChunk {
                transactions: chunk.to_vec(),
            }
            .encode()?;
            self.reply(endpoint, ProtocolMessageCode::TransactionsChunk, payload);
            sent += 1;
        }
        Ok(sent)
    }

    // =========================================================================
    // BLOCKS
    // =========================================================================

    fn on_block_data(&self, block: Block, endpoint: &EndpointId) -> ProtocolResult<MessageOutcome> {
        let item = InventoryItem::Block {
            hash: block.block_checksum.clone(),
            block_num: block.block_num,
        };
        let outcome = self.freeze.on_block_received(block, Some(endpoint))?;
        match outcome {
            BlockOutcome::Accepted(block_num) => {
                debug!(block_num, %endpoint, "Announcing accepted block");
                self.inventory.broadcast_inventory(
                    &[item],
                    &SIGNATURE_RELAY_NODE_TYPES,
                    Some(endpoint),
                );
            }
            BlockOutcome::Candidate { .. }
            | BlockOutcome::AwaitingTransactions { .. }
            | BlockOutcome::AlreadyStored => {
                self.inventory.mark_processed(&item);
            }
            BlockOutcome::Fork | BlockOutcome::Ahead => {}
        }
        Ok(MessageOutcome::Block(outcome))
    }

    /// Stored block `block_num`, or the candidate if it has that number.
    fn find_block(&self, block_num: u64) -> ProtocolResult<Option<Block>> {
        if let Some(block) = self.chain.get_block(block_num) {
            return Ok(Some(block));
        }
        Ok(self
            .freeze
            .local_candidate()?
            .filter(|c| c.block_num == block_num))
    }

    fn on_get_block(
        &self,
        request: BlockRequest,
        endpoint: &EndpointId,
    ) -> ProtocolResult<MessageOutcome> {
        let Some(block) = self.find_block(request.block_num)? else {
            debug!(block_num = request.block_num, %endpoint, "Requested block not found");
            return Ok(MessageOutcome::NotFound);
        };

        let mut replies = 0;
        if request.include_transactions {
            let transactions: Vec<Transaction> = block
                .transactions
                .iter()
                .filter_map(|txid| self.find_transaction(txid))
                .collect();
            if !transactions.is_empty() {
                replies += self.send_transactions(transactions, endpoint)?;
            }
        }
        self.reply(endpoint, ProtocolMessageCode::BlockData, block.to_bytes()?);
        Ok(MessageOutcome::Replied(replies + 1))
    }

    // =========================================================================
    // SIGNATURES
    // =========================================================================

    fn on_block_signature(
        &self,
        message: SignatureMessage,
        endpoint: &EndpointId,
    ) -> ProtocolResult<MessageOutcome> {
        let item = InventoryItem::BlockSignature {
            block_num: message.block_num,
            block_hash: message.block_hash.clone(),
            signer: message.signature.signer_address.clone(),
        };
        let outcome = self.freeze.on_signature_received(message, Some(endpoint))?;
        let added = matches!(outcome, SignatureOutcome::Added { .. });
        if added || outcome == SignatureOutcome::Duplicate {
            self.inventory.mark_processed(&item);
        }
        Ok(MessageOutcome::Signatures {
            added: usize::from(added),
            ignored: usize::from(!added),
        })
    }

    fn on_signatures(
        &self,
        chunk: SignaturesChunk,
        endpoint: &EndpointId,
    ) -> ProtocolResult<MessageOutcome> {
        if chunk.frozen {
            let outcome = self.freeze.on_sig_freeze(chunk, Some(endpoint))?;
            return Ok(MessageOutcome::SigFreeze(outcome));
        }

        let items: Vec<InventoryItem> = chunk
            .signatures
            .iter()
            .map(|signature| InventoryItem::BlockSignature {
                block_num: chunk.block_num,
                block_hash: chunk.block_hash.clone(),
                signer: signature.signer_address.clone(),
            })
            .collect();
        let total = items.len();
        let outcomes = self.freeze.on_signatures_chunk(chunk, Some(endpoint))?;

        let mut added = 0;
        for (item, outcome) in items.iter().zip(&outcomes) {
            match outcome {
                SignatureOutcome::Added { .. } => {
                    added += 1;
                    self.inventory.mark_processed(item);
                }
                SignatureOutcome::Duplicate => {
                    self.inventory.mark_processed(item);
                }
                _ => {}
            }
        }
        Ok(MessageOutcome::Signatures {
            added,
            ignored: total - added,
        })
    }

    fn on_get_block_signatures(
        &self,
        request: SignaturesRequest,
        endpoint: &EndpointId,
    ) -> ProtocolResult<MessageOutcome> {
        let block = self
            .find_block(request.block_num)?
            .filter(|b| b.block_checksum == request.block_hash);
        let Some(block) = block else {
            debug!(block_num = request.block_num, %endpoint, "Requested signatures not found");
            return Ok(MessageOutcome::NotFound);
        };

        let signatures = block
            .effective_signatures()
            .iter()
            .filter(|sig| {
                request.signers.is_empty() || request.signers.contains(&sig.signer_address)
            })
            .cloned()
            .collect();
        let reply = SignaturesChunk {
            block_num: block.block_num,
            block_hash: block.block_checksum.clone(),
            frozen: block.frozen_signatures.is_some(),
            signatures,
        };
        self.reply(endpoint, ProtocolMessageCode::BlockSignatures, reply.encode());
        Ok(MessageOutcome::Replied(1))
    }

    // =========================================================================
    // PRESENCE
    // =========================================================================

    fn on_get_keepalives(
        &self,
        request: &KeepAlivesRequest,
        endpoint: &EndpointId,
    ) -> ProtocolResult<MessageOutcome> {
        let records: Vec<KeepAliveRecord> = request
            .entries
            .iter()
            .filter_map(|(address, device_id)| {
                let presence = self.presence.get_presence_by_address(address)?;
                let device = presence.device(device_id)?;
                Some(KeepAliveRecord {
                    address: address.clone(),
                    device_id: device_id.clone(),
                    last_seen: device.last_seen,
                })
            })
            .collect();
        if records.is_empty() {
            return Ok(MessageOutcome::NotFound);
        }
        self.reply(
            endpoint,
            ProtocolMessageCode::KeepAlivesChunk,
            KeepAlivesChunk { records }.encode(),
        );
        Ok(MessageOutcome::Replied(1))
    }

    fn on_keepalives(&self, chunk: KeepAlivesChunk, endpoint: &EndpointId) -> MessageOutcome {
        let mut fresh = Vec::new();
        let mut ignored = 0;
        for record in chunk.records {
            let item = InventoryItem::KeepAlive {
                address: record.address.clone(),
                device_id: record.device_id.clone(),
                last_seen: record.last_seen,
            };
            if self
                .presence
                .receive_keepalive(&record.address, &record.device_id, record.last_seen)
            {
                fresh.push(item);
            } else {
                self.inventory.mark_processed(&item);
                ignored += 1;
            }
        }

        let updated = fresh.len();
        if !fresh.is_empty() {
            // Marks them processed as well.
            self.inventory
                .broadcast_inventory(&fresh, &KEEPALIVE_RELAY_NODE_TYPES, Some(endpoint));
        }
        MessageOutcome::KeepAlives { updated, ignored }
    }

    fn on_get_presence(
        &self,
        request: PresenceRequest,
        endpoint: &EndpointId,
    ) -> ProtocolResult<MessageOutcome> {
        let Some(presence) = self.presence.get_presence_by_address(&request.address) else {
            return Ok(MessageOutcome::NotFound);
        };
        let records = presence
            .addresses
            .iter()
            .map(|device| KeepAliveRecord {
                address: presence.wallet.clone(),
                device_id: device.device_id.clone(),
                last_seen: device.last_seen,
            })
            .collect();
        self.reply(
            endpoint,
            ProtocolMessageCode::KeepAlivesChunk,
            KeepAlivesChunk { records }.encode(),
        );
        Ok(MessageOutcome::Replied(1))
    }
}

impl ProtocolApi for ProtocolMessageHandler {
    fn handle_message(
        &self,
        endpoint: &EndpointId,
        code: u16,
        payload: &[u8],
    ) -> ProtocolResult<MessageOutcome> {
        let code = ProtocolMessageCode::from_u16(code).ok_or(ProtocolError::UnknownCode(code))?;
        self.handle(endpoint, code, payload)
    }

    fn on_message(&self, endpoint: &EndpointId, code: u16, payload: &[u8]) {
        match self.handle_message(endpoint, code, payload) {
            Ok(outcome) => trace!(%endpoint, code, ?outcome, "Message handled"),
            Err(e) => {
                metrics::record_dropped(e.reason());
                warn!(%endpoint, code, error = %e, "Dropped inbound message");
            }
        }
    }
}
