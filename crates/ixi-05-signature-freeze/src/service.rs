//! # Signature Freeze Coordinator
//!
//! Holds the local candidate for `height + 1`, accumulates its signatures and
//! commits it once it carries enough of them and its freeze checksum agrees
//! with the local signatures of block `N - 5`.
//!
//! ## Acceptance
//!
//! ```text
//! candidate(N) ── signatures >= max(min, ceil(75% of sigs(N-1)))
//!              ── N > 5: signature_freeze_checksum == checksum(sigs(N-5))
//!              ── pool.apply_transactions_from_block(N, Commit)
//!              ── chain.append_block(N)
//!              ── chain.update_frozen_signatures(N-5)
//!              ── candidate cleared
//! ```
//!
//! A mismatching freeze checksum never commits: the coordinator asks peers
//! for the signatures of `N - 5` and waits for a sigfreeze announcement that
//! reconciles them.
//!
//! ## Locking
//!
//! The candidate mutex is taken with `try_lock_for(lock_timeout_ms)`; a
//! timeout drops the request with [`FreezeError::LockTimeout`]. The pool's
//! own lock is only ever taken while the candidate lock is held, never the
//! other way round.

use crate::domain::{
    required_signatures, AcceptOutcome, BlockOutcome, BlockStage, FreezeConfig,
    SigFreezeOutcome, SignatureOutcome,
};
use crate::error::{FreezeError, FreezeResult};
use crate::metrics;
use crate::ports::SignatureFreezeApi;
use ixi_02_transaction_pool::{ApplyMode, BlockApplyError, TransactionPoolApi};
use parking_lot::{Mutex, MutexGuard};
use shared_crypto::SignatureVerifier;
use shared_types::messages::{
    BlockRequest, SignatureMessage, SignaturesChunk, SignaturesRequest, TransactionsRequest,
};
use shared_types::{
    Address, Block, BlockChain, BlockSignature, EndpointId, NodeType, PeerNetwork,
    PresenceDirectory, ProtocolMessageCode, TxId, WalletState, SIGNATURE_FREEZE_DEPTH,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Roles that receive block, signature and sync requests.
pub const SIGNATURE_RELAY_NODE_TYPES: [NodeType; 2] = [NodeType::Master, NodeType::Full];

pub struct FreezeDependencies {
    pub chain: Arc<dyn BlockChain>,
    pub pool: Arc<dyn TransactionPoolApi>,
    pub wallets: Arc<dyn WalletState>,
    pub presence: Arc<dyn PresenceDirectory>,
    pub signatures: Arc<dyn SignatureVerifier>,
    pub network: Arc<dyn PeerNetwork>,
}

pub struct SignatureFreezeCoordinator {
    chain: Arc<dyn BlockChain>,
    pool: Arc<dyn TransactionPoolApi>,
    wallets: Arc<dyn WalletState>,
    presence: Arc<dyn PresenceDirectory>,
    signatures: Arc<dyn SignatureVerifier>,
    network: Arc<dyn PeerNetwork>,
    config: FreezeConfig,
    candidate: Mutex<Option<Block>>,
}

impl SignatureFreezeCoordinator {
    pub fn new(config: FreezeConfig, deps: FreezeDependencies) -> Self {
        Self {
            chain: deps.chain,
            pool: deps.pool,
            wallets: deps.wallets,
            presence: deps.presence,
            signatures: deps.signatures,
            network: deps.network,
            config,
            candidate: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &FreezeConfig {
        &self.config
    }

    fn lock_candidate(&self) -> FreezeResult<MutexGuard<'_, Option<Block>>> {
        self.candidate
            .try_lock_for(Duration::from_millis(self.config.lock_timeout_ms))
            .ok_or_else(|| {
                metrics::record_lock_timeout();
                warn!(
                    timeout_ms = self.config.lock_timeout_ms,
                    "Candidate block lock timed out"
                );
                FreezeError::LockTimeout
            })
    }

    pub fn local_candidate(&self) -> FreezeResult<Option<Block>> {
        Ok(self.lock_candidate()?.clone())
    }

    pub fn block_stage(&self, block_num: u64) -> FreezeResult<Option<BlockStage>> {
        if self
            .lock_candidate()?
            .as_ref()
            .is_some_and(|c| c.block_num == block_num)
        {
            return Ok(Some(BlockStage::Candidate));
        }
        Ok(self.chain.get_block(block_num).map(|block| {
            if block.frozen_signatures.is_some() {
                BlockStage::Frozen
            } else {
                BlockStage::SignatureFreezing
            }
        }))
    }

    /// Signatures block `block_num` needs before it can be accepted.
    pub fn required_signatures(&self, block_num: u64) -> usize {
        let previous = block_num
            .checked_sub(1)
            .and_then(|n| self.chain.get_block(n))
            .map_or(0, |b| b.effective_signatures().len());
        required_signatures(
            previous,
            self.config.min_block_signatures,
            self.config.required_signature_percent,
        )
    }

    // =========================================================================
    // SIGNATURE CHECKS
    // =========================================================================

    /// Verifies `signature` over `block_checksum` with the embedded key or
    /// the signer's bound wallet key.
    fn verify_signature(&self, block_checksum: &[u8], signature: &BlockSignature) -> bool {
        let key = match &signature.signer_pub_key {
            Some(key) => {
                if Address::from_public_key(key, &[0]) != signature.signer_address {
                    return false;
                }
                key.clone()
            }
            None => match self.wallets.get_wallet(&signature.signer_address).public_key {
                Some(key) => key,
                None => return false,
            },
        };
        self.signatures
            .verify(&key, block_checksum, &signature.signature)
    }

    /// Presence check followed by signature verification.
    fn check_signer(
        &self,
        block_checksum: &[u8],
        signature: &BlockSignature,
    ) -> Result<(), SignatureOutcome> {
        if self
            .presence
            .get_presence_by_address(&signature.signer_address)
            .is_none()
        {
            return Err(SignatureOutcome::UnknownSigner);
        }
        if !self.verify_signature(block_checksum, signature) {
            return Err(SignatureOutcome::InvalidSignature);
        }
        Ok(())
    }

    // =========================================================================
    // BLOCKS
    // =========================================================================

    pub fn on_block_received(
        &self,
        block: Block,
        origin: Option<&EndpointId>,
    ) -> FreezeResult<BlockOutcome> {
        let block_num = block.block_num;
        if block.calculate_checksum() != block.block_checksum {
            warn!(block_num, "Received block with invalid checksum");
            return Err(FreezeError::InvalidBlockChecksum { block_num });
        }

        let height = self.chain.last_block_num();
        if block_num <= height {
            return Ok(match self.chain.get_block(block_num) {
                Some(stored) if stored.block_checksum == block.block_checksum => {
                    for signature in &block.signatures {
                        self.add_to_stored(block_num, &block.block_checksum, signature.clone());
                    }
                    BlockOutcome::AlreadyStored
                }
                _ => {
                    debug!(block_num, "Received block differs from the stored one");
                    BlockOutcome::Fork
                }
            });
        }
        if block_num > height + 1 {
            self.request_block(height + 1, origin);
            return Ok(BlockOutcome::Ahead);
        }
        if !self.extends_tip(&block) {
            debug!(block_num, "Received block does not extend the local tip");
            return Ok(BlockOutcome::Fork);
        }

        let valid: Vec<BlockSignature> = block
            .signatures
            .iter()
            .filter(|sig| self.check_signer(&block.block_checksum, sig).is_ok())
            .cloned()
            .collect();
        {
            let mut candidate = self.lock_candidate()?;
            match candidate.as_mut() {
                Some(current)
                    if current.block_num == block_num
                        && current.block_checksum == block.block_checksum =>
                {
                    for signature in valid {
                        current.add_signature(signature);
                    }
                }
                Some(current)
                    if current.block_num == block_num
                        && current.signatures.len() >= valid.len() =>
                {
                    debug!(block_num, "Keeping the better signed candidate");
                    return Ok(BlockOutcome::Candidate {
                        have: current.signatures.len(),
                        need: self.required_signatures(block_num),
                    });
                }
                _ => {
                    let mut fresh = block;
                    fresh.signatures = Vec::new();
                    fresh.frozen_signatures = None;
                    for signature in valid {
                        fresh.add_signature(signature);
                    }
                    debug!(block_num, signatures = fresh.signatures.len(), "New candidate block");
                    *candidate = Some(fresh);
                }
            }
        }

        match self.accept_local_new_block() {
            Ok(AcceptOutcome::Accepted(n)) => Ok(BlockOutcome::Accepted(n)),
            Ok(AcceptOutcome::Pending { have, need }) => Ok(BlockOutcome::Candidate { have, need }),
            Ok(AcceptOutcome::NoCandidate) => Ok(BlockOutcome::AlreadyStored),
            Err(FreezeError::Apply(BlockApplyError::MissingTransaction(_))) => {
                let missing = self.request_missing_transactions(origin)?;
                Ok(BlockOutcome::AwaitingTransactions { missing })
            }
            Err(e) => Err(e),
        }
    }

    /// Commits the candidate if it is complete.
    pub fn accept_local_new_block(&self) -> FreezeResult<AcceptOutcome> {
        let mut candidate = self.lock_candidate()?;
        let height = self.chain.last_block_num();
        let Some(block) = candidate.as_ref() else {
            return Ok(AcceptOutcome::NoCandidate);
        };
        if block.block_num != height + 1 {
            debug!(block_num = block.block_num, height, "Dropping stale candidate");
            *candidate = None;
            return Ok(AcceptOutcome::NoCandidate);
        }

        let block_num = block.block_num;
        let need = self.required_signatures(block_num);
        let have = block.signatures.len();
        if have < need {
            return Ok(AcceptOutcome::Pending { have, need });
        }

        if let Err(e) = self.commit_candidate(block) {
            metrics::record_block_rejected(e.reason());
            warn!(block_num, error = %e, "Candidate block not accepted");
            return Err(e);
        }
        *candidate = None;

        metrics::record_block_accepted();
        info!(block_num, signatures = have, "Block accepted");
        Ok(AcceptOutcome::Accepted(block_num))
    }

    fn commit_candidate(&self, block: &Block) -> FreezeResult<()> {
        if !self.extends_tip(block) {
            return Err(FreezeError::ParentMismatch {
                block_num: block.block_num,
            });
        }
        let target = self.check_freeze_checksum(block)?;
        self.prepare_staking(block);
        self.pool
            .apply_transactions_from_block(block, ApplyMode::Commit)?;

        if !self.chain.append_block(block.clone()) {
            error!(
                block_num = block.block_num,
                "Chain refused a block whose transactions were committed"
            );
            return Err(FreezeError::AppendRejected {
                block_num: block.block_num,
            });
        }
        if let Some(target) = target {
            self.chain.update_frozen_signatures(
                target.block_num,
                target.effective_signatures().to_vec(),
            );
            debug!(target = target.block_num, "Signatures frozen");
        }
        Ok(())
    }

    /// True if `block` names the stored tip as its parent.
    fn extends_tip(&self, block: &Block) -> bool {
        let tip = block
            .block_num
            .checked_sub(1)
            .and_then(|n| self.chain.get_block(n))
            .map(|b| b.block_checksum)
            .unwrap_or_default();
        block.last_block_checksum == tip
    }

    /// Returns the block whose signatures `block` freezes, after checking
    /// the declared freeze checksum against it.
    fn check_freeze_checksum(&self, block: &Block) -> FreezeResult<Option<Block>> {
        let Some(target_num) = block.freeze_target() else {
            return Ok(None);
        };
        let target = self
            .chain
            .get_block(target_num)
            .ok_or(FreezeError::FreezeTargetMissing { target: target_num })?;
        let declared = block
            .signature_freeze_checksum
            .as_deref()
            .ok_or(FreezeError::FreezeChecksumMissing {
                block_num: block.block_num,
            })?;
        if declared != target.calculate_signature_checksum().as_slice() {
            self.request_signatures(&target);
            return Err(FreezeError::FreezeChecksumMismatch {
                block_num: block.block_num,
                target: target_num,
            });
        }
        Ok(Some(target))
    }

    /// Generates and admits the staking rewards the block lists.
    fn prepare_staking(&self, block: &Block) {
        let listed = block.staking_transaction_ids();
        if listed.is_empty() {
            return;
        }
        for tx in self.pool.generate_staking_transactions(block.block_num) {
            if !listed.contains(&tx.id) || self.pool.has_transaction(&tx.id) {
                continue;
            }
            let txid = tx.id.clone();
            if let Err(reason) = self.pool.add_transaction(tx, true, None, true) {
                debug!(%txid, %reason, "Staking transaction not added");
            }
        }
    }

    // =========================================================================
    // SIGNATURES
    // =========================================================================

    pub fn on_signature_received(
        &self,
        message: SignatureMessage,
        origin: Option<&EndpointId>,
    ) -> FreezeResult<SignatureOutcome> {
        let SignatureMessage {
            block_num,
            block_hash,
            signature,
        } = message;
        let height = self.chain.last_block_num();
        if block_num.saturating_add(SIGNATURE_FREEZE_DEPTH) <= height {
            return Ok(SignatureOutcome::Stale);
        }
        if block_num > height + 1 {
            return Ok(SignatureOutcome::Future);
        }

        let outcome = if block_num == height + 1 {
            match self.add_to_candidate(block_num, &block_hash, signature.clone())? {
                Some(outcome) => outcome,
                None => {
                    self.request_block(block_num, origin);
                    return Ok(SignatureOutcome::BlockRequested);
                }
            }
        } else {
            self.add_to_stored(block_num, &block_hash, signature.clone())
        };
        if !matches!(outcome, SignatureOutcome::Added { .. }) {
            debug!(block_num, signer = %signature.signer_address, ?outcome, "Signature not added");
            return Ok(outcome);
        }

        metrics::record_signature_accepted();
        if self.config.node_type == NodeType::Master {
            let relay = SignatureMessage {
                block_num,
                block_hash,
                signature,
            };
            self.network.broadcast(
                &SIGNATURE_RELAY_NODE_TYPES,
                ProtocolMessageCode::BlockSignature,
                relay.encode(),
                origin,
            );
        }

        if block_num != height + 1 {
            return Ok(SignatureOutcome::Added { accepted: None });
        }
        let accepted = match self.accept_local_new_block() {
            Ok(AcceptOutcome::Accepted(n)) => Some(n),
            Ok(_) => None,
            Err(FreezeError::Apply(BlockApplyError::MissingTransaction(_))) => {
                self.request_missing_transactions(origin)?;
                None
            }
            Err(FreezeError::LockTimeout) => return Err(FreezeError::LockTimeout),
            Err(_) => None,
        };
        Ok(SignatureOutcome::Added { accepted })
    }

    /// `None` when there is no candidate for `block_num`.
    fn add_to_candidate(
        &self,
        block_num: u64,
        block_hash: &[u8],
        signature: BlockSignature,
    ) -> FreezeResult<Option<SignatureOutcome>> {
        let mut guard = self.lock_candidate()?;
        let Some(candidate) = guard.as_mut() else {
            return Ok(None);
        };
        if candidate.block_num != block_num {
            return Ok(None);
        }
        if candidate.block_checksum != block_hash {
            return Ok(Some(SignatureOutcome::HashMismatch));
        }
        if candidate.has_signer(&signature.signer_address) {
            return Ok(Some(SignatureOutcome::Duplicate));
        }
        if let Err(outcome) = self.check_signer(block_hash, &signature) {
            return Ok(Some(outcome));
        }
        candidate.add_signature(signature);
        Ok(Some(SignatureOutcome::Added { accepted: None }))
    }

    /// Late signature for a stored block that is not frozen yet.
    fn add_to_stored(
        &self,
        block_num: u64,
        block_hash: &[u8],
        signature: BlockSignature,
    ) -> SignatureOutcome {
        let Some(stored) = self.chain.get_block(block_num) else {
            return SignatureOutcome::Future;
        };
        if stored.block_checksum != block_hash {
            return SignatureOutcome::HashMismatch;
        }
        if stored.frozen_signatures.is_some() {
            return SignatureOutcome::Stale;
        }
        if stored.has_signer(&signature.signer_address) {
            return SignatureOutcome::Duplicate;
        }
        if let Err(outcome) = self.check_signer(block_hash, &signature) {
            return outcome;
        }
        if self.chain.add_block_signature(block_num, signature) {
            SignatureOutcome::Added { accepted: None }
        } else {
            SignatureOutcome::Duplicate
        }
    }

    /// Adds each signature of an incremental batch.
    pub fn on_signatures_chunk(
        &self,
        chunk: SignaturesChunk,
        origin: Option<&EndpointId>,
    ) -> FreezeResult<Vec<SignatureOutcome>> {
        let mut outcomes = Vec::with_capacity(chunk.signatures.len());
        for signature in chunk.signatures {
            let outcome = self.on_signature_received(
                SignatureMessage {
                    block_num: chunk.block_num,
                    block_hash: chunk.block_hash.clone(),
                    signature,
                },
                origin,
            )?;
            outcomes.push(outcome);
            if outcome == SignatureOutcome::BlockRequested {
                break;
            }
        }
        Ok(outcomes)
    }

    // =========================================================================
    // SIGFREEZE
    // =========================================================================

    /// Reconciles the local signatures of a block with an announced frozen set.
    pub fn on_sig_freeze(
        &self,
        chunk: SignaturesChunk,
        origin: Option<&EndpointId>,
    ) -> FreezeResult<SigFreezeOutcome> {
        let Some(target) = self.chain.get_block(chunk.block_num) else {
            let next = self.chain.last_block_num() + 1;
            self.request_block(chunk.block_num.min(next), origin);
            return Ok(SigFreezeOutcome::Requested);
        };
        if target.block_checksum != chunk.block_hash {
            debug!(block_num = chunk.block_num, "Sigfreeze for a block on another fork");
            return Ok(SigFreezeOutcome::Fork);
        }

        let mut announced = target.clone();
        announced.frozen_signatures = Some(chunk.signatures);
        if announced.calculate_signature_checksum() == target.calculate_signature_checksum() {
            return Ok(SigFreezeOutcome::Unchanged);
        }
        self.handle_sig_freezed_block(announced)
    }

    /// Replaces the frozen signatures of `announced.block_num` if the block
    /// freezing it declares a matching checksum.
    pub fn handle_sig_freezed_block(&self, announced: Block) -> FreezeResult<SigFreezeOutcome> {
        let Some(freezing_num) = announced.block_num.checked_add(SIGNATURE_FREEZE_DEPTH) else {
            return Ok(SigFreezeOutcome::Unverifiable);
        };
        let (declared, freezes_candidate) = match self.chain.get_block(freezing_num) {
            Some(freezing) => (freezing.signature_freeze_checksum, false),
            None => {
                let candidate = self.lock_candidate()?;
                let declared = candidate
                    .as_ref()
                    .filter(|c| c.block_num == freezing_num)
                    .and_then(|c| c.signature_freeze_checksum.clone());
                (declared, true)
            }
        };
        let Some(declared) = declared else {
            return Ok(SigFreezeOutcome::Unverifiable);
        };
        if declared != announced.calculate_signature_checksum() {
            warn!(
                block_num = announced.block_num,
                "Announced frozen signatures do not match the declared checksum"
            );
            return Ok(SigFreezeOutcome::Rejected);
        }

        let signatures = announced.effective_signatures().to_vec();
        if signatures
            .iter()
            .any(|sig| !self.verify_signature(&announced.block_checksum, sig))
        {
            warn!(block_num = announced.block_num, "Announced frozen set has an invalid signature");
            return Ok(SigFreezeOutcome::Rejected);
        }
        if !self
            .chain
            .update_frozen_signatures(announced.block_num, signatures)
        {
            return Ok(SigFreezeOutcome::Unverifiable);
        }
        metrics::record_sigfreeze_update();
        info!(block_num = announced.block_num, "Frozen signatures replaced");

        if freezes_candidate {
            if let Err(e) = self.accept_local_new_block() {
                debug!(error = %e, "Candidate still not accepted after sigfreeze");
            }
        }
        Ok(SigFreezeOutcome::Updated)
    }

    // =========================================================================
    // LOOKUPS
    // =========================================================================

    /// Checksum of the candidate or stored block `block_num`.
    pub fn local_block_checksum(&self, block_num: u64) -> Option<Vec<u8>> {
        if let Ok(candidate) = self.lock_candidate() {
            if let Some(c) = candidate.as_ref().filter(|c| c.block_num == block_num) {
                return Some(c.block_checksum.clone());
            }
        }
        self.chain.get_block(block_num).map(|b| b.block_checksum)
    }

    pub fn has_local_signature(&self, block_num: u64, block_hash: &[u8], signer: &Address) -> bool {
        if let Ok(candidate) = self.lock_candidate() {
            if let Some(c) = candidate.as_ref().filter(|c| c.block_num == block_num) {
                return c.block_checksum == block_hash && c.has_signer(signer);
            }
        }
        self.chain.get_block(block_num).is_some_and(|b| {
            b.block_checksum == block_hash
                && b.effective_signatures()
                    .iter()
                    .any(|sig| &sig.signer_address == signer)
        })
    }

    // =========================================================================
    // REQUESTS
    // =========================================================================

    fn send_or_broadcast(
        &self,
        code: ProtocolMessageCode,
        payload: Vec<u8>,
        origin: Option<&EndpointId>,
    ) {
        match origin {
            Some(endpoint) => {
                self.network.send_data(endpoint, code, payload);
            }
            None => {
                self.network
                    .broadcast(&SIGNATURE_RELAY_NODE_TYPES, code, payload, None);
            }
        }
    }

    fn request_block(&self, block_num: u64, origin: Option<&EndpointId>) {
        debug!(block_num, "Requesting block");
        let request = BlockRequest {
            block_num,
            include_transactions: true,
        };
        self.send_or_broadcast(ProtocolMessageCode::GetBlock, request.encode(), origin);
    }

    fn request_signatures(&self, target: &Block) {
        debug!(block_num = target.block_num, "Requesting block signatures");
        let request = SignaturesRequest {
            block_num: target.block_num,
            block_hash: target.block_checksum.clone(),
            signers: Vec::new(),
        };
        self.send_or_broadcast(
            ProtocolMessageCode::GetBlockSignatures,
            request.encode(),
            None,
        );
    }

    /// Requests the candidate's transactions missing from the pool.
    fn request_missing_transactions(&self, origin: Option<&EndpointId>) -> FreezeResult<usize> {
        let missing: Vec<TxId> = match self.lock_candidate()?.as_ref() {
            Some(candidate) => candidate
                .transactions
                .iter()
                .filter(|txid| !txid.is_staking() && !self.pool.has_transaction(txid))
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        if !missing.is_empty() {
            debug!(count = missing.len(), "Requesting candidate transactions");
            let request = TransactionsRequest {
                txids: missing.clone(),
            };
            self.send_or_broadcast(ProtocolMessageCode::GetTransactions, request.encode(), origin);
        }
        Ok(missing.len())
    }
}

impl SignatureFreezeApi for SignatureFreezeCoordinator {
    fn on_block_received(
        &self,
        block: Block,
        origin: Option<&EndpointId>,
    ) -> FreezeResult<BlockOutcome> {
        SignatureFreezeCoordinator::on_block_received(self, block, origin)
    }

    fn on_signature_received(
        &self,
        message: SignatureMessage,
        origin: Option<&EndpointId>,
    ) -> FreezeResult<SignatureOutcome> {
        SignatureFreezeCoordinator::on_signature_received(self, message, origin)
    }

    fn on_signatures_chunk(
        &self,
        chunk: SignaturesChunk,
        origin: Option<&EndpointId>,
    ) -> FreezeResult<Vec<SignatureOutcome>> {
        SignatureFreezeCoordinator::on_signatures_chunk(self, chunk, origin)
    }

    fn on_sig_freeze(
        &self,
        chunk: SignaturesChunk,
        origin: Option<&EndpointId>,
    ) -> FreezeResult<SigFreezeOutcome> {
        SignatureFreezeCoordinator::on_sig_freeze(self, chunk, origin)
    }

    fn accept_local_new_block(&self) -> FreezeResult<AcceptOutcome> {
        SignatureFreezeCoordinator::accept_local_new_block(self)
    }

    fn local_candidate(&self) -> FreezeResult<Option<Block>> {
        SignatureFreezeCoordinator::local_candidate(self)
    }
}
