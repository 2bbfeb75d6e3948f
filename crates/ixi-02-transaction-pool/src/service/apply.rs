//! Block application.
//!
//! ```text
//! apply_transactions_from_block(block, mode)
//!   │ lock pool ─► begin wallet bracket
//!   ├─ staking rewards (block's stk- ids must equal the pool's)
//!   ├─ each remaining txid in block order
//!   │     genesis │ bind key (v3+) │ PoW │ zero guard │ bind key (<v3)
//!   │     │ multisig │ multisig change │ normal transfer
//!   ├─ miner rewards per solved target
//!   ├─ every txid must be ReadyToApply(block_num)
//!   └─ Commit: commit bracket, stamp pow_fields, move to applied
//!      Verify / failure: revert bracket, clear ready marks
//! ```

use super::TransactionPoolService;
use crate::domain::{
    calculate_mining_reward_for_block, ApplyMode, BlockApplyError, PoolState, TxRejection,
    LAST_REWARD_BLOCK,
};
use crate::metrics;
use shared_types::{
    encode_varint, Address, Amount, Block, Transaction, TransactionPayload, TransactionType,
    TxId, TxStatus, STAKING_TARGET_DEPTH,
};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, error, info, warn};

/// Target block → solver → first accepted nonce.
pub(super) type MinerSolutions = BTreeMap<u64, BTreeMap<Address, Vec<u8>>>;

pub(super) struct ApplyContext<'a> {
    pub block: &'a Block,
    pub failed: Vec<(TxId, TxRejection)>,
    pub miners: MinerSolutions,
}

impl<'a> ApplyContext<'a> {
    fn new(block: &'a Block) -> Self {
        Self {
            block,
            failed: Vec::new(),
            miners: BTreeMap::new(),
        }
    }

    fn fail(&mut self, txid: &TxId, reason: TxRejection) {
        debug!(%txid, %reason, block_num = self.block.block_num, "Transaction failed to apply");
        self.failed.push((txid.clone(), reason));
    }

    fn has_failed(&self, txid: &TxId) -> bool {
        self.failed.iter().any(|(id, _)| id == txid)
    }
}

/// What `apply_transaction` did with a transaction.
enum ApplyOutcome {
    Ready,
    /// Co-signature handled together with its original.
    Deferred,
}

impl TransactionPoolService {
    /// Applies every transaction of `block` atomically against wallet state.
    pub fn apply_transactions_from_block(
        &self,
        block: &Block,
        mode: ApplyMode,
    ) -> Result<(), BlockApplyError> {
        let mut state = self.state.lock();
        let result = self.apply_block_locked(&mut state, block, mode);
        match &result {
            Ok(()) => {
                metrics::record_block_applied();
                info!(
                    block_num = block.block_num,
                    transactions = block.transactions.len(),
                    ?mode,
                    "Block transactions applied"
                );
            }
            Err(e) => {
                metrics::record_block_rejected(e.reason());
                warn!(
                    block_num = block.block_num,
                    ?mode,
                    error = %e,
                    "Block transactions rejected"
                );
            }
        }
        result
    }

    fn apply_block_locked(
        &self,
        state: &mut PoolState,
        block: &Block,
        mode: ApplyMode,
    ) -> Result<(), BlockApplyError> {
        if !self.wallets.begin_transaction(block.block_num) {
            return Err(BlockApplyError::WalletBracketBusy);
        }

        let mut ctx = ApplyContext::new(block);
        let body = self.apply_block_body(state, &mut ctx);

        for (txid, reason) in &ctx.failed {
            if state.remove_unapplied(txid).is_some() {
                warn!(
                    %txid,
                    %reason,
                    block_num = block.block_num,
                    "Removed failed transaction from pool"
                );
            }
            self.pending.lock().remove(txid);
        }

        let outcome = body.and_then(|solved| match ctx.failed.first() {
            Some((first, reason)) => Err(BlockApplyError::TransactionsFailed {
                count: ctx.failed.len(),
                first: first.clone(),
                reason: reason.clone(),
            }),
            None => Ok(solved),
        });

        match (outcome, mode) {
            (Ok(solved), ApplyMode::Commit) => {
                self.wallets.commit_transaction();
                let pow_field = encode_varint(block.block_num);
                for target in solved {
                    if !self.chain.set_block_pow_field(target, pow_field.clone()) {
                        error!(target, "Failed to stamp pow field on solved block");
                    }
                }
                for txid in &block.transactions {
                    if let Err(e) = self.set_applied_flag_locked(state, txid, block.block_num, true)
                    {
                        error!(%txid, error = %e, "Failed to mark transaction applied");
                    }
                }
                Ok(())
            }
            (Ok(_), ApplyMode::Verify) => {
                self.wallets.revert_transaction();
                state.clear_ready_marks(block.block_num);
                Ok(())
            }
            (Err(e), _) => {
                self.wallets.revert_transaction();
                state.clear_ready_marks(block.block_num);
                Err(e)
            }
        }
    }

    /// Returns the PoW targets rewarded by this block.
    fn apply_block_body(
        &self,
        state: &mut PoolState,
        ctx: &mut ApplyContext<'_>,
    ) -> Result<Vec<u64>, BlockApplyError> {
        let block = ctx.block;
        self.apply_staking_transactions(state, ctx)?;
        if !ctx.failed.is_empty() {
            return Ok(Vec::new());
        }

        for txid in &block.transactions {
            if txid.is_staking() {
                continue;
            }
            let Some(tx) = state.unapplied(txid).cloned() else {
                error!(
                    %txid,
                    block_num = block.block_num,
                    "Block references a transaction missing from the pool"
                );
                return Err(BlockApplyError::MissingTransaction(txid.clone()));
            };
            if tx.status.is_ready_for(block.block_num) {
                continue;
            }
            match self.apply_transaction(state, ctx, &tx) {
                Ok(ApplyOutcome::Ready) => mark_ready(state, txid, block.block_num),
                Ok(ApplyOutcome::Deferred) => {}
                Err(reason) => ctx.fail(txid, reason),
            }
        }

        let solved = self.reward_miners(&ctx.miners)?;
        if !ctx.failed.is_empty() {
            return Ok(solved);
        }

        for txid in &block.transactions {
            let ready = state
                .unapplied(txid)
                .is_some_and(|tx| tx.status.is_ready_for(block.block_num));
            if !ready && !ctx.has_failed(txid) {
                return Err(BlockApplyError::NotReady(txid.clone()));
            }
        }
        Ok(solved)
    }

    fn apply_transaction(
        &self,
        state: &mut PoolState,
        ctx: &mut ApplyContext<'_>,
        tx: &Transaction,
    ) -> Result<ApplyOutcome, TxRejection> {
        let block = ctx.block;
        match tx.tx_type {
            TransactionType::Genesis => {
                self.apply_genesis_transaction(tx, block)?;
                return Ok(ApplyOutcome::Ready);
            }
            TransactionType::StakingReward => return Err(TxRejection::UnexpectedType),
            _ => {}
        }

        if block.version >= 3 {
            self.bind_public_key(tx);
        }
        if tx.tx_type == TransactionType::PoWSolution {
            self.apply_pow_transaction(tx, &mut ctx.miners)?;
            return Ok(ApplyOutcome::Ready);
        }
        if tx.amount.is_zero() && !tx.tx_type.allows_zero_amount() {
            return Err(TxRejection::ZeroAmount);
        }
        if block.version < 3 {
            self.bind_public_key(tx);
        }

        match tx.tx_type {
            TransactionType::MultisigTX => {
                self.apply_multisig_transaction(state, tx, block)?;
                Ok(ApplyOutcome::Ready)
            }
            TransactionType::ChangeMultisigWallet => {
                self.apply_multisig_change_transaction(state, tx, block)?;
                Ok(ApplyOutcome::Ready)
            }
            TransactionType::MultisigAddTxSignature => {
                match self.original_of(tx) {
                    Some(orig) if block.transactions.contains(&orig) => Ok(ApplyOutcome::Deferred),
                    Some(orig) => Err(TxRejection::MissingOriginal(orig)),
                    None => Err(TxRejection::MultisigPayloadMismatch),
                }
            }
            _ => {
                self.apply_normal_transaction(tx, block)?;
                Ok(ApplyOutcome::Ready)
            }
        }
    }

    fn apply_genesis_transaction(
        &self,
        tx: &Transaction,
        block: &Block,
    ) -> Result<(), TxRejection> {
        if block.block_num != 1 {
            return Err(TxRejection::GenesisOutsideFirstBlock);
        }
        self.credit_outputs(tx);
        Ok(())
    }

    fn apply_normal_transaction(&self, tx: &Transaction, block: &Block) -> Result<(), TxRejection> {
        self.check_application_window(tx, block)?;
        self.check_premine_cap(tx, block.block_num)?;
        self.check_minimum_fee(tx, block.version)?;
        self.debit_inputs(tx)?;
        self.credit_outputs(tx);
        Ok(())
    }

    /// Binds the sender key to its input wallets on first spend.
    fn bind_public_key(&self, tx: &Transaction) {
        if tx.tx_type.is_multisig()
            || tx.tx_type.is_minted()
            || Address::validate_checksum(&tx.pub_key)
        {
            return;
        }
        for (address, _) in tx.input_addresses() {
            if self.wallets.get_wallet(&address).public_key.is_none() {
                self.wallets.set_wallet_public_key(&address, tx.pub_key.clone());
            }
        }
    }

    // === BALANCES ===

    pub(super) fn debit_inputs(&self, tx: &Transaction) -> Result<(), TxRejection> {
        for (address, amount) in tx.input_addresses() {
            let wallet = self.wallets.get_wallet(&address);
            let balance = &wallet.balance - &amount;
            if balance.is_negative() {
                return Err(TxRejection::InsufficientFunds {
                    address,
                    balance: wallet.balance,
                    required: amount,
                });
            }
            self.wallets.set_wallet_balance(&address, balance);
        }
        Ok(())
    }

    pub(super) fn credit_outputs(&self, tx: &Transaction) {
        for (address, amount) in &tx.to_list {
            self.credit(address, amount);
        }
    }

    fn credit(&self, address: &Address, amount: &Amount) {
        let wallet = self.wallets.get_wallet(address);
        self.wallets
            .set_wallet_balance(address, &wallet.balance + amount);
    }

    // === POW ===

    fn apply_pow_transaction(
        &self,
        tx: &Transaction,
        miners: &mut MinerSolutions,
    ) -> Result<(), TxRejection> {
        let check_nonce = !tx.from_local_storage && !tx.pow_verified;
        self.verify_pow_transaction(tx, check_nonce)?;
        let (target, nonce) = tx.pow_solution().ok_or(TxRejection::PowInvalidPayload)?;
        let solver = tx
            .primary_source_address()
            .ok_or(TxRejection::PowInvalidPayload)?;

        self.debit_inputs(tx)?;
        miners
            .entry(target)
            .or_default()
            .entry(solver)
            .or_insert_with(|| nonce.to_vec());
        Ok(())
    }

    /// Splits each target's reward evenly between its distinct solvers.
    ///
    /// Returns the targets to stamp once the block commits.
    pub(super) fn reward_miners(
        &self,
        miners: &MinerSolutions,
    ) -> Result<Vec<u64>, BlockApplyError> {
        let mut solved = Vec::with_capacity(miners.len());
        for (target, solvers) in miners {
            if solvers.is_empty() {
                continue;
            }
            if self.chain.get_block(*target).is_none() {
                return Err(BlockApplyError::MinerRewardTarget(*target));
            }
            if *target <= LAST_REWARD_BLOCK {
                let reward = calculate_mining_reward_for_block(*target);
                let share = reward.div_floor_u64(solvers.len() as u64);
                for solver in solvers.keys() {
                    self.credit(solver, &share);
                }
                debug!(target, solvers = solvers.len(), %share, "Rewarded PoW solvers");
            }
            solved.push(*target);
        }
        Ok(solved)
    }

    // === STAKING ===

    fn apply_staking_transactions(
        &self,
        state: &mut PoolState,
        ctx: &mut ApplyContext<'_>,
    ) -> Result<(), BlockApplyError> {
        let block = ctx.block;
        let block_ids = block.staking_transaction_ids();
        for txid in &block_ids {
            if !state.contains_unapplied(txid) {
                return Err(BlockApplyError::MissingTransaction(txid.clone()));
            }
        }

        let in_block: BTreeSet<&TxId> = block_ids.iter().collect();
        let pool_bound: BTreeSet<TxId> = state
            .unapplied_sorted()
            .into_iter()
            .filter(|tx| {
                tx.tx_type == TransactionType::StakingReward && tx.block_height == block.block_num
            })
            .map(|tx| tx.id.clone())
            .collect();
        if pool_bound.iter().collect::<BTreeSet<_>>() != in_block {
            return Err(BlockApplyError::StakingSetMismatch);
        }
        if block_ids.is_empty() {
            return Ok(());
        }

        let target = block
            .block_num
            .checked_sub(STAKING_TARGET_DEPTH)
            .filter(|n| *n > 0);
        let signers: Option<HashSet<Address>> = target
            .and_then(|n| self.chain.get_block(n))
            .map(|b| b.get_signatures_wallet_addresses().into_iter().collect());

        let mut stakers = HashSet::new();
        for txid in &block_ids {
            let Some(tx) = state.unapplied(txid).cloned() else {
                continue;
            };
            match self.apply_staking_transaction(&tx, target, signers.as_ref(), &mut stakers) {
                Ok(()) => mark_ready(state, txid, block.block_num),
                Err(reason) => ctx.fail(txid, reason),
            }
        }
        Ok(())
    }

    fn apply_staking_transaction(
        &self,
        tx: &Transaction,
        target: Option<u64>,
        signers: Option<&HashSet<Address>>,
        stakers: &mut HashSet<Address>,
    ) -> Result<(), TxRejection> {
        if tx.tx_type != TransactionType::StakingReward {
            return Err(TxRejection::UnexpectedType);
        }
        let expected = target.unwrap_or(0);
        match (&tx.data, target) {
            (TransactionPayload::Staking { target_block }, Some(t)) if *target_block == t => {}
            _ => return Err(TxRejection::StakingTargetMismatch { expected }),
        }
        if tx.to_list.len() != 1 {
            return Err(TxRejection::UnexpectedType);
        }
        let Some((recipient, amount)) = tx.to_list.iter().next() else {
            return Err(TxRejection::UnexpectedType);
        };
        if amount.is_negative() {
            return Err(TxRejection::NegativeAmount);
        }
        if amount.is_zero() {
            return Err(TxRejection::ZeroAmount);
        }
        let signers = signers.ok_or(TxRejection::UnknownBlock(expected))?;
        if !signers.contains(recipient) {
            return Err(TxRejection::StakingRecipientNotSigner(recipient.clone()));
        }
        if !stakers.insert(recipient.clone()) {
            return Err(TxRejection::DuplicateStaker(recipient.clone()));
        }
        self.credit(recipient, amount);
        Ok(())
    }
}

pub(super) fn mark_ready(state: &mut PoolState, txid: &TxId, block_num: u64) {
    if let Some(tx) = state.unapplied_mut(txid) {
        tx.status = TxStatus::ReadyToApply(block_num);
    }
}
