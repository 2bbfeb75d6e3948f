//! Periodic maintenance: cleanup, pending re-broadcast, staking generation.

use super::{TransactionPoolService, TX_RELAY_NODE_TYPES};
use crate::domain::staking::staking_reward_for_supply;
use crate::domain::{
    distribute_staking_reward, max_tx_version, CleanupReport, PendingAction, PendingReport,
};
use crate::metrics;
use shared_types::{
    messages::TransactionRequest, Address, Amount, EndpointId, ProtocolMessageCode, Transaction,
    TransactionBuilder, TransactionPayload, TransactionType, TxId, STAKING_TARGET_DEPTH,
};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

impl TransactionPoolService {
    /// Drops stale PoW solutions and expired transactions, then redacts
    /// applied entries that fell out of the window.
    pub fn perform_cleanup(&self) -> CleanupReport {
        let height = self.chain.last_block_num();
        let min_block = height.saturating_sub(self.config.redacted_window_size);

        let mut state = self.state.lock();
        let stale = state.drain_unapplied_where(|tx| {
            if tx.tx_type != TransactionType::PoWSolution {
                return false;
            }
            match tx.pow_solution() {
                Some((target, _)) => self
                    .chain
                    .get_block(target)
                    .map_or(true, |block| block.pow_field.is_some()),
                None => true,
            }
        });
        let expired = if min_block > 0 {
            state.drain_unapplied_where(|tx| tx.block_height < min_block)
        } else {
            Vec::new()
        };
        let redacted = if min_block > 0 {
            state.redact_below(min_block)
        } else {
            0
        };

        let mut pending = self.pending.lock();
        for txid in stale.iter().chain(expired.iter()) {
            pending.remove(txid);
        }

        let report = CleanupReport {
            stale_pow_solutions: stale.len(),
            expired: expired.len(),
            redacted,
        };
        if report != CleanupReport::default() {
            info!(
                stale_pow_solutions = report.stale_pow_solutions,
                expired = report.expired,
                redacted = report.redacted,
                "Transaction pool cleanup"
            );
        }
        report
    }

    /// Re-broadcasts or inquires about unconfirmed local transactions.
    pub fn process_pending_transactions(&self) -> PendingReport {
        let now = self.time.now();
        let height = self.chain.last_block_num();
        let min_block = height.saturating_sub(self.config.redacted_window_size);
        let mut report = PendingReport::default();

        let ids = self.pending.lock().ids();
        for txid in ids {
            let tx = self.state.lock().unapplied(&txid).cloned();
            let keep = match &tx {
                Some(tx) => {
                    tx.block_height >= min_block && self.check_transaction(tx, false).is_ok()
                }
                None => false,
            };
            let Some(tx) = tx.filter(|_| keep) else {
                self.pending.lock().remove(&txid);
                report.dropped += 1;
                debug!(%txid, "Dropped pending transaction");
                continue;
            };

            let action = self.pending.lock().next_action(
                &txid,
                now,
                self.config.pending_rebroadcast_ms,
                self.config.pending_inquiry_ms,
                self.config.pending_confirmations,
            );
            match action {
                PendingAction::Rebroadcast => {
                    self.broadcast_transaction(&tx, None);
                    metrics::record_pending_rebroadcast();
                    report.rebroadcast += 1;
                }
                PendingAction::Inquire => {
                    self.network.broadcast(
                        &TX_RELAY_NODE_TYPES,
                        ProtocolMessageCode::GetTransaction,
                        TransactionRequest { txid: txid.clone() }.encode(),
                        None,
                    );
                    report.inquiries += 1;
                }
                PendingAction::Wait => {}
            }
        }
        report
    }

    /// Records that `endpoint` has the transaction. Returns the confirmation
    /// count, or `None` if the transaction is not pending.
    pub fn confirm_pending(&self, txid: &TxId, endpoint: EndpointId) -> Option<usize> {
        self.pending.lock().confirm(txid, endpoint)
    }

    /// Builds the staking reward transactions for block `block_num`.
    ///
    /// Eligible stakers are the signers of block `block_num - 6`; the reward
    /// is split by their current balances.
    pub fn generate_staking_transactions(&self, block_num: u64) -> Vec<Transaction> {
        let Some(target) = block_num
            .checked_sub(STAKING_TARGET_DEPTH)
            .filter(|n| *n > 0)
        else {
            return Vec::new();
        };
        let Some(target_block) = self.chain.get_block(target) else {
            warn!(block_num, target, "Staking target block not found");
            return Vec::new();
        };

        let signers: BTreeSet<Address> = target_block
            .get_signatures_wallet_addresses()
            .into_iter()
            .collect();
        let stakers: Vec<(Address, Amount)> = signers
            .into_iter()
            .map(|address| {
                let balance = self.wallets.get_wallet(&address).balance;
                (address, balance)
            })
            .collect();

        let total = staking_reward_for_supply(
            &self.wallets.total_supply(),
            self.config.staking_inflation_ppm,
            self.config.blocks_per_year,
        );
        let version = max_tx_version(self.chain.last_block_version());

        distribute_staking_reward(&total, &stakers)
            .into_iter()
            .map(|(address, share)| {
                TransactionBuilder::new(TransactionType::StakingReward, version)
                    .to(address, share)
                    .block_height(block_num)
                    .payload(TransactionPayload::Staking {
                        target_block: target,
                    })
                    .build()
            })
            .collect()
    }
}
