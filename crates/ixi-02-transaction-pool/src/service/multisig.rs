//! Multisig quorum collection and wallet changes.

use super::apply::mark_ready;
use super::TransactionPoolService;
use crate::domain::{PoolState, TxRejection};
use shared_types::{Address, Block, MultisigPayload, Transaction, TxId, WalletType};
use std::collections::HashSet;
use tracing::debug;

impl TransactionPoolService {
    /// Co-signatures (`MultisigAddTxSignature`) referencing `orig_txid`.
    ///
    /// Candidates come from `block` when given, otherwise from the whole
    /// pool. Co-signatures from signers that are not allowed, or that repeat
    /// a signer already counted (the originator included), are invalid and
    /// dropped from the pool when `remove_failed` is set.
    pub fn get_related_multisig_transactions(
        &self,
        orig_txid: &TxId,
        block: Option<&Block>,
        remove_failed: bool,
    ) -> Vec<TxId> {
        let mut state = self.state.lock();
        self.related_multisig_locked(&mut state, orig_txid, block, remove_failed)
    }

    fn related_multisig_locked(
        &self,
        state: &mut PoolState,
        orig_txid: &TxId,
        block: Option<&Block>,
        remove_failed: bool,
    ) -> Vec<TxId> {
        let Some(orig) = state.unapplied(orig_txid) else {
            return Vec::new();
        };
        let (Some(payload), Some(source)) = (orig.multisig_payload(), orig.primary_source_address())
        else {
            return Vec::new();
        };
        let wallet = self.wallets.get_wallet(&source);
        let mut seen: HashSet<Address> = HashSet::from([payload.signer().address()]);

        let candidates = match block {
            Some(block) => block.transactions.clone(),
            None => state.unapplied_ids(),
        };

        let mut related = Vec::new();
        let mut invalid = Vec::new();
        for txid in candidates {
            let Some(tx) = state.unapplied(&txid) else {
                continue;
            };
            let Some(MultisigPayload::AddTxSignature {
                orig_txid: target,
                signer,
            }) = tx.multisig_payload()
            else {
                continue;
            };
            if target != orig_txid {
                continue;
            }
            let signer_address = signer.address();
            if !wallet.is_valid_signer(&signer_address) || !seen.insert(signer_address) {
                debug!(%txid, %orig_txid, "Invalid co-signature");
                invalid.push(txid);
                continue;
            }
            related.push(txid);
        }

        if remove_failed {
            for txid in &invalid {
                state.remove_unapplied(txid);
            }
        }
        related
    }

    /// Original transaction a co-signature refers to.
    pub(super) fn original_of(&self, tx: &Transaction) -> Option<TxId> {
        match tx.multisig_payload() {
            Some(MultisigPayload::AddTxSignature { orig_txid, .. }) => Some(orig_txid.clone()),
            _ => None,
        }
    }

    /// Collects co-signatures from `block` and checks them against the
    /// source wallet's `required_sigs`.
    fn check_quorum(
        &self,
        state: &mut PoolState,
        tx: &Transaction,
        block: &Block,
        required_sigs: u8,
    ) -> Result<Vec<TxId>, TxRejection> {
        let related = self.related_multisig_locked(state, &tx.id, Some(block), false);
        let have = related.len() + 1;
        let required = usize::from(required_sigs.max(1));
        if have < required {
            return Err(TxRejection::QuorumNotMet { have, required });
        }
        Ok(related)
    }

    pub(super) fn apply_multisig_transaction(
        &self,
        state: &mut PoolState,
        tx: &Transaction,
        block: &Block,
    ) -> Result<(), TxRejection> {
        self.check_application_window(tx, block)?;
        self.check_premine_cap(tx, block.block_num)?;
        self.check_minimum_fee(tx, block.version)?;

        let source = tx
            .primary_source_address()
            .ok_or(TxRejection::MultisigInputCount)?;
        let wallet = self.wallets.get_wallet(&source);
        if !wallet.is_multisig() {
            return Err(TxRejection::WalletTypeMismatch {
                expected: WalletType::Multisig,
            });
        }
        let related = self.check_quorum(state, tx, block, wallet.required_sigs)?;

        self.debit_inputs(tx)?;
        self.credit_outputs(tx);
        self.apply_related_signatures(state, &related, block)
    }

    pub(super) fn apply_multisig_change_transaction(
        &self,
        state: &mut PoolState,
        tx: &Transaction,
        block: &Block,
    ) -> Result<(), TxRejection> {
        self.check_application_window(tx, block)?;
        self.check_premine_cap(tx, block.block_num)?;
        self.check_minimum_fee(tx, block.version)?;

        let payload = tx
            .multisig_payload()
            .ok_or(TxRejection::MultisigPayloadMismatch)?;
        let source = tx
            .primary_source_address()
            .ok_or(TxRejection::MultisigInputCount)?;
        let wallet = self.wallets.get_wallet(&source);

        let related = if wallet.is_multisig() {
            self.check_quorum(state, tx, block, wallet.required_sigs)?
        } else if matches!(payload, MultisigPayload::AddrAdd { .. }) {
            Vec::new()
        } else {
            return Err(TxRejection::WalletTypeMismatch {
                expected: WalletType::Multisig,
            });
        };

        self.debit_inputs(tx)?;

        let mut signers = wallet.allowed_signers.clone();
        let mut required = wallet.required_sigs;
        match payload {
            MultisigPayload::AddrAdd { address, .. } => {
                if wallet.is_valid_signer(address) {
                    return Err(TxRejection::SignerAlreadyPresent(address.clone()));
                }
                signers.push(address.clone());
                if !wallet.is_multisig() {
                    required = 1;
                }
            }
            MultisigPayload::AddrDel { address, .. } => {
                let position = signers
                    .iter()
                    .position(|s| s == address)
                    .ok_or_else(|| TxRejection::SignerNotPresent(address.clone()))?;
                signers.remove(position);
                let max = u8::try_from(signers.len() + 1).unwrap_or(u8::MAX);
                required = required.min(max);
            }
            MultisigPayload::ChSig { required_sigs, .. } => {
                if *required_sigs == 0 || usize::from(*required_sigs) > signers.len() + 1 {
                    return Err(TxRejection::InvalidRequiredSigs(*required_sigs));
                }
                required = *required_sigs;
            }
            MultisigPayload::TxData { .. } | MultisigPayload::AddTxSignature { .. } => {
                return Err(TxRejection::MultisigPayloadMismatch);
            }
        }

        debug!(
            wallet = %source,
            signers = signers.len() + 1,
            required,
            "Multisig wallet updated"
        );
        self.wallets
            .set_wallet_multisig(&source, WalletType::Multisig, signers, required);
        self.apply_related_signatures(state, &related, block)
    }

    /// Charges each co-signature's fee and marks it ready with its original.
    fn apply_related_signatures(
        &self,
        state: &mut PoolState,
        related: &[TxId],
        block: &Block,
    ) -> Result<(), TxRejection> {
        for txid in related {
            let Some(tx) = state.unapplied(txid).cloned() else {
                continue;
            };
            self.check_application_window(&tx, block)?;
            self.check_minimum_fee(&tx, block.version)?;
            self.debit_inputs(&tx)?;
            mark_ready(state, txid, block.block_num);
        }
        Ok(())
    }
}
