//! Stateless and state-dependent transaction checks.
//!
//! Order of checks (first failure wins):
//!
//! ```text
//!  1. chain state (genesis / bootstrap window)    8. source wallet type
//!  2. version band                                9. overspend
//!  3. block height window                        10. outputs
//!  4. amount / fee sign                          11. PoW solution
//!  5. multisig shape                             12. minimum fee
//!  6. checksums                                  13. signature
//!  7. inputs (nonces, sum = amount + fee)        14. premine floor
//! ```

use super::TransactionPoolService;
use crate::domain::{
    allowed_tx_versions, calculate_minimum_fee, premine_floor, TxRejection, BOOTSTRAP_BLOCKS,
    FUTURE_BLOCK_MARGIN, MAX_NONCE_LEN, MAX_PUBLIC_KEY_LEN, MIN_PUBLIC_KEY_LEN, POW_DEPTH_MARGIN,
};
use shared_crypto::PowAlgorithm;
use shared_types::{
    Address, Block, EndpointId, MultisigPayload, Transaction, TransactionType, WalletType,
};
use tracing::warn;

impl TransactionPoolService {
    /// Full validation against the current chain and wallet state.
    ///
    /// `full_check == false` skips signature and PoW nonce verification.
    pub fn verify_transaction(
        &self,
        tx: &Transaction,
        origin: Option<&EndpointId>,
        full_check: bool,
    ) -> Result<(), TxRejection> {
        let result = self.check_transaction(tx, full_check);
        if let Err(reason) = &result {
            warn!(txid = %tx.id, origin = ?origin, %reason, "Transaction failed verification");
        }
        result
    }

    pub(super) fn check_transaction(
        &self,
        tx: &Transaction,
        full_check: bool,
    ) -> Result<(), TxRejection> {
        let height = self.chain.last_block_num();
        let block_version = self.chain.last_block_version();

        if tx.tx_type == TransactionType::Genesis {
            if height != 0 || tx.block_height != 1 {
                return Err(TxRejection::GenesisOutsideFirstBlock);
            }
        } else if height < 1 {
            return Err(TxRejection::ChainNotStarted);
        }
        if (1..BOOTSTRAP_BLOCKS).contains(&height)
            && !matches!(
                tx.tx_type,
                TransactionType::Genesis | TransactionType::StakingReward
            )
        {
            return Err(TxRejection::BootstrapWindow { height });
        }

        if !allowed_tx_versions(block_version).contains(&tx.version) {
            return Err(TxRejection::UnsupportedVersion {
                version: tx.version,
                block_version,
            });
        }

        if tx.tx_type != TransactionType::Genesis {
            let highest = self.chain.highest_network_block_num().max(height);
            self.check_block_height(tx, height, highest)?;
        }

        check_amounts(tx)?;
        check_multisig_shape(tx)?;

        if !tx.verify_checksums() {
            return Err(if tx.calculate_data_checksum() != tx.data_checksum {
                TxRejection::DataChecksumMismatch
            } else {
                TxRejection::ChecksumMismatch
            });
        }

        check_inputs(tx)?;
        self.check_source_wallet(tx)?;

        let minted = tx.tx_type.is_minted();
        if !minted && tx.tx_type != TransactionType::PoWSolution && !self.chain.is_synchronizing()
        {
            self.check_balances(tx)?;
        }

        check_outputs(tx)?;

        if tx.tx_type == TransactionType::PoWSolution {
            let check_nonce = full_check && !tx.from_local_storage && !tx.pow_verified;
            self.verify_pow_transaction(tx, check_nonce)?;
        }

        self.check_minimum_fee(tx, block_version)?;

        if !minted {
            self.verify_signature(tx, full_check)?;
        }

        self.check_premine_cap(tx, height + 1)
    }

    /// Window `[height - window, max(height, highest) + margin]`.
    fn check_block_height(
        &self,
        tx: &Transaction,
        height: u64,
        highest: u64,
    ) -> Result<(), TxRejection> {
        if tx.block_height == 0 {
            return Err(TxRejection::ZeroBlockHeight);
        }
        let min = height.saturating_sub(self.config.redacted_window_size);
        let max = highest.max(height) + FUTURE_BLOCK_MARGIN;
        if tx.block_height < min || tx.block_height > max {
            return Err(TxRejection::BlockHeightOutOfWindow {
                block_height: tx.block_height,
                min,
                max,
            });
        }
        Ok(())
    }

    /// Same window, evaluated against the block being applied.
    pub(super) fn check_application_window(
        &self,
        tx: &Transaction,
        block: &Block,
    ) -> Result<(), TxRejection> {
        self.check_block_height(tx, block.block_num, block.block_num)
    }

    fn check_source_wallet(&self, tx: &Transaction) -> Result<(), TxRejection> {
        if tx.tx_type.is_minted() {
            return Ok(());
        }
        let source = tx
            .primary_source_address()
            .ok_or(TxRejection::InvalidNonce { len: 0 })?;
        let wallet = self.wallets.get_wallet(&source);

        let expected = match tx.multisig_payload() {
            // A normal wallet becomes multisig through its first AddrAdd.
            Some(MultisigPayload::AddrAdd { .. }) if !wallet.is_multisig() => WalletType::Normal,
            Some(_) => WalletType::Multisig,
            None => WalletType::Normal,
        };
        if wallet.wallet_type != expected {
            return Err(TxRejection::WalletTypeMismatch { expected });
        }
        Ok(())
    }

    fn check_balances(&self, tx: &Transaction) -> Result<(), TxRejection> {
        for (address, amount) in tx.input_addresses() {
            let wallet = self.wallets.get_wallet(&address);
            if wallet.balance < amount {
                return Err(TxRejection::InsufficientFunds {
                    address,
                    balance: wallet.balance,
                    required: amount,
                });
            }
        }
        Ok(())
    }

    pub(super) fn check_minimum_fee(
        &self,
        tx: &Transaction,
        block_version: u32,
    ) -> Result<(), TxRejection> {
        if tx.tx_type.is_minted() || tx.tx_type == TransactionType::PoWSolution {
            return Ok(());
        }
        let minimum = calculate_minimum_fee(tx, block_version, &self.config.price_per_kb);
        if tx.fee < minimum {
            return Err(TxRejection::FeeTooLow {
                fee: tx.fee.clone(),
                minimum,
            });
        }
        Ok(())
    }

    /// Premine wallets may not spend below the floor in force at `block_num`.
    pub(super) fn check_premine_cap(
        &self,
        tx: &Transaction,
        block_num: u64,
    ) -> Result<(), TxRejection> {
        if tx.tx_type.is_minted() || self.config.premine_addresses.is_empty() {
            return Ok(());
        }
        let Some(floor) = premine_floor(block_num) else {
            return Ok(());
        };
        for (address, amount) in tx.input_addresses() {
            if !self.config.premine_addresses.contains(&address) {
                continue;
            }
            let balance = self.wallets.get_wallet(&address).balance;
            if &balance - &amount < floor {
                return Err(TxRejection::PremineCapExceeded { address, floor });
            }
        }
        Ok(())
    }

    // === SIGNATURES ===

    fn verify_signature(&self, tx: &Transaction, full_check: bool) -> Result<(), TxRejection> {
        let signing_key = self.resolve_signing_key(tx)?;
        if !(MIN_PUBLIC_KEY_LEN..=MAX_PUBLIC_KEY_LEN).contains(&signing_key.len()) {
            return Err(TxRejection::InvalidPublicKey {
                len: signing_key.len(),
            });
        }

        if !tx.tx_type.is_multisig() {
            for nonce in tx.from_list.keys() {
                if Address::from_public_key(&signing_key, nonce)
                    != Address::from_public_key(&tx.pub_key, nonce)
                {
                    return Err(TxRejection::AddressMismatch);
                }
            }
        }

        if full_check && !self.signatures.verify(&signing_key, &tx.checksum, &tx.signature) {
            return Err(TxRejection::InvalidSignature);
        }
        Ok(())
    }

    /// Key the signature is checked against.
    ///
    /// Multisig: the payload signer, resolved through its wallet when given
    /// as an address. Otherwise: the key bound to the source wallet, or the
    /// key carried in `pub_key`.
    fn resolve_signing_key(&self, tx: &Transaction) -> Result<Vec<u8>, TxRejection> {
        let source = tx
            .primary_source_address()
            .ok_or(TxRejection::MissingPublicKey)?;

        if let Some(payload) = tx.multisig_payload() {
            let signer = payload.signer();
            let signer_address = signer.address();
            if !self.wallets.get_wallet(&source).is_valid_signer(&signer_address) {
                return Err(TxRejection::SignerNotAllowed(signer_address));
            }
            if Address::validate_checksum(&signer.pub_key) {
                return self
                    .wallets
                    .get_wallet(&signer_address)
                    .public_key
                    .ok_or(TxRejection::MissingPublicKey);
            }
            return Ok(signer.pub_key.clone());
        }

        if let Some(key) = self.wallets.get_wallet(&source).public_key {
            return Ok(key);
        }
        if Address::validate_checksum(&tx.pub_key) {
            return Err(TxRejection::MissingPublicKey);
        }
        Ok(tx.pub_key.clone())
    }

    // === POW ===

    /// Validates a PoW solution against the current chain.
    pub fn verify_pow_transaction(
        &self,
        tx: &Transaction,
        check_nonce: bool,
    ) -> Result<(), TxRejection> {
        let (target, nonce) = tx.pow_solution().ok_or(TxRejection::PowInvalidPayload)?;
        if nonce.is_empty() || nonce.len() > 128 {
            return Err(TxRejection::PowInvalidPayload);
        }

        let height = self.chain.last_block_num();
        if target > height {
            return Err(TxRejection::PowFutureTarget { target, height });
        }
        let block = self
            .chain
            .get_block(target)
            .ok_or(TxRejection::UnknownBlock(target))?;
        if block.pow_field.is_some() {
            return Err(TxRejection::PowAlreadySolved(target));
        }
        let max_depth = self
            .config
            .redacted_window_size
            .saturating_sub(POW_DEPTH_MARGIN);
        if height - target > max_depth {
            return Err(TxRejection::PowTooDeep { target, height });
        }

        if check_nonce {
            let solver = tx
                .primary_source_address()
                .ok_or(TxRejection::PowInvalidPayload)?;
            let algorithm = PowAlgorithm::for_block_version(block.version);
            if !self.pow.verify_nonce(
                algorithm,
                &block.block_checksum,
                solver.as_bytes(),
                nonce,
                block.difficulty,
            ) {
                return Err(TxRejection::PowInvalidNonce);
            }
        }
        Ok(())
    }
}

fn check_amounts(tx: &Transaction) -> Result<(), TxRejection> {
    if tx.amount.is_negative() {
        return Err(TxRejection::NegativeAmount);
    }
    if tx.amount.is_zero() && !tx.tx_type.allows_zero_amount() {
        return Err(TxRejection::ZeroAmount);
    }
    if tx.fee.is_negative() {
        return Err(TxRejection::NegativeFee);
    }
    Ok(())
}

fn check_multisig_shape(tx: &Transaction) -> Result<(), TxRejection> {
    let payload = tx.multisig_payload();
    if !tx.tx_type.is_multisig() {
        return match payload {
            Some(_) => Err(TxRejection::MultisigPayloadMismatch),
            None => Ok(()),
        };
    }

    let payload = payload.ok_or(TxRejection::MultisigPayloadMismatch)?;
    if !payload.matches_type(tx.tx_type) {
        return Err(TxRejection::MultisigPayloadMismatch);
    }
    if tx.from_list.len() != 1 {
        return Err(TxRejection::MultisigInputCount);
    }
    if tx.tx_type != TransactionType::MultisigTX && !tx.to_list.is_empty() {
        return Err(TxRejection::MultisigUnexpectedOutputs);
    }
    if let MultisigPayload::ChSig { required_sigs, .. } = payload {
        if *required_sigs == 0 {
            return Err(TxRejection::InvalidRequiredSigs(*required_sigs));
        }
    }

    let key = &payload.signer().pub_key;
    let key_ok = Address::validate_checksum(key)
        || (MIN_PUBLIC_KEY_LEN..=MAX_PUBLIC_KEY_LEN).contains(&key.len());
    if !key_ok {
        return Err(TxRejection::InvalidSignerKey);
    }
    Ok(())
}

fn check_inputs(tx: &Transaction) -> Result<(), TxRejection> {
    let expected = &tx.amount + &tx.fee;
    if tx.from_list.is_empty() && !expected.is_zero() {
        return Err(TxRejection::InputSumMismatch {
            inputs: tx.from_total(),
            expected,
        });
    }
    for (nonce, amount) in &tx.from_list {
        let valid = nonce.as_slice() == [0u8] || nonce.len() == MAX_NONCE_LEN;
        if !valid {
            return Err(TxRejection::InvalidNonce { len: nonce.len() });
        }
        if amount.is_negative() {
            return Err(TxRejection::NegativeEntry);
        }
    }
    let inputs = tx.from_total();
    if inputs != expected {
        return Err(TxRejection::InputSumMismatch { inputs, expected });
    }
    Ok(())
}

fn check_outputs(tx: &Transaction) -> Result<(), TxRejection> {
    for (address, amount) in &tx.to_list {
        if !address.is_valid() {
            return Err(TxRejection::InvalidOutputAddress);
        }
        if amount.is_negative() {
            return Err(TxRejection::NegativeEntry);
        }
    }
    let outputs = tx.to_total();
    if outputs != tx.amount {
        return Err(TxRejection::OutputSumMismatch {
            outputs,
            amount: tx.amount.clone(),
        });
    }
    Ok(())
}
