//! # Wallets

use crate::address::Address;
use crate::amount::Amount;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WalletType {
    #[default]
    Normal,
    Multisig,
}

/// Wallet state as seen by the application engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: Address,
    pub balance: Amount,
    /// Bound once the wallet first spends.
    pub public_key: Option<Vec<u8>>,
    pub wallet_type: WalletType,
    pub required_sigs: u8,
    pub allowed_signers: Vec<Address>,
}

impl Wallet {
    /// An empty normal wallet.
    pub fn empty(id: Address) -> Self {
        Self {
            id,
            balance: Amount::zero(),
            public_key: None,
            wallet_type: WalletType::Normal,
            required_sigs: 1,
            allowed_signers: Vec::new(),
        }
    }

    pub fn is_multisig(&self) -> bool {
        self.wallet_type == WalletType::Multisig
    }

    /// The wallet itself is always a valid signer.
    pub fn is_valid_signer(&self, address: &Address) -> bool {
        &self.id == address || self.allowed_signers.contains(address)
    }

    /// Signers including the implicit owner.
    pub fn signer_count(&self) -> usize {
        self.allowed_signers.len() + 1
    }
}
