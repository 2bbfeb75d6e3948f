//! # Consensus Rules
//!
//! Height- and version-indexed constants every node must agree on
//! byte-for-byte.
//!
//! | Rule | Function |
//! |------|----------|
//! | Allowed tx versions per block version | [`allowed_tx_versions`] |
//! | Minimum fee | [`calculate_minimum_fee`] |
//! | Mining reward schedule | [`calculate_mining_reward_for_block`] |
//! | Premine spending floor | [`premine_floor`] |

use shared_types::{Amount, Transaction};
use std::ops::RangeInclusive;

/// Blocks `[1, BOOTSTRAP_BLOCKS)` accept only bootstrap transactions.
pub const BOOTSTRAP_BLOCKS: u64 = 10;

/// How far ahead of the known tip a transaction may be bound.
pub const FUTURE_BLOCK_MARGIN: u64 = 10;

/// PoW solutions must target blocks at least this far inside the redacted window.
pub const POW_DEPTH_MARGIN: u64 = 100;

pub const MIN_PUBLIC_KEY_LEN: usize = 32;
pub const MAX_PUBLIC_KEY_LEN: usize = 2500;
pub const MAX_NONCE_LEN: usize = 16;

/// Last block that pays a mining reward and enforces the premine floor.
pub const LAST_REWARD_BLOCK: u64 = 5_256_000;

const FEE_UNIT_BYTES: usize = 1024;

/// Transaction versions accepted under a block version.
pub fn allowed_tx_versions(block_version: u32) -> RangeInclusive<u32> {
    match block_version {
        0 | 1 => 0..=1,
        2 => 1..=2,
        3..=5 => 2..=3,
        6 => 3..=4,
        7 => 4..=5,
        _ => 5..=5,
    }
}

/// Highest transaction version producible under a block version.
pub fn max_tx_version(block_version: u32) -> u32 {
    *allowed_tx_versions(block_version).end()
}

/// Minimum fee: `price_per_kb` per started kilobyte (at least one).
///
/// Version 0 blocks or transactions pay the flat `price_per_kb`.
pub fn calculate_minimum_fee(
    tx: &Transaction,
    block_version: u32,
    price_per_kb: &Amount,
) -> Amount {
    if block_version == 0 || tx.version == 0 {
        return price_per_kb.clone();
    }
    let kilobytes = tx.encoded_len().div_ceil(FEE_UNIT_BYTES).max(1);
    price_per_kb.mul_u64(kilobytes as u64)
}

/// Total mining reward for solving `block_num`.
pub fn calculate_mining_reward_for_block(block_num: u64) -> Amount {
    let units: u64 = match block_num {
        n if n < 1_051_200 => 960_000_000,
        n if n < 2_102_400 => 480_000_000,
        n if n < 3_153_600 => 240_000_000,
        n if n < 4_204_800 => 120_000_000,
        n if n <= LAST_REWARD_BLOCK => 60_000_000,
        _ => 0,
    };
    Amount::from_units(units)
}

/// Balance a premine wallet must keep at `block_num`; `None` once void.
pub fn premine_floor(block_num: u64) -> Option<Amount> {
    let coins: i64 = match block_num {
        n if n < 1_051_200 => 900_000_000,
        n if n < 2_102_400 => 700_000_000,
        n if n < 3_153_600 => 500_000_000,
        n if n < 4_204_800 => 300_000_000,
        n if n <= LAST_REWARD_BLOCK => 100_000_000,
        _ => return None,
    };
    Some(Amount::from_coins(coins))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Address, TransactionBuilder, TransactionType};

    #[test]
    fn test_version_bands() {
        assert_eq!(allowed_tx_versions(0), 0..=1);
        assert_eq!(allowed_tx_versions(1), 0..=1);
        assert_eq!(allowed_tx_versions(2), 1..=2);
        assert_eq!(allowed_tx_versions(3), 2..=3);
        assert_eq!(allowed_tx_versions(5), 2..=3);
        assert_eq!(allowed_tx_versions(6), 3..=4);
        assert_eq!(allowed_tx_versions(7), 4..=5);
        assert_eq!(allowed_tx_versions(8), 5..=5);
        assert_eq!(allowed_tx_versions(12), 5..=5);
        assert_eq!(max_tx_version(5), 3);
    }

    #[test]
    fn test_mining_schedule() {
        assert_eq!(calculate_mining_reward_for_block(1).to_string(), "9.60000000");
        assert_eq!(
            calculate_mining_reward_for_block(1_051_200).to_string(),
            "4.80000000"
        );
        assert_eq!(
            calculate_mining_reward_for_block(5_256_000).to_string(),
            "0.60000000"
        );
        assert!(calculate_mining_reward_for_block(5_256_001).is_zero());
    }

    #[test]
    fn test_premine_floor_void_after_schedule() {
        assert_eq!(premine_floor(10), Some(Amount::from_coins(900_000_000)));
        assert_eq!(premine_floor(4_204_800), Some(Amount::from_coins(100_000_000)));
        assert_eq!(premine_floor(5_256_001), None);
    }

    #[test]
    fn test_minimum_fee_scales_with_size() {
        let price = Amount::parse("0.00005").unwrap();
        let mut builder = TransactionBuilder::new(TransactionType::Normal, 3)
            .block_height(20)
            .pub_key(vec![1u8; 32]);
        let small = builder
            .clone()
            .to(Address::from_public_key(&[2u8; 32], &[0]), Amount::from_coins(1))
            .build();
        assert_eq!(calculate_minimum_fee(&small, 5, &price), price);

        for seed in 0..40u8 {
            builder =
                builder.to(Address::from_public_key(&[seed; 32], &[0]), Amount::from_coins(1));
        }
        let large = builder.build();
        assert!(large.encoded_len() > 1024);
        assert!(calculate_minimum_fee(&large, 5, &price) > price);
        assert_eq!(calculate_minimum_fee(&large, 0, &price), price);
    }
}
