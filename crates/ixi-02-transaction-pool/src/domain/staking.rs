//! Staking reward distribution.
//!
//! Signers of the target block share the per-block staking reward in
//! proportion to their balances. Truncated base units left over are handed
//! out one at a time by largest remainder, ties broken by address.

use shared_types::{Address, Amount};
use std::collections::BTreeMap;

/// Per-block staking reward for the given supply.
pub fn staking_reward_for_supply(
    total_supply: &Amount,
    inflation_ppm: u64,
    blocks_per_year: u64,
) -> Amount {
    total_supply
        .mul_u64(inflation_ppm)
        .div_floor_u64(1_000_000u64.saturating_mul(blocks_per_year))
}

/// Splits `total` over `stakers` by balance. Result is sorted by address and
/// omits zero shares; the shares sum to `total` whenever any staker has a
/// positive balance.
pub fn distribute_staking_reward(
    total: &Amount,
    stakers: &[(Address, Amount)],
) -> Vec<(Address, Amount)> {
    if !total.is_positive() {
        return Vec::new();
    }

    let balances: BTreeMap<&Address, &Amount> = stakers
        .iter()
        .filter(|(_, balance)| balance.is_positive())
        .map(|(address, balance)| (address, balance))
        .collect();
    let stake_sum: Amount = balances.values().copied().sum();
    if !stake_sum.is_positive() {
        return Vec::new();
    }

    let mut shares: Vec<(Address, Amount, _)> = balances
        .iter()
        .map(|(address, balance)| {
            let (share, remainder) = total.mul_div_rem(balance, &stake_sum);
            ((*address).clone(), share, remainder)
        })
        .collect();

    let distributed: Amount = shares.iter().map(|(_, share, _)| share).sum();
    let mut leftover = total - &distributed;

    let mut order: Vec<usize> = (0..shares.len()).collect();
    order.sort_by(|&a, &b| {
        shares[b]
            .2
            .cmp(&shares[a].2)
            .then_with(|| shares[a].0.cmp(&shares[b].0))
    });
    let unit = Amount::from_units(1);
    for index in order {
        if !leftover.is_positive() {
            break;
        }
        shares[index].1 += &unit;
        leftover -= &unit;
    }

    shares
        .into_iter()
        .filter(|(_, share, _)| share.is_positive())
        .map(|(address, share, _)| (address, share))
        .collect()
}
