//! # Mining and Staking Rewards
//!
//! Rewards are minted only while a block is applied:
//!
//! - PoW solutions for a past block split that block's reward between
//!   the distinct solvers and stamp the block's PoW field
//! - Staking rewards listed by a block are regenerated locally, admitted and
//!   paid to funded signers of the reward target block

#[cfg(test)]
mod tests {
    use crate::harness::*;
    use ixi_05_signature_freeze::BlockOutcome;
    use ixi_06_protocol::MessageOutcome;
    use shared_types::{encode_varint, Amount, BlockChain};

    use ixi_02_transaction_pool::TransactionPoolApi;

    // =========================================================================
    // PROOF OF WORK
    // =========================================================================

    #[test]
    fn test_pow_reward_split_between_solvers() {
        let node = TestNode::new(START_HEIGHT);
        let (x, y) = (keypair(30), keypair(31));
        let target = node.chain.get_block(5).unwrap();

        let sx = pow_solution(&x, &target, START_HEIGHT);
        let sy = pow_solution(&y, &target, START_HEIGHT);
        node.submit(&sx);
        node.submit(&sy);

        let block = node.next_block(vec![sx.id.clone(), sy.id.clone()]);
        assert_eq!(
            node.deliver_block(&block),
            Ok(MessageOutcome::Block(BlockOutcome::Accepted(START_HEIGHT + 1)))
        );

        let share = Amount::from_units(480_000_000);
        assert_eq!(node.balance(&address_of(&x)), share);
        assert_eq!(node.balance(&address_of(&y)), share);
        assert_eq!(
            node.chain.get_block(5).unwrap().pow_field,
            Some(encode_varint(START_HEIGHT + 1))
        );
    }

    #[test]
    fn test_pow_reward_split_floors_each_share() {
        let node = TestNode::new(START_HEIGHT);
        let target = node.chain.get_block(5).unwrap();
        let solvers: Vec<_> = (40..47).map(keypair).collect();
        let solutions: Vec<_> = solvers
            .iter()
            .map(|key| pow_solution(key, &target, START_HEIGHT))
            .collect();
        for solution in &solutions {
            node.submit(solution);
        }

        let block = node.next_block(solutions.iter().map(|s| s.id.clone()).collect());
        assert_eq!(
            node.deliver_block(&block),
            Ok(MessageOutcome::Block(BlockOutcome::Accepted(START_HEIGHT + 1)))
        );
        for key in &solvers {
            assert_eq!(node.balance(&address_of(key)), Amount::from_units(137_142_857));
        }
    }

    #[test]
    fn test_solution_for_rewarded_block_is_rejected() {
        let node = TestNode::new(START_HEIGHT);
        let target = node.chain.get_block(5).unwrap();
        let first = pow_solution(&keypair(30), &target, START_HEIGHT);
        node.submit(&first);
        node.deliver_block(&node.next_block(vec![first.id.clone()]))
            .unwrap();

        let late = pow_solution(&keypair(31), &target, START_HEIGHT);
        assert_eq!(
            node.submit(&late),
            MessageOutcome::Transactions {
                added: 0,
                known: 0,
                rejected: 1,
            }
        );
        assert_eq!(node.balance(&address_of(&keypair(31))), Amount::zero());
    }

    // =========================================================================
    // STAKING
    // =========================================================================

    #[test]
    fn test_staking_pays_funded_signers_only() {
        let node = TestNode::new(START_HEIGHT);
        let [s1, s2] = SIGNERS.map(keypair);
        let outsider = address_of(&keypair(60));
        node.fund(&address_of(&s1), coins(100));
        node.fund(&outsider, coins(100));
        let supply = node.supply();

        let rewards = node
            .container
            .pool
            .generate_staking_transactions(START_HEIGHT + 1);
        assert_eq!(rewards.len(), 1);
        assert!(rewards[0].to_list.contains_key(&address_of(&s1)));

        // The block only lists the ids; the node regenerates the rewards.
        let ids = rewards.iter().map(|tx| tx.id.clone()).collect();
        assert_eq!(
            node.deliver_block(&node.next_block(ids)),
            Ok(MessageOutcome::Block(BlockOutcome::Accepted(START_HEIGHT + 1)))
        );

        let gained = &node.balance(&address_of(&s1)) - &coins(100);
        assert!(gained.is_positive());
        assert_eq!(node.supply(), &supply + &gained);
        assert_eq!(node.balance(&address_of(&s2)), Amount::zero());
        assert_eq!(node.balance(&outsider), coins(100));
    }
}
