//! # Inventory-Driven Sync
//!
//! Two nodes exchange only inventory announcements and the requests they
//! trigger:
//!
//! ```text
//! [B] Inventory ──→ [A] inventory cache ──→ GetBlock / GetTransactions
//!                                                  │
//! [A] apply  ←── BlockData / TransactionsChunk ←── [B] protocol
//! ```
//!
//! A block far ahead is never fetched directly. The follower requests the
//! next height, and the maintenance tick retries the cached announcement
//! until the follower reaches it.

#[cfg(test)]
mod tests {
    use crate::harness::*;
    use ixi_02_transaction_pool::TransactionPoolApi;
    use ixi_04_inventory::{encode_inventory_chunks, InventoryReport};
    use ixi_06_protocol::MessageOutcome;
    use shared_types::{Address, BlockChain, InventoryItem, ProtocolMessageCode};

    fn announce(node: &TestNode, from: &str, items: &[InventoryItem]) -> InventoryReport {
        let chunks = encode_inventory_chunks(items, 64 * 1024, 64);
        assert_eq!(chunks.len(), 1);
        match node.deliver_from(&peer(from), ProtocolMessageCode::Inventory, &chunks[0]) {
            Ok(MessageOutcome::Inventory(report)) => report,
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    fn block_item(node: &TestNode, block_num: u64) -> InventoryItem {
        InventoryItem::Block {
            hash: node.chain.get_block(block_num).unwrap().block_checksum,
            block_num,
        }
    }

    /// One request/reply round between `a` and `b`.
    fn exchange(a: &TestNode, b: &TestNode) -> usize {
        let requests = a.relay_to(b, &peer("a"));
        b.relay_to(a, &peer("b"));
        requests
    }

    // =========================================================================
    // BLOCKS
    // =========================================================================

    #[test]
    fn test_follower_catches_up_one_block_at_a_time() {
        let a = TestNode::new(START_HEIGHT);
        let b = TestNode::new(START_HEIGHT + 2);

        let report = announce(&a, "b", &[block_item(&b, START_HEIGHT + 2)]);
        assert_eq!(report.new, 1);
        assert_eq!(report.waiting, 1);

        let requests = a.take_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].code, ProtocolMessageCode::GetBlock);
        for message in &requests {
            let _ = b.deliver_from(&peer("a"), message.code, &message.payload);
        }
        b.relay_to(&a, &peer("b"));
        assert_eq!(a.height(), START_HEIGHT + 1);

        // The cached announcement drives the next fetch.
        a.take_requests();
        a.advance_time(1_000);
        assert_eq!(a.tick().cache.retried, 1);
        assert_eq!(exchange(&a, &b), 1);
        assert_eq!(a.height(), START_HEIGHT + 2);
        assert_eq!(
            a.chain.get_block(START_HEIGHT + 2).unwrap().block_checksum,
            b.chain.get_block(START_HEIGHT + 2).unwrap().block_checksum
        );

        // Accepting the announced block settles its cache entry.
        a.take_requests();
        a.advance_time(1_000);
        assert_eq!(a.tick().cache.retried, 0);
        assert!(a.take_requests().is_empty());
    }

    #[test]
    fn test_known_block_announcement_is_done() {
        let a = TestNode::new(START_HEIGHT);
        let item = block_item(&a, START_HEIGHT);

        let report = announce(&a, "b", &[item.clone()]);
        assert_eq!(report.done, 1);
        assert!(a.take_requests().is_empty());

        let again = announce(&a, "c", &[item]);
        assert_eq!(again.duplicates, 1);
        assert_eq!(again.new, 0);
    }

    // =========================================================================
    // SIGNATURES
    // =========================================================================

    #[test]
    fn test_signature_already_on_block_is_not_requested() {
        let a = TestNode::new(START_HEIGHT);
        let tip = a.chain.get_block(START_HEIGHT).unwrap();
        let item = InventoryItem::BlockSignature {
            block_num: START_HEIGHT,
            block_hash: tip.block_checksum.clone(),
            signer: address_of(&keypair(SIGNERS[0])),
        };

        let report = announce(&a, "b", &[item]);
        assert_eq!(report.done, 1);
        assert!(a.take_requests().is_empty());
    }

    #[test]
    fn test_signature_for_other_fork_is_dropped() {
        let a = TestNode::new(START_HEIGHT);
        let item = InventoryItem::BlockSignature {
            block_num: START_HEIGHT,
            block_hash: vec![0xAB; 64],
            signer: address_of(&keypair(40)),
        };

        assert_eq!(announce(&a, "b", &[item]).done, 1);
        assert!(a.take_requests().is_empty());
    }

    // =========================================================================
    // TRANSACTIONS
    // =========================================================================

    #[test]
    fn test_unknown_transaction_is_fetched_from_announcer() {
        let a = TestNode::new(START_HEIGHT);
        let b = TestNode::new(START_HEIGHT);
        let sender = keypair(50);
        let receiver = address_of(&keypair(51));
        a.fund(&address_of(&sender), coins(100));
        b.fund(&address_of(&sender), coins(100));

        let tx = transfer(&sender, &receiver, coins(10), small_fee(), START_HEIGHT);
        b.submit(&tx);
        b.take_requests();

        let report = announce(&a, "b", &[InventoryItem::Transaction { txid: tx.id.clone() }]);
        assert_eq!(report.requested, 1);

        assert_eq!(exchange(&a, &b), 1);
        assert!(a.container.pool.get_unapplied_transaction(&tx.id).is_some());
    }

    #[test]
    fn test_received_transaction_is_not_requested_again() {
        let a = TestNode::new(START_HEIGHT);
        let sender = keypair(50);
        a.fund(&address_of(&sender), coins(100));
        let tx = transfer(&sender, &address_of(&keypair(51)), coins(1), small_fee(), START_HEIGHT);
        a.submit(&tx);
        a.take_requests();

        // Admission already marked it processed.
        let report = announce(&a, "b", &[InventoryItem::Transaction { txid: tx.id }]);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.new, 0);
        assert!(a.take_requests().is_empty());
    }

    // =========================================================================
    // KEEPALIVES
    // =========================================================================

    #[test]
    fn test_keepalive_for_unknown_wallet_requests_presence() {
        let a = TestNode::new(START_HEIGHT);
        let stranger: Address = address_of(&keypair(70));

        let report = announce(
            &a,
            "b",
            &[InventoryItem::KeepAlive {
                address: stranger,
                device_id: vec![7],
                last_seen: 500,
            }],
        );
        assert_eq!(report.requested, 1);

        let requests = a.take_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].code, ProtocolMessageCode::GetPresence);
    }

    #[test]
    fn test_stale_keepalive_is_done() {
        let a = TestNode::new(START_HEIGHT);
        let known = address_of(&keypair(SIGNERS[0]));

        let report = announce(
            &a,
            "b",
            &[InventoryItem::KeepAlive {
                address: known,
                device_id: vec![SIGNERS[0]],
                last_seen: 50,
            }],
        );
        assert_eq!(report.done, 1);
        assert!(a.take_requests().is_empty());
    }
}
