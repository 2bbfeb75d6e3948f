//! # Multisig Quorum Across the Node
//!
//! A multisig spend only moves funds once a block carries enough
//! co-signatures for the source wallet. Blocks lacking them are refused by
//! the freeze coordinator and leave the wallet untouched.

#[cfg(test)]
mod tests {
    use crate::harness::*;
    use ixi_02_transaction_pool::{BlockApplyError, TransactionPoolApi, TxRejection};
    use ixi_05_signature_freeze::{BlockOutcome, FreezeError};
    use ixi_06_protocol::{MessageOutcome, ProtocolError};
    use shared_crypto::Ed25519KeyPair;
    use shared_types::{
        Address, MultisigPayload, Transaction, TransactionType, WalletState, WalletType,
    };

    struct Setup {
        node: TestNode,
        wallet: Address,
        to: Address,
        orig: Transaction,
        cosig: Transaction,
    }

    fn multisig_wallet(
        node: &TestNode,
        owner: &Ed25519KeyPair,
        cosigner: &Ed25519KeyPair,
    ) -> Address {
        let wallet = address_of(owner);
        node.fund(&wallet, coins(100));
        node.wallets.set_wallet_multisig(
            &wallet,
            WalletType::Multisig,
            vec![address_of(cosigner)],
            2,
        );
        wallet
    }

    fn setup() -> Setup {
        let node = TestNode::new(START_HEIGHT);
        let (owner, cosigner) = (keypair(40), keypair(41));
        let wallet = multisig_wallet(&node, &owner, &cosigner);
        let to = address_of(&keypair(42));

        let orig = multisig_tx(
            TransactionType::MultisigTX,
            &wallet,
            &owner,
            MultisigPayload::TxData {
                signer: multisig_signer(&owner),
            },
            Some((&to, coins(10))),
            1,
        );
        let cosig = multisig_tx(
            TransactionType::MultisigAddTxSignature,
            &wallet,
            &cosigner,
            MultisigPayload::AddTxSignature {
                orig_txid: orig.id.clone(),
                signer: multisig_signer(&cosigner),
            },
            None,
            2,
        );
        Setup {
            node,
            wallet,
            to,
            orig,
            cosig,
        }
    }

    #[test]
    fn test_block_without_cosignature_is_refused() {
        let s = setup();
        s.node.submit(&s.orig);

        let result = s.node.deliver_block(&s.node.next_block(vec![s.orig.id.clone()]));
        assert!(matches!(
            result,
            Err(ProtocolError::Freeze(FreezeError::Apply(
                BlockApplyError::TransactionsFailed {
                    reason: TxRejection::QuorumNotMet {
                        have: 1,
                        required: 2
                    },
                    ..
                }
            )))
        ));

        assert_eq!(s.node.height(), START_HEIGHT);
        assert_eq!(s.node.balance(&s.wallet), coins(100));
        assert_eq!(s.node.balance(&s.to), coins(0));
        assert!(s
            .node
            .container
            .pool
            .get_unapplied_transaction(&s.orig.id)
            .is_some());
    }

    #[test]
    fn test_cosigned_spend_is_applied() {
        let s = setup();
        assert_eq!(
            s.node.submit(&s.orig),
            MessageOutcome::Transactions {
                added: 1,
                known: 0,
                rejected: 0,
            }
        );
        s.node.submit(&s.cosig);

        // Listed before its original; applied once the original is.
        let block = s
            .node
            .next_block(vec![s.cosig.id.clone(), s.orig.id.clone()]);
        assert_eq!(
            s.node.deliver_block(&block),
            Ok(MessageOutcome::Block(BlockOutcome::Accepted(START_HEIGHT + 1)))
        );

        let fees = &small_fee() + &small_fee();
        assert_eq!(s.node.balance(&s.to), coins(10));
        assert_eq!(s.node.balance(&s.wallet), &coins(90) - &fees);
    }
}
