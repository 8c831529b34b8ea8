//! Chain reorganizations: the index must land exactly where it would have
//! been had the reverted blocks never been applied.

#[cfg(test)]
mod tests {
    use tc_01_typed_transactions::{BotId, BotRecordReadRegistry, RegistryError};
    use tc_02_transaction_index::TransactionIndexApi;

    use crate::integration::fixtures::*;

    #[tokio::test]
    async fn test_revert_frees_id_and_key() {
        let mut chain = Chain::new();
        let alice = chain.registration(1, &["alice.example"], 1);
        chain.mine(T0, vec![alice]).await.unwrap();
        let bobby = chain.registration(2, &["bobby.example"], 1);
        chain.mine(T0 + 600, vec![bobby.clone()]).await.unwrap();

        chain.revert(1);
        assert_eq!(chain.index.stats().height, 1);
        assert_eq!(chain.index.stats().chain_time, T0);
        assert!(matches!(
            chain.index.record_for_id(BotId(2)),
            Err(RegistryError::BotNotFound { .. })
        ));
        assert!(matches!(
            chain.index.record_for_name(&name("bobby.example")),
            Err(RegistryError::BotNameNotFound)
        ));

        // another bot takes the freed id
        let carol = chain.registration(3, &["carol.example"], 1);
        chain.mine(T0 + 600, vec![carol]).await.unwrap();
        assert_eq!(chain.index.record_for_key(&public_key(3)).unwrap().id, BotId(2));

        // and the reverted registration is valid again on top of it
        chain.mine(T0 + 1200, vec![bobby]).await.unwrap();
        assert_eq!(chain.index.record_for_key(&public_key(2)).unwrap().id, BotId(3));
    }

    #[tokio::test]
    async fn test_revert_hands_name_back_to_expired_owner() {
        let mut chain = Chain::new();
        let alice = chain.registration(1, &["alice.example"], 1);
        chain.mine(T0, vec![alice]).await.unwrap();
        chain.mine(T0 + 31 * DAY, vec![]).await.unwrap();

        let carol = chain.registration(3, &["alice.example"], 1);
        chain.mine(T0 + 32 * DAY, vec![carol]).await.unwrap();
        assert_eq!(chain.index.record_for_name(&name("alice.example")).unwrap().id, BotId(2));

        chain.revert(1);
        match chain.index.record_for_name(&name("alice.example")) {
            Err(RegistryError::BotNameExpired { record }) => assert_eq!(record.id, BotId(1)),
            other => panic!("expected alice's expired record, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_deep_revert_then_replay() {
        let mut chain = Chain::new();
        let alice = chain.registration(1, &["alice.example", "alice.backup"], 2);
        let bobby = chain.registration(2, &["bobby.example"], 2);
        chain.mine(T0, vec![alice, bobby]).await.unwrap();
        let transfer = chain.transfer(1, 2, &["alice.backup"]);
        chain.mine(T0 + DAY, vec![transfer]).await.unwrap();
        let update = chain.update(2, &["carol.example"], &["bobby.example"], 3);
        chain.mine(T0 + 2 * DAY, vec![update]).await.unwrap();
        let tip_stats = chain.index.stats();
        let alice_at_tip = chain.index.record_for_id(BotId(1)).unwrap();
        let bobby_at_tip = chain.index.record_for_id(BotId(2)).unwrap();

        let reverted = chain.revert(2);
        let bobby_before = chain.index.record_for_id(BotId(2)).unwrap();
        assert_eq!(bobby_before.names.len(), 1);
        assert!(bobby_before.names.contains(&name("bobby.example")));
        assert_eq!(chain.index.record_for_name(&name("alice.backup")).unwrap().id, BotId(1));

        // replay oldest first
        for block in reverted.into_iter().rev() {
            let txs = block
                .transactions
                .iter()
                .map(|tx| chain.decode(tx))
                .collect();
            chain.mine(block.timestamp, txs).await.unwrap();
        }
        assert_eq!(chain.index.stats().height, tip_stats.height);
        assert_eq!(chain.index.stats().chain_time, tip_stats.chain_time);
        assert_eq!(chain.index.record_for_id(BotId(1)).unwrap(), alice_at_tip);
        assert_eq!(chain.index.record_for_id(BotId(2)).unwrap(), bobby_at_tip);
    }
}
