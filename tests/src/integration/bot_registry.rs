//! 3bot lifecycle through validation and indexing.

#[cfg(test)]
mod tests {
    use tc_01_typed_transactions::{
        BotId, BotRecordReadRegistry, NetworkAddress, RegistryError, TypedTransaction,
        ValidationError,
    };
    use tc_02_transaction_index::TransactionIndexApi;

    use crate::integration::fixtures::*;

    #[tokio::test]
    async fn test_registered_bot_resolves_until_expiry() {
        let mut chain = Chain::new();
        for i in 0..99u64 {
            chain.mine(T0 - (99 - i) * 600, vec![]).await.unwrap();
        }
        let reg = chain.registration_with_addresses(1, &["alice.example"], &["10.0.0.1"], 3);
        chain.mine(T0, vec![reg.clone()]).await.unwrap();
        assert_eq!(chain.index.stats().height, 100);

        let record = chain.index.record_for_name(&name("alice.example")).unwrap();
        assert_eq!(record.id, BotId(1));
        assert_eq!(record.public_key, public_key(1));
        assert!(record.addresses.contains(&NetworkAddress::new("10.0.0.1").unwrap()));
        assert_eq!(chain.index.bot_transaction_ids(BotId(1)).unwrap(), vec![reg.id()]);

        chain.mine(T0 + 91 * DAY, vec![]).await.unwrap();
        match chain.index.record_for_name(&name("alice.example")) {
            Err(RegistryError::BotNameExpired { record }) => assert_eq!(record.id, BotId(1)),
            other => panic!("expected an expired name, got {:?}", other),
        }
        // ids and keys keep resolving
        assert!(chain.index.record_for_id(BotId(1)).unwrap().is_expired(T0 + 91 * DAY));
        assert_eq!(chain.index.lookup_record("1").unwrap().id, BotId(1));
    }

    #[tokio::test]
    async fn test_name_is_unique_while_active() {
        let mut chain = Chain::new();
        let alice = chain.registration(1, &["alice.example"], 1);
        chain.mine(T0, vec![alice]).await.unwrap();

        let carol = chain.registration(3, &["alice.example"], 1);
        let err = chain.mine(T0 + DAY, vec![carol.clone()]).await.unwrap_err();
        assert!(matches!(err, ValidationError::BotNameAlreadyRegistered { .. }));
        assert_eq!(chain.index.stats().height, 1);

        chain.mine(T0 + 31 * DAY, vec![]).await.unwrap();
        chain.mine(T0 + 32 * DAY, vec![carol]).await.unwrap();
        assert_eq!(chain.index.record_for_name(&name("alice.example")).unwrap().id, BotId(2));
    }

    #[tokio::test]
    async fn test_key_registers_once() {
        let mut chain = Chain::new();
        let first = chain.registration(1, &["alice.example"], 1);
        chain.mine(T0, vec![first]).await.unwrap();

        let second = chain.registration(1, &["alice.backup"], 1);
        assert!(matches!(
            chain.mine(T0 + DAY, vec![second]).await,
            Err(ValidationError::BotKeyAlreadyRegistered)
        ));
    }

    #[tokio::test]
    async fn test_name_claimed_twice_in_one_block() {
        let mut chain = Chain::new();
        let alice = chain.registration(1, &["alice.example"], 1);
        let carol = chain.registration(3, &["alice.example"], 1);

        assert!(matches!(
            chain.mine(T0, vec![alice, carol]).await,
            Err(ValidationError::BotNameAlreadyRegistered { .. })
        ));
        assert_eq!(chain.index.stats().height, 0);
        assert!(matches!(
            chain.index.record_for_name(&name("alice.example")),
            Err(RegistryError::BotNameNotFound)
        ));
    }

    #[tokio::test]
    async fn test_update_cannot_add_name_registered_in_same_block() {
        let mut chain = Chain::new();
        let alice = chain.registration(1, &["alice.example"], 1);
        chain.mine(T0, vec![alice]).await.unwrap();

        let carol = chain.registration(3, &["carol.example"], 1);
        let update = chain.update(1, &["carol.example"], &[], 0);
        assert!(matches!(
            chain.mine(T0 + DAY, vec![carol, update]).await,
            Err(ValidationError::BotNameAlreadyRegistered { .. })
        ));
        assert_eq!(chain.index.stats().height, 1);
    }

    #[tokio::test]
    async fn test_key_registered_twice_in_one_block() {
        let mut chain = Chain::new();
        let first = chain.registration(1, &["alice.example"], 1);
        let second = chain.registration(1, &["alice.backup"], 1);

        assert!(matches!(
            chain.mine(T0, vec![first, second]).await,
            Err(ValidationError::BotKeyAlreadyRegistered)
        ));
        assert_eq!(chain.index.stats().height, 0);
        assert!(matches!(
            chain.index.record_for_key(&public_key(1)),
            Err(RegistryError::BotKeyNotFound)
        ));
    }

    #[tokio::test]
    async fn test_ids_follow_block_order() {
        let mut chain = Chain::new();
        let alice = chain.registration(1, &["alice.example"], 1);
        let carol = chain.registration(3, &["carol.example"], 1);
        chain.mine(T0, vec![alice, carol]).await.unwrap();

        assert_eq!(chain.index.record_for_key(&public_key(1)).unwrap().id, BotId(1));
        assert_eq!(chain.index.record_for_key(&public_key(3)).unwrap().id, BotId(2));
    }

    #[tokio::test]
    async fn test_update_and_transfer() {
        let mut chain = Chain::new();
        let alice = chain.registration(1, &["alice.example", "alice.backup"], 2);
        let bobby = chain.registration(2, &["bobby.example"], 2);
        chain.mine(T0, vec![alice, bobby]).await.unwrap();

        let transfer = chain.transfer(1, 2, &["alice.backup"]);
        chain.mine(T0 + DAY, vec![transfer]).await.unwrap();
        assert_eq!(chain.index.record_for_name(&name("alice.backup")).unwrap().id, BotId(2));

        let update = chain.update(1, &["alice.renamed"], &["alice.example"], 1);
        chain.mine(T0 + 2 * DAY, vec![update]).await.unwrap();

        let record = chain.index.record_for_id(BotId(1)).unwrap();
        assert_eq!(record.names.len(), 1);
        assert!(record.names.contains(&name("alice.renamed")));
        assert!(matches!(
            chain.index.record_for_name(&name("alice.example")),
            Err(RegistryError::BotNameNotFound)
        ));
        assert_eq!(chain.index.bot_transaction_ids(BotId(1)).unwrap().len(), 3);
        assert_eq!(chain.index.bot_transaction_ids(BotId(2)).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unsigned_registration_rejected() {
        let mut chain = Chain::new();
        let mut reg = chain.registration(1, &["alice.example"], 1);
        if let TypedTransaction::BotRegistration(tx) = &mut reg {
            tx.identification.signature.clear();
        }
        assert!(chain.mine(T0, vec![reg]).await.is_err());
        assert_eq!(chain.index.stats().height, 0);
        assert!(matches!(
            chain.index.record_for_key(&public_key(1)),
            Err(RegistryError::BotKeyNotFound)
        ));
    }
}
