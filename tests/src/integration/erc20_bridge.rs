//! ERC20 bridge: address registration, withdrawals and conversions.

#[cfg(test)]
mod tests {
    use shared_types::{Currency, ValidationContext};
    use tc_01_typed_transactions::config::ONE_COIN;
    use tc_01_typed_transactions::{
        Erc20Address, Erc20ConvertTransaction, Erc20Hash, Erc20Registry, TransactionProtocolApi,
        TypedTransaction, ValidationError,
    };
    use tc_02_transaction_index::TransactionIndexApi;

    use crate::integration::fixtures::*;

    fn coins(n: u64) -> Currency {
        Currency::new(ONE_COIN) * n
    }

    /// Chain where `seed`'s address withdrew `amount` in ERC20 tx `txid`.
    async fn registered_chain(seed: u8, txid: u8, amount: Currency) -> Chain {
        let mut chain = Chain::with_withdrawals(withdrawals(&[(txid, tft_address(seed), amount)]));
        let registration = chain.erc20_registration(seed);
        chain.mine(T0, vec![registration.into()]).await.unwrap();
        chain
    }

    #[tokio::test]
    async fn test_address_registration_binds_both_ways() {
        let mut chain = Chain::new();
        let registration = chain.erc20_registration(4);
        let erc20 = registration.erc20_address();
        chain.mine(T0, vec![registration.clone().into()]).await.unwrap();

        assert_eq!(
            chain.index.erc20_address_for_tft_address(&tft_address(4)).unwrap(),
            Some(erc20)
        );
        assert_eq!(
            chain.index.tft_address_for_erc20_address(&erc20).unwrap(),
            Some(tft_address(4))
        );

        let again = chain.erc20_registration(4);
        assert!(matches!(
            chain.mine(T0 + DAY, vec![again.into()]).await,
            Err(ValidationError::Erc20AddressAlreadyRegistered)
        ));
    }

    #[tokio::test]
    async fn test_withdrawal_mints_once() {
        let mut chain = registered_chain(4, 0x11, coins(5)).await;

        let mint = chain.coin_creation(tft_address(4), coins(5), 0x11);
        chain.mine(T0 + 600, vec![mint.clone()]).await.unwrap();
        assert_eq!(
            chain
                .index
                .tft_transaction_id_for_erc20_transaction_id(&Erc20Hash([0x11; 32]))
                .unwrap(),
            Some(mint.id())
        );

        let err = chain.mine(T0 + 1200, vec![mint.clone()]).await.unwrap_err();
        assert!(matches!(err, ValidationError::Erc20TransactionAlreadyMapped { .. }));
        assert!(err.to_string().contains("already mapped"));
    }

    #[tokio::test]
    async fn test_withdrawal_minted_twice_in_one_block() {
        let mut chain = registered_chain(4, 0x11, coins(5)).await;
        let mint = chain.coin_creation(tft_address(4), coins(5), 0x11);

        assert!(matches!(
            chain.mine(T0 + 600, vec![mint.clone(), mint]).await,
            Err(ValidationError::Erc20TransactionAlreadyMapped { .. })
        ));
        assert_eq!(chain.index.stats().height, 1);
    }

    #[tokio::test]
    async fn test_address_registered_twice_in_one_block() {
        let mut chain = Chain::new();
        let first = chain.erc20_registration(4);
        let second = chain.erc20_registration(4);

        assert!(matches!(
            chain.mine(T0, vec![first.into(), second.into()]).await,
            Err(ValidationError::Erc20AddressAlreadyRegistered)
        ));
        assert_eq!(chain.index.erc20_address_for_tft_address(&tft_address(4)).unwrap(), None);
    }

    #[tokio::test]
    async fn test_withdrawal_to_unregistered_address() {
        let mut chain = Chain::with_withdrawals(withdrawals(&[(0x11, tft_address(4), coins(5))]));
        let mint = chain.coin_creation(tft_address(4), coins(5), 0x11);
        assert!(matches!(
            chain.mine(T0, vec![mint]).await,
            Err(ValidationError::AddressNotRegistered { .. })
        ));
    }

    #[tokio::test]
    async fn test_withdrawal_must_match_bridge_event() {
        let mut chain = registered_chain(4, 0x11, coins(5)).await;
        let mint = chain.coin_creation(tft_address(4), coins(6), 0x11);
        assert!(matches!(
            chain.mine(T0 + 600, vec![mint]).await,
            Err(ValidationError::WithdrawValidation(_))
        ));
    }

    #[tokio::test]
    async fn test_reverted_withdrawal_can_be_minted_again() {
        let mut chain = registered_chain(4, 0x11, coins(5)).await;
        let mint = chain.coin_creation(tft_address(4), coins(5), 0x11);
        chain.mine(T0 + 600, vec![mint.clone()]).await.unwrap();

        chain.revert(1);
        assert_eq!(
            chain
                .index
                .tft_transaction_id_for_erc20_transaction_id(&Erc20Hash([0x11; 32]))
                .unwrap(),
            None
        );
        chain.mine(T0 + 1200, vec![mint]).await.unwrap();
    }

    #[tokio::test]
    async fn test_conversion_minimum() {
        let mut chain = Chain::new();
        let convert = |chain: &mut Chain, value| -> TypedTransaction {
            Erc20ConvertTransaction {
                address: Erc20Address([0xab; 20]),
                value,
                transaction_fee: chain.one_coin(),
                coin_inputs: chain.fresh_input(),
                refund: None,
            }
            .into()
        };
        let ctx = ValidationContext::new(1, T0);

        let enough = convert(&mut chain, coins(1000));
        chain.protocol.validate_transaction(&enough, ctx).await.unwrap();

        let short = convert(&mut chain, coins(999));
        let err = chain.protocol.validate_transaction(&short, ctx).await.unwrap_err();
        assert!(matches!(err, ValidationError::ConversionBelowMinimum { .. }));
        assert!(err.to_string().contains("minimum value"));
    }
}
