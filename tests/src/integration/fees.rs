//! Fees owed on top of the miner fee, and the miner fee floor.

#[cfg(test)]
mod tests {
    use shared_types::ValidationContext;
    use tc_01_typed_transactions::domain::fees::{
        compute_monthly_bot_fees, compute_registration_fee, compute_transfer_fee,
    };
    use tc_01_typed_transactions::transactions::erc20_registration_fee;
    use tc_01_typed_transactions::{MinerPayout, TransactionProtocolApi, TypedTransaction, ValidationError};

    use crate::integration::fixtures::*;

    #[tokio::test]
    async fn test_registration_fee_paid_to_bot_pool() {
        let mut chain = Chain::new();
        let reg = chain.registration(1, &["alice.example", "alice.backup"], 1);

        let network = chain.protocol.network().clone();
        assert_eq!(
            chain.protocol.miner_payouts(&reg),
            vec![MinerPayout {
                unlock_hash: network.bot_registry_pool,
                value: compute_registration_fee(1, 2, network.one_coin),
            }]
        );
    }

    #[tokio::test]
    async fn test_transfer_and_erc20_payouts() {
        let mut chain = Chain::new();
        let alice = chain.registration(1, &["alice.example", "alice.backup"], 1);
        let bobby = chain.registration(2, &["bobby.example"], 1);
        chain.mine(T0, vec![alice, bobby]).await.unwrap();
        let network = chain.protocol.network().clone();

        let transfer = chain.transfer(1, 2, &["alice.example", "alice.backup"]);
        assert_eq!(
            chain.protocol.miner_payouts(&transfer)[0].value,
            compute_transfer_fee(2, network.one_coin)
        );

        let registration: TypedTransaction = chain.erc20_registration(4).into();
        assert_eq!(
            chain.protocol.miner_payouts(&registration),
            vec![MinerPayout {
                unlock_hash: network.erc20_fee_pool,
                value: erc20_registration_fee(network.one_coin),
            }]
        );
    }

    #[test]
    fn test_prepaid_month_discounts() {
        let one_coin = Chain::new().one_coin();
        let monthly = compute_monthly_bot_fees(1, one_coin);

        assert_eq!(compute_monthly_bot_fees(11, one_coin), monthly * 11);
        // a full year is cheaper than eleven months
        assert!(compute_monthly_bot_fees(12, one_coin) < compute_monthly_bot_fees(11, one_coin));
        assert_eq!(compute_monthly_bot_fees(12, one_coin), (monthly * 12).mul_div(7, 10));
        assert_eq!(compute_monthly_bot_fees(24, one_coin), monthly * 12);
    }

    #[tokio::test]
    async fn test_miner_fee_floor() {
        let mut chain = Chain::new();
        let mut reg = chain.registration(1, &["alice.example"], 1);
        if let TypedTransaction::BotRegistration(tx) = &mut reg {
            tx.transaction_fee = chain.one_coin().mul_div(1, 2);
            tx.sign_extension(&chain.keys).unwrap();
        }
        let err = chain
            .protocol
            .validate_transaction(&reg, ValidationContext::new(1, T0))
            .await
            .unwrap_err();
        assert!(matches!(err, ValidationError::TooSmallMinerFee { .. }));
    }
}
