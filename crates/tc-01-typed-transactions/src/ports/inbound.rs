//! # Inbound Ports
//!
//! What the typed transaction protocol offers to consensus, the transaction
//! pool and wallets.

use async_trait::async_trait;
use shared_types::{Block, BlockHeight, KeyStore, Transaction, ValidationContext};

use crate::config::NetworkConfig;
use crate::domain::ValidationError;
use crate::ports::outbound::CoinOutputLookup;
use crate::transactions::{MinerPayout, TypedTransaction};

/// Typed transaction protocol API - inbound port.
#[async_trait]
pub trait TransactionProtocolApi: Send + Sync {
    /// Network constants the protocol validates against.
    fn network(&self) -> &NetworkConfig;

    /// Interpret a generic transaction.
    ///
    /// Fails with `UnknownVersion` for versions no kind claims, and with a
    /// codec error when the extension does not match the kind's layout.
    fn decode_transaction(&self, tx: &Transaction) -> Result<TypedTransaction, ValidationError>;

    /// Apply the kind's business rules at `ctx`.
    async fn validate_transaction(
        &self,
        tx: &TypedTransaction,
        ctx: ValidationContext,
    ) -> Result<(), ValidationError>;

    /// Decode and validate every transaction of a block at `height`.
    async fn validate_block(
        &self,
        block: &Block,
        height: BlockHeight,
    ) -> Result<Vec<TypedTransaction>, ValidationError>;

    /// Check coin inputs against the outputs they spend.
    fn validate_coin_outputs(
        &self,
        tx: &TypedTransaction,
        ctx: ValidationContext,
        coin_outputs: &dyn CoinOutputLookup,
    ) -> Result<(), ValidationError>;

    /// Add every signature `keys` can produce. Returns whether any was added.
    fn sign_transaction(
        &self,
        tx: &mut TypedTransaction,
        keys: &dyn KeyStore,
        coin_outputs: &dyn CoinOutputLookup,
    ) -> Result<bool, ValidationError>;

    /// Payouts owed to fixed addresses on top of the miner fees.
    fn miner_payouts(&self, tx: &TypedTransaction) -> Vec<MinerPayout>;
}
