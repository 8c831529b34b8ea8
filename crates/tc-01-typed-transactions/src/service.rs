//! Typed Transaction Service - entry point for consensus and wallets
//!
//! Binds a network configuration to the registries and the bridge
//! validator, and runs transactions through the typed protocol.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use shared_types::{
    Block, BlockHeight, KeyStore, PublicKey, Transaction, TransactionId, ValidationContext,
};
use tracing::{debug, warn};

use crate::config::NetworkConfig;
use crate::domain::{BotName, Erc20Hash, ValidationError};
use crate::ports::inbound::TransactionProtocolApi;
use crate::ports::outbound::{CoinOutputLookup, Erc20WithdrawValidator, TransactionRegistry};
use crate::transactions::{is_known_version, MinerPayout, TypedTransaction};

/// Names, keys and ERC20 ids claimed by earlier transactions of a block.
///
/// The registries only know committed blocks, so two transactions of the
/// same block could otherwise both pass against the same free name or key.
#[derive(Default)]
struct BlockClaims {
    names: HashSet<BotName>,
    bot_keys: HashSet<PublicKey>,
    erc20_keys: HashSet<PublicKey>,
    erc20_txids: HashMap<Erc20Hash, TransactionId>,
}

impl BlockClaims {
    fn claim(&mut self, tx: &TypedTransaction, txid: TransactionId) -> Result<(), ValidationError> {
        match tx {
            TypedTransaction::BotRegistration(reg) => {
                if !self.bot_keys.insert(reg.identification.public_key.clone()) {
                    return Err(ValidationError::BotKeyAlreadyRegistered);
                }
                self.claim_names(&reg.names)
            }
            TypedTransaction::BotRecordUpdate(update) => self.claim_names(&update.names.add),
            TypedTransaction::BotNameTransfer(transfer) => self.claim_names(&transfer.names),
            TypedTransaction::Erc20AddressRegistration(reg) => {
                if !self.erc20_keys.insert(reg.public_key.clone()) {
                    return Err(ValidationError::Erc20AddressAlreadyRegistered);
                }
                Ok(())
            }
            TypedTransaction::Erc20CoinCreation(cc) => {
                match self.erc20_txids.insert(cc.transaction_id, txid) {
                    Some(first) => Err(ValidationError::Erc20TransactionAlreadyMapped {
                        erc20_txid: cc.transaction_id,
                        txid: first,
                    }),
                    None => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }

    fn claim_names(&mut self, names: &[BotName]) -> Result<(), ValidationError> {
        for name in names {
            if !self.names.insert(name.clone()) {
                return Err(ValidationError::BotNameAlreadyRegistered { name: name.clone() });
            }
        }
        Ok(())
    }
}

/// Typed transaction protocol over a registry and a bridge validator.
pub struct TransactionProtocolService<R, W>
where
    R: TransactionRegistry,
    W: Erc20WithdrawValidator,
{
    config: NetworkConfig,
    registry: Arc<R>,
    withdrawals: Arc<W>,
}

impl<R, W> TransactionProtocolService<R, W>
where
    R: TransactionRegistry,
    W: Erc20WithdrawValidator,
{
    pub fn new(config: NetworkConfig, registry: Arc<R>, withdrawals: Arc<W>) -> Self {
        Self {
            config,
            registry,
            withdrawals,
        }
    }

    pub fn registry(&self) -> &Arc<R> {
        &self.registry
    }
}

#[async_trait]
impl<R, W> TransactionProtocolApi for TransactionProtocolService<R, W>
where
    R: TransactionRegistry + 'static,
    W: Erc20WithdrawValidator + 'static,
{
    fn network(&self) -> &NetworkConfig {
        &self.config
    }

    fn decode_transaction(&self, tx: &Transaction) -> Result<TypedTransaction, ValidationError> {
        if !is_known_version(tx.version) {
            return Err(ValidationError::UnknownVersion { version: tx.version });
        }
        Ok(TypedTransaction::from_transaction(tx)?)
    }

    async fn validate_transaction(
        &self,
        tx: &TypedTransaction,
        ctx: ValidationContext,
    ) -> Result<(), ValidationError> {
        let result = tx
            .validate(&ctx, &self.config, &*self.registry, &*self.withdrawals)
            .await;
        if let Err(ref e) = result {
            debug!(
                "[tc-01] rejected {} transaction {} at height {}: {}",
                tx.kind(),
                tx.id(),
                ctx.block_height,
                e
            );
        }
        result
    }

    async fn validate_block(
        &self,
        block: &Block,
        height: BlockHeight,
    ) -> Result<Vec<TypedTransaction>, ValidationError> {
        let ctx = ValidationContext::new(height, block.timestamp);
        let mut typed = Vec::with_capacity(block.transactions.len());
        let mut claims = BlockClaims::default();

        for tx in &block.transactions {
            let t = self.decode_transaction(tx)?;
            if let Err(e) = claims.claim(&t, tx.id()) {
                warn!(
                    "[tc-01] {} transaction {} conflicts with block {}: {}",
                    t.kind(),
                    tx.id(),
                    block.id(),
                    e
                );
                return Err(e);
            }
            self.validate_transaction(&t, ctx).await?;
            typed.push(t);
        }
        debug!(
            "[tc-01] validated {} transactions of block {} at height {}",
            typed.len(),
            block.id(),
            height
        );
        Ok(typed)
    }

    fn validate_coin_outputs(
        &self,
        tx: &TypedTransaction,
        ctx: ValidationContext,
        coin_outputs: &dyn CoinOutputLookup,
    ) -> Result<(), ValidationError> {
        tx.validate_coin_outputs(&ctx, &self.config, coin_outputs)
    }

    fn sign_transaction(
        &self,
        tx: &mut TypedTransaction,
        keys: &dyn KeyStore,
        coin_outputs: &dyn CoinOutputLookup,
    ) -> Result<bool, ValidationError> {
        tx.sign(keys, &*self.registry, coin_outputs)
    }

    fn miner_payouts(&self, tx: &TypedTransaction) -> Vec<MinerPayout> {
        tx.custom_miner_payouts(&self.config)
    }
}
