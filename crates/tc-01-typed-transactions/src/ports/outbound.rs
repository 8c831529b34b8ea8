//! # Outbound Ports
//!
//! Read registries the validators consult, and the ERC20 withdrawal
//! validator supplied by the bridge. The transaction index implements the
//! registries; remote clients may implement them over a query protocol.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use shared_types::{
    BlockHeight, CoinOutput, CoinOutputId, Currency, PublicKey, Timestamp, TransactionId,
    UnlockCondition, UnlockHash,
};

use crate::domain::{
    BotId, BotName, BotRecord, Erc20Address, Erc20Hash, RegistryError, ValidationError,
};

/// Mint condition history.
pub trait MintConditionGetter: Send + Sync {
    /// Condition of the highest stored height.
    fn active_mint_condition(&self) -> Result<UnlockCondition, RegistryError>;

    /// Condition active at `height`.
    fn mint_condition_at(&self, height: BlockHeight) -> Result<UnlockCondition, RegistryError>;
}

/// Bot record lookups.
pub trait BotRecordReadRegistry: Send + Sync {
    fn record_for_id(&self, id: BotId) -> Result<BotRecord, RegistryError>;

    fn record_for_key(&self, key: &PublicKey) -> Result<BotRecord, RegistryError>;

    /// Fails with [`RegistryError::BotNameExpired`] if the owning bot is expired.
    fn record_for_name(&self, name: &BotName) -> Result<BotRecord, RegistryError>;

    /// Ids of all transactions that touched `id`, in chain order.
    fn bot_transaction_ids(&self, id: BotId) -> Result<Vec<TransactionId>, RegistryError>;
}

/// ERC20 address and transaction mappings.
pub trait Erc20Registry: Send + Sync {
    fn erc20_address_for_tft_address(&self, address: &UnlockHash) -> Result<Option<Erc20Address>, RegistryError>;

    fn tft_address_for_erc20_address(&self, address: &Erc20Address) -> Result<Option<UnlockHash>, RegistryError>;

    fn tft_transaction_id_for_erc20_transaction_id(
        &self,
        txid: &Erc20Hash,
    ) -> Result<Option<TransactionId>, RegistryError>;
}

/// Confirms a withdrawal event on the ERC20 side.
///
/// Must fail unless the event exists, address and amount match exactly, and
/// it has enough confirmations.
#[async_trait]
pub trait Erc20WithdrawValidator: Send + Sync {
    async fn validate_withdraw_tx(
        &self,
        block_id: Erc20Hash,
        tx_id: Erc20Hash,
        expected_address: Erc20Address,
        expected_amount: Currency,
    ) -> Result<(), ValidationError>;
}

/// Every registry a typed transaction may consult.
pub trait TransactionRegistry: MintConditionGetter + BotRecordReadRegistry + Erc20Registry {}

impl<T: MintConditionGetter + BotRecordReadRegistry + Erc20Registry> TransactionRegistry for T {}

/// Unspent coin outputs, as known to the caller (consensus set or wallet).
pub trait CoinOutputLookup {
    fn coin_output(&self, id: &CoinOutputId) -> Option<CoinOutput>;
}

impl CoinOutputLookup for HashMap<CoinOutputId, CoinOutput> {
    fn coin_output(&self, id: &CoinOutputId) -> Option<CoinOutput> {
        self.get(id).cloned()
    }
}

impl<T: MintConditionGetter + ?Sized> MintConditionGetter for Arc<T> {
    fn active_mint_condition(&self) -> Result<UnlockCondition, RegistryError> {
        (**self).active_mint_condition()
    }

    fn mint_condition_at(&self, height: BlockHeight) -> Result<UnlockCondition, RegistryError> {
        (**self).mint_condition_at(height)
    }
}

impl<T: BotRecordReadRegistry + ?Sized> BotRecordReadRegistry for Arc<T> {
    fn record_for_id(&self, id: BotId) -> Result<BotRecord, RegistryError> {
        (**self).record_for_id(id)
    }

    fn record_for_key(&self, key: &PublicKey) -> Result<BotRecord, RegistryError> {
        (**self).record_for_key(key)
    }

    fn record_for_name(&self, name: &BotName) -> Result<BotRecord, RegistryError> {
        (**self).record_for_name(name)
    }

    fn bot_transaction_ids(&self, id: BotId) -> Result<Vec<TransactionId>, RegistryError> {
        (**self).bot_transaction_ids(id)
    }
}

impl<T: Erc20Registry + ?Sized> Erc20Registry for Arc<T> {
    fn erc20_address_for_tft_address(&self, address: &UnlockHash) -> Result<Option<Erc20Address>, RegistryError> {
        (**self).erc20_address_for_tft_address(address)
    }

    fn tft_address_for_erc20_address(&self, address: &Erc20Address) -> Result<Option<UnlockHash>, RegistryError> {
        (**self).tft_address_for_erc20_address(address)
    }

    fn tft_transaction_id_for_erc20_transaction_id(
        &self,
        txid: &Erc20Hash,
    ) -> Result<Option<TransactionId>, RegistryError> {
        (**self).tft_transaction_id_for_erc20_transaction_id(txid)
    }
}

#[async_trait]
impl<T: Erc20WithdrawValidator + ?Sized> Erc20WithdrawValidator for Arc<T> {
    async fn validate_withdraw_tx(
        &self,
        block_id: Erc20Hash,
        tx_id: Erc20Hash,
        expected_address: Erc20Address,
        expected_amount: Currency,
    ) -> Result<(), ValidationError> {
        (**self)
            .validate_withdraw_tx(block_id, tx_id, expected_address, expected_amount)
            .await
    }
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Registry kept in plain maps, for validators tested without an index.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    pub chain_time: Timestamp,
    pub mint_conditions: BTreeMap<BlockHeight, UnlockCondition>,
    pub records: BTreeMap<BotId, BotRecord>,
    pub keys: HashMap<PublicKey, BotId>,
    pub names: HashMap<BotName, BotId>,
    pub bot_transactions: HashMap<BotId, Vec<TransactionId>>,
    pub erc20_addresses: HashMap<UnlockHash, Erc20Address>,
    pub erc20_transactions: HashMap<Erc20Hash, TransactionId>,
}

impl InMemoryRegistry {
    pub fn new(genesis_mint_condition: UnlockCondition) -> Self {
        let mut registry = Self::default();
        registry.mint_conditions.insert(0, genesis_mint_condition);
        registry
    }

    /// Store a record and index its key and names.
    pub fn insert_record(&mut self, record: BotRecord) {
        self.keys.insert(record.public_key.clone(), record.id);
        for name in &record.names {
            self.names.insert(name.clone(), record.id);
        }
        self.records.insert(record.id, record);
    }

    pub fn register_erc20_address(&mut self, address: UnlockHash) -> Erc20Address {
        let erc20 = Erc20Address::from_unlock_hash(&address);
        self.erc20_addresses.insert(address, erc20);
        erc20
    }
}

impl MintConditionGetter for InMemoryRegistry {
    fn active_mint_condition(&self) -> Result<UnlockCondition, RegistryError> {
        self.mint_conditions
            .values()
            .next_back()
            .cloned()
            .ok_or_else(|| RegistryError::Internal("no mint condition".into()))
    }

    fn mint_condition_at(&self, height: BlockHeight) -> Result<UnlockCondition, RegistryError> {
        self.mint_conditions
            .range(..=height)
            .next_back()
            .map(|(_, c)| c.clone())
            .ok_or_else(|| RegistryError::Internal(format!("no mint condition at height {}", height)))
    }
}

impl BotRecordReadRegistry for InMemoryRegistry {
    fn record_for_id(&self, id: BotId) -> Result<BotRecord, RegistryError> {
        self.records
            .get(&id)
            .cloned()
            .ok_or(RegistryError::BotNotFound { id })
    }

    fn record_for_key(&self, key: &PublicKey) -> Result<BotRecord, RegistryError> {
        let id = self.keys.get(key).ok_or(RegistryError::BotKeyNotFound)?;
        self.record_for_id(*id)
    }

    fn record_for_name(&self, name: &BotName) -> Result<BotRecord, RegistryError> {
        let id = self.names.get(name).ok_or(RegistryError::BotNameNotFound)?;
        let record = self.record_for_id(*id)?;
        if record.is_expired(self.chain_time) {
            return Err(RegistryError::BotNameExpired {
                record: Box::new(record),
            });
        }
        Ok(record)
    }

    fn bot_transaction_ids(&self, id: BotId) -> Result<Vec<TransactionId>, RegistryError> {
        Ok(self.bot_transactions.get(&id).cloned().unwrap_or_default())
    }
}

impl Erc20Registry for InMemoryRegistry {
    fn erc20_address_for_tft_address(&self, address: &UnlockHash) -> Result<Option<Erc20Address>, RegistryError> {
        Ok(self.erc20_addresses.get(address).copied())
    }

    fn tft_address_for_erc20_address(&self, address: &Erc20Address) -> Result<Option<UnlockHash>, RegistryError> {
        Ok(self
            .erc20_addresses
            .iter()
            .find(|(_, erc20)| *erc20 == address)
            .map(|(tft, _)| *tft))
    }

    fn tft_transaction_id_for_erc20_transaction_id(
        &self,
        txid: &Erc20Hash,
    ) -> Result<Option<TransactionId>, RegistryError> {
        Ok(self.erc20_transactions.get(txid).copied())
    }
}

/// Accepts every withdrawal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopErc20WithdrawValidator;

#[async_trait]
impl Erc20WithdrawValidator for NopErc20WithdrawValidator {
    async fn validate_withdraw_tx(
        &self,
        _block_id: Erc20Hash,
        _tx_id: Erc20Hash,
        _expected_address: Erc20Address,
        _expected_amount: Currency,
    ) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// A withdrawal event as the bridge would observe it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockWithdrawal {
    pub block_id: Erc20Hash,
    pub address: Erc20Address,
    pub amount: Currency,
    pub confirmations: u64,
}

/// Validator over a fixed set of withdrawal events.
#[derive(Debug, Clone, Default)]
pub struct MockErc20WithdrawValidator {
    pub withdrawals: HashMap<Erc20Hash, MockWithdrawal>,
    pub required_confirmations: u64,
}

#[async_trait]
impl Erc20WithdrawValidator for MockErc20WithdrawValidator {
    async fn validate_withdraw_tx(
        &self,
        block_id: Erc20Hash,
        tx_id: Erc20Hash,
        expected_address: Erc20Address,
        expected_amount: Currency,
    ) -> Result<(), ValidationError> {
        let fail = |reason: String| Err(ValidationError::WithdrawValidation(reason));
        let Some(w) = self.withdrawals.get(&tx_id) else {
            return fail(format!("no withdrawal event for tx {}", tx_id));
        };
        if w.block_id != block_id {
            return fail(format!("tx {} is not in block {}", tx_id, block_id));
        }
        if w.address != expected_address {
            return fail(format!("withdrawal address is {}, expected {}", w.address, expected_address));
        }
        if w.amount != expected_amount {
            return fail(format!("withdrawal amount is {}, expected {}", w.amount, expected_amount));
        }
        if w.confirmations < self.required_confirmations {
            return fail(format!(
                "withdrawal has {} confirmations, {} required",
                w.confirmations, self.required_confirmations
            ));
        }
        Ok(())
    }
}
