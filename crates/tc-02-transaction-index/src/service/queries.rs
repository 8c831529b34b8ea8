//! Registry views over the committed index.

use shared_types::{BlockHeight, Decode, PublicKey, TransactionId, UnlockCondition, UnlockHash};
use tc_01_typed_transactions::{
    BotId, BotName, BotRecord, BotRecordReadRegistry, Erc20Address, Erc20Hash, Erc20Registry,
    MintConditionGetter, RegistryError,
};

use super::TransactionIndex;
use crate::domain::{IndexError, KeyPrefix};
use crate::ports::outbound::KeyValueStore;

impl<KV: KeyValueStore> TransactionIndex<KV> {
    fn read<T: Decode>(&self, key: &[u8]) -> Result<Option<T>, IndexError> {
        let _guard = self.gate.enter()?;
        match self.store.read().get(key)? {
            Some(bytes) => Ok(Some(T::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Stored mint conditions, lowest height first.
    fn mint_conditions(&self) -> Result<Vec<(BlockHeight, UnlockCondition)>, IndexError> {
        let _guard = self.gate.enter()?;
        let entries = self
            .store
            .read()
            .prefix_scan(KeyPrefix::MintCondition.as_bytes())?;
        entries
            .into_iter()
            .map(|(key, value)| -> Result<_, IndexError> {
                let height = KeyPrefix::height_from_mint_condition_key(&key)
                    .ok_or_else(|| IndexError::corruption("malformed mint condition key"))?;
                Ok((height, UnlockCondition::from_bytes(&value)?))
            })
            .collect()
    }
}

impl<KV: KeyValueStore> MintConditionGetter for TransactionIndex<KV> {
    fn active_mint_condition(&self) -> Result<UnlockCondition, RegistryError> {
        self.mint_conditions()?
            .pop()
            .map(|(_, condition)| condition)
            .ok_or_else(|| IndexError::corruption("no mint condition stored").into())
    }

    fn mint_condition_at(&self, height: BlockHeight) -> Result<UnlockCondition, RegistryError> {
        self.mint_conditions()?
            .into_iter()
            .take_while(|(defined_at, _)| *defined_at <= height)
            .last()
            .map(|(_, condition)| condition)
            .ok_or_else(|| {
                IndexError::corruption(format!("no mint condition at height {}", height)).into()
            })
    }
}

impl<KV: KeyValueStore> BotRecordReadRegistry for TransactionIndex<KV> {
    fn record_for_id(&self, id: BotId) -> Result<BotRecord, RegistryError> {
        self.read(&KeyPrefix::record_key(id))?
            .ok_or(RegistryError::BotNotFound { id })
    }

    fn record_for_key(&self, key: &PublicKey) -> Result<BotRecord, RegistryError> {
        let id: BotId = self
            .read(&KeyPrefix::bot_key_key(key))?
            .ok_or(RegistryError::BotKeyNotFound)?;
        self.record_for_id(id)
    }

    fn record_for_name(&self, name: &BotName) -> Result<BotRecord, RegistryError> {
        let id: BotId = self
            .read(&KeyPrefix::bot_name_key(name))?
            .ok_or(RegistryError::BotNameNotFound)?;
        let record = self.record_for_id(id)?;
        if record.is_expired(self.stats.read().chain_time) {
            return Err(RegistryError::BotNameExpired {
                record: Box::new(record),
            });
        }
        Ok(record)
    }

    fn bot_transaction_ids(&self, id: BotId) -> Result<Vec<TransactionId>, RegistryError> {
        let _guard = self.gate.enter()?;
        let entries = self
            .store
            .read()
            .prefix_scan(&KeyPrefix::bot_transactions_prefix(id))
            .map_err(IndexError::from)?;
        let mut ids = Vec::with_capacity(entries.len());
        for (_, txid) in entries {
            ids.push(TransactionId::from_bytes(&txid).map_err(IndexError::from)?);
        }
        Ok(ids)
    }
}

impl<KV: KeyValueStore> Erc20Registry for TransactionIndex<KV> {
    fn erc20_address_for_tft_address(
        &self,
        address: &UnlockHash,
    ) -> Result<Option<Erc20Address>, RegistryError> {
        Ok(self.read(&KeyPrefix::erc20_address_key(address))?)
    }

    fn tft_address_for_erc20_address(
        &self,
        address: &Erc20Address,
    ) -> Result<Option<UnlockHash>, RegistryError> {
        Ok(self.read(&KeyPrefix::tft_address_key(address))?)
    }

    fn tft_transaction_id_for_erc20_transaction_id(
        &self,
        txid: &Erc20Hash,
    ) -> Result<Option<TransactionId>, RegistryError> {
        Ok(self.read(&KeyPrefix::erc20_transaction_key(txid))?)
    }
}
