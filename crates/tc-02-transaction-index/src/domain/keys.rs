//! # Key Layout
//!
//! Every bucket of the index is a two-byte key prefix in one flat
//! key-value space. Integers in keys are big-endian so that prefix scans
//! return entries in numeric order.
//!
//! | Prefix | Key suffix | Value |
//! |--------|------------|-------|
//! | `mc` | height | mint condition |
//! | `br` | bot id | bot record |
//! | `bk` | public key | bot id |
//! | `bn` | bot name | bot id |
//! | `bt` | bot id, height, sequence | transaction id |
//! | `bj` | transaction id | implicit update |
//! | `bd` | transaction id | names taken over from expired bots |
//! | `ea` | TFT address | ERC20 address |
//! | `et` | ERC20 address | TFT address |
//! | `ex` | ERC20 transaction id | transaction id |
//! | `ht` | height | block timestamp |
//! | `in` | name | header, version, stats, bot id counter |

use shared_types::{BlockHeight, Encode, PublicKey, TransactionId, UnlockHash};
use tc_01_typed_transactions::{BotId, BotName, Erc20Address, Erc20Hash};

/// Bucket prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPrefix {
    MintCondition,
    BotRecord,
    BotKey,
    BotName,
    BotTransaction,
    ImplicitUpdate,
    DisplacedNames,
    Erc20AddressByTft,
    TftAddressByErc20,
    Erc20Transaction,
    BlockTime,
    Internal,
}

impl KeyPrefix {
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            KeyPrefix::MintCondition => b"mc",
            KeyPrefix::BotRecord => b"br",
            KeyPrefix::BotKey => b"bk",
            KeyPrefix::BotName => b"bn",
            KeyPrefix::BotTransaction => b"bt",
            KeyPrefix::ImplicitUpdate => b"bj",
            KeyPrefix::DisplacedNames => b"bd",
            KeyPrefix::Erc20AddressByTft => b"ea",
            KeyPrefix::TftAddressByErc20 => b"et",
            KeyPrefix::Erc20Transaction => b"ex",
            KeyPrefix::BlockTime => b"ht",
            KeyPrefix::Internal => b"in",
        }
    }

    pub fn key(&self, suffix: &[u8]) -> Vec<u8> {
        let mut key = self.as_bytes().to_vec();
        key.extend_from_slice(suffix);
        key
    }

    pub fn mint_condition_key(height: BlockHeight) -> Vec<u8> {
        KeyPrefix::MintCondition.key(&height.to_be_bytes())
    }

    /// Inverse of [`KeyPrefix::mint_condition_key`].
    pub fn height_from_mint_condition_key(key: &[u8]) -> Option<BlockHeight> {
        let suffix = key.strip_prefix(KeyPrefix::MintCondition.as_bytes())?;
        Some(BlockHeight::from_be_bytes(suffix.try_into().ok()?))
    }

    pub fn record_key(id: BotId) -> Vec<u8> {
        KeyPrefix::BotRecord.key(&id.0.to_be_bytes())
    }

    pub fn bot_key_key(key: &PublicKey) -> Vec<u8> {
        KeyPrefix::BotKey.key(&key.to_bytes())
    }

    pub fn bot_name_key(name: &BotName) -> Vec<u8> {
        KeyPrefix::BotName.key(name.as_str().as_bytes())
    }

    /// Prefix of all transaction entries of one bot.
    pub fn bot_transactions_prefix(id: BotId) -> Vec<u8> {
        KeyPrefix::BotTransaction.key(&id.0.to_be_bytes())
    }

    /// Sorts by chain position: height first, then position in the block.
    pub fn bot_transaction_key(id: BotId, height: BlockHeight, sequence: u16) -> Vec<u8> {
        let mut key = Self::bot_transactions_prefix(id);
        key.extend_from_slice(&height.to_be_bytes());
        key.extend_from_slice(&sequence.to_be_bytes());
        key
    }

    pub fn implicit_update_key(txid: &TransactionId) -> Vec<u8> {
        KeyPrefix::ImplicitUpdate.key(&txid.0)
    }

    pub fn displaced_names_key(txid: &TransactionId) -> Vec<u8> {
        KeyPrefix::DisplacedNames.key(&txid.0)
    }

    pub fn erc20_address_key(address: &UnlockHash) -> Vec<u8> {
        KeyPrefix::Erc20AddressByTft.key(&address.to_bytes())
    }

    pub fn tft_address_key(address: &Erc20Address) -> Vec<u8> {
        KeyPrefix::TftAddressByErc20.key(&address.0)
    }

    pub fn erc20_transaction_key(txid: &Erc20Hash) -> Vec<u8> {
        KeyPrefix::Erc20Transaction.key(&txid.0)
    }

    pub fn block_time_key(height: BlockHeight) -> Vec<u8> {
        KeyPrefix::BlockTime.key(&height.to_be_bytes())
    }

    pub fn internal_key(name: &str) -> Vec<u8> {
        KeyPrefix::Internal.key(name.as_bytes())
    }
}

/// Names of the entries under [`KeyPrefix::Internal`].
pub mod internal {
    pub const HEADER: &str = "header";
    pub const VERSION: &str = "version";
    pub const STATS: &str = "stats";
    pub const BOT_ID_COUNTER: &str = "botid";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_condition_keys_sort_by_height() {
        let low = KeyPrefix::mint_condition_key(255);
        let high = KeyPrefix::mint_condition_key(256);
        assert!(low < high);
        assert_eq!(KeyPrefix::height_from_mint_condition_key(&high), Some(256));
        assert_eq!(KeyPrefix::height_from_mint_condition_key(b"mc\x01"), None);
    }

    #[test]
    fn test_bot_transaction_keys_sort_by_chain_position() {
        let id = BotId(3);
        let a = KeyPrefix::bot_transaction_key(id, 10, 7);
        let b = KeyPrefix::bot_transaction_key(id, 11, 0);
        let c = KeyPrefix::bot_transaction_key(id, 11, 1);
        assert!(a < b && b < c);
        assert!(a.starts_with(&KeyPrefix::bot_transactions_prefix(id)));
        assert!(!a.starts_with(&KeyPrefix::bot_transactions_prefix(BotId(4))));
    }

    #[test]
    fn test_prefixes_are_distinct() {
        let prefixes = [
            KeyPrefix::MintCondition,
            KeyPrefix::BotRecord,
            KeyPrefix::BotKey,
            KeyPrefix::BotName,
            KeyPrefix::BotTransaction,
            KeyPrefix::ImplicitUpdate,
            KeyPrefix::DisplacedNames,
            KeyPrefix::Erc20AddressByTft,
            KeyPrefix::TftAddressByErc20,
            KeyPrefix::Erc20Transaction,
            KeyPrefix::BlockTime,
            KeyPrefix::Internal,
        ];
        let unique: std::collections::HashSet<_> = prefixes.iter().map(|p| p.as_bytes()).collect();
        assert_eq!(unique.len(), prefixes.len());
    }
}
