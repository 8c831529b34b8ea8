//! # Domain Layer
//!
//! Value types stored in bot records and carried by the bridge transactions.

pub mod bot_name;
pub mod bot_record;
pub mod erc20;
pub mod errors;
pub mod fees;
pub mod network_address;
pub mod nonce;
pub mod timestamp;

pub use bot_name::BotName;
pub use bot_record::{
    BotId, BotLookup, BotRecord, BOT_MONTH, MAX_ADDRESSES_PER_BOT, MAX_BOT_PREPAID_MONTHS,
    MAX_NAMES_PER_BOT, MIN_BOT_ID,
};
pub use erc20::{Erc20Address, Erc20Hash};
pub use errors::{EntityError, RegistryError, ValidationError};
pub use network_address::{NetworkAddress, NetworkAddressType};
pub use nonce::TransactionNonce;
pub use timestamp::CompactTimestamp;
