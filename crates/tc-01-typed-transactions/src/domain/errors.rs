//! # Error Types
//!
//! Entity, registry and validation errors of the typed transaction protocol.

use shared_types::{CodecError, ConditionError, CoinOutputId, Currency, TransactionId, UnlockHash};
use thiserror::Error;

use super::bot_name::BotName;
use super::bot_record::{BotId, BotRecord};
use super::erc20::Erc20Hash;
use super::network_address::NetworkAddress;

/// Construction and mutation errors of the domain entities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    #[error("nil bot name")]
    NilBotName,

    #[error("bot name is too long: {length} bytes")]
    BotNameTooLong { length: usize },

    #[error("invalid bot name {name:?}")]
    InvalidBotName { name: String },

    #[error("nil network address")]
    NilNetworkAddress,

    #[error("hostname is too long: {length} bytes")]
    HostnameTooLong { length: usize },

    #[error("invalid network address {address:?}")]
    InvalidNetworkAddress { address: String },

    #[error("a bot cannot have more than 5 names")]
    TooManyNames,

    #[error("a bot cannot have more than 10 network addresses")]
    TooManyAddresses,

    #[error("bot name {name} is already owned by this bot")]
    NameNotUnique { name: BotName },

    #[error("bot name {name} is not owned by this bot")]
    NameNotFound { name: BotName },

    #[error("network address {address} is already used by this bot")]
    AddressNotUnique { address: NetworkAddress },

    #[error("network address {address} is not used by this bot")]
    AddressNotFound { address: NetworkAddress },

    #[error("cannot extend the expiration of a bot beyond 24 months")]
    ExpirationExtendOverflow,

    #[error("cannot extend the expiration of a bot by zero months")]
    ZeroMonths,

    #[error("record update of expired bot {id} does not make it active again (requires months to be paid)")]
    ExpiredWithoutReactivation { id: BotId },

    #[error("{role} bot {id} is inactive")]
    InactiveBot { role: &'static str, id: BotId },

    #[error("invalid bot id {input:?}: {reason}")]
    InvalidBotId { input: String, reason: String },

    #[error("{input:?} is neither a bot id, a bot name nor a public key")]
    InvalidBotLookup { input: String },
}

/// Errors returned by the read registries.
///
/// Not found and expired are distinct so callers can allow re-registration
/// of an expired name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("3bot not found")]
    BotNotFound { id: BotId },

    #[error("3bot public key not found")]
    BotKeyNotFound,

    #[error("3bot name not found")]
    BotNameNotFound,

    /// The name's last owner is expired; the record is returned for diagnostics.
    #[error("3bot name expired")]
    BotNameExpired { record: Box<BotRecord> },

    /// Storage or corruption failure behind the registry.
    #[error("registry failure: {0}")]
    Internal(String),
}

/// Business rule violations, raised before a transaction is admitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("miner fee {fee} is below the minimum of {minimum}")]
    TooSmallMinerFee { fee: Currency, minimum: Currency },

    #[error("coin output {parent_id} is spent more than once")]
    DoubleSpend { parent_id: CoinOutputId },

    #[error("fee-paying transaction requires at least one coin input")]
    NoCoinInputs,

    #[error("refund coin output cannot have a zero value")]
    ZeroRefund,

    #[error("bot key is already registered")]
    BotKeyAlreadyRegistered,

    #[error("bot name {name} is already registered")]
    BotNameAlreadyRegistered { name: BotName },

    #[error("number of prepaid months must be between 1 and 24, got {months}")]
    InvalidMonths { months: u8 },

    #[error("bot registration requires at least one name or network address")]
    EmptyRegistration,

    #[error("duplicate bot name {name} in transaction")]
    DuplicateName { name: BotName },

    #[error("duplicate network address {address} in transaction")]
    DuplicateAddress { address: NetworkAddress },

    #[error("bot record update does not change anything")]
    NoOpUpdate,

    #[error("sender and receiver of a name transfer cannot be the same bot ({id})")]
    SelfTransfer { id: BotId },

    #[error("bot name transfer requires at least one name")]
    NoNamesTransferred,

    #[error("ERC20 requires a minimum value of 1000 TFT to be converted")]
    ConversionBelowMinimum { value: Currency, minimum: Currency },

    #[error("invalid ERC20 Address Registration fee: {fee} (expected {expected})")]
    InvalidRegistrationFee { fee: Currency, expected: Currency },

    #[error("public key has already registered an ERC20 address")]
    Erc20AddressAlreadyRegistered,

    #[error("Address {address} is not registered as an ERC20 withdrawal address")]
    AddressNotRegistered { address: UnlockHash },

    #[error("ERC20 Tx ID {erc20_txid} already mapped to TFT Tx ID {txid}")]
    Erc20TransactionAlreadyMapped {
        erc20_txid: Erc20Hash,
        txid: TransactionId,
    },

    #[error("nil address is not allowed")]
    NilAddress,

    #[error("zero value is not allowed")]
    ZeroValue,

    #[error("ERC20 withdrawal could not be validated: {0}")]
    WithdrawValidation(String),

    #[error("nonce cannot be zero")]
    ZeroNonce,

    #[error("invalid mint condition: {reason}")]
    InvalidMintCondition { reason: String },

    #[error("transaction of {size} bytes exceeds the block size limit of {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("arbitrary data of {size} bytes exceeds the limit of {limit}")]
    ArbitraryDataTooLarge { size: usize, limit: usize },

    #[error("coin inputs ({inputs}) do not equal coin outputs plus fees ({outputs})")]
    UnbalancedFunds { inputs: Currency, outputs: Currency },

    #[error("coin input {parent_id} spends an unknown coin output")]
    UnknownCoinOutput { parent_id: CoinOutputId },

    #[error("unsupported transaction version {version}")]
    UnknownVersion { version: u8 },

    #[error(transparent)]
    Condition(#[from] ConditionError),

    #[error(transparent)]
    Entity(#[from] EntityError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}
