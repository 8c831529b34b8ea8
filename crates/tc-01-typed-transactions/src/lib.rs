//! # Typed Transactions (tc-01)
//!
//! Extends the generic transaction format with typed transactions selected
//! by the version byte: coin minting under a changeable mint condition,
//! 3bot registry management and the ERC20 bridge.
//!
//! ## Transaction Kinds
//!
//! | Kind | Effect |
//! |------|--------|
//! | Minter definition | replaces the mint condition from the next block on |
//! | Coin creation | mints coins, fulfilling the active mint condition |
//! | Bot registration | creates a bot record with names, addresses and prepaid months |
//! | Bot record update | changes names/addresses and extends the expiration |
//! | Bot name transfer | moves names between two active bots, signed by both |
//! | ERC20 convert | burns coins for ERC20 tokens |
//! | ERC20 coin creation | mints coins for a confirmed ERC20 withdrawal |
//! | ERC20 address registration | derives and registers an ERC20 address for a key |
//!
//! ## Hexagonal Architecture
//!
//! - **Domain Layer** (`domain/`): names, addresses, bot records, fees
//! - **Transactions** (`transactions/`): wire layouts, signatures, validation
//! - **Ports Layer** (`ports/`): registries and bridge validator (outbound),
//!   protocol API (inbound)
//! - **Service** (`service.rs`): binds a network to its registries
//!
//! ## Invariants
//!
//! - A bot name has at most one active owner
//! - A bot never holds more than 5 names or 10 network addresses
//! - A bot is never paid up more than 24 months ahead
//! - An ERC20 withdrawal is minted at most once

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;
pub mod transactions;

pub use config::NetworkConfig;
pub use domain::{
    BotId, BotLookup, BotName, BotRecord, CompactTimestamp, EntityError, Erc20Address, Erc20Hash,
    NetworkAddress, NetworkAddressType, RegistryError, TransactionNonce, ValidationError,
};
pub use ports::{
    BotRecordReadRegistry, CoinOutputLookup, Erc20Registry, Erc20WithdrawValidator,
    InMemoryRegistry, MintConditionGetter, MockErc20WithdrawValidator, MockWithdrawal,
    NopErc20WithdrawValidator, TransactionProtocolApi, TransactionRegistry,
};
pub use service::TransactionProtocolService;
pub use transactions::{
    BotNameTransferTransaction, BotRecordUpdateTransaction, BotRegistrationTransaction,
    CoinCreationTransaction, Erc20AddressRegistrationTransaction, Erc20CoinCreationTransaction,
    Erc20ConvertTransaction, MinerPayout, MinterDefinitionTransaction, TypedTransaction,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
