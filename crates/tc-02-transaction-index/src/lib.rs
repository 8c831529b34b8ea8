//! # Transaction Index (tc-02)
//!
//! Persistent projection of the consensus change stream into the lookups
//! the typed transaction protocol needs: mint conditions by height, 3bot
//! records by id, key and name, and the ERC20 bridge mappings.
//!
//! ## Storage Layout
//!
//! One ordered key-value store, partitioned by two byte key prefixes (see
//! [`domain::KeyPrefix`]). Every consensus change is committed as a single
//! atomic batch together with the new cursor.
//!
//! ## Hexagonal Architecture
//!
//! - **Domain Layer** (`domain/`): key layout, stats, schema, revert journals
//! - **Ports Layer** (`ports/`): key-value store and consensus feed
//!   (outbound), index API (inbound)
//! - **Service** (`service/`): change processing, migrations, registry queries
//! - **Adapters** (`adapters/`): RocksDB store, directory lock, feed driver
//!
//! ## Invariants
//!
//! - Reverting a block and applying it again leaves the store unchanged
//! - The cursor never advances past a change that was not fully committed
//! - Bot ids are assigned sequentially from 1 and reused after a revert
//! - A name maps to at most one bot

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{DatabaseLock, LockError, SubscriptionDriver};
#[cfg(feature = "rocksdb")]
pub use adapters::RocksDbStore;
pub use config::{IndexConfig, RocksDbConfig};
pub use domain::{IndexError, IndexStats, KVStoreError, LookupError, SchemaVersion};
pub use ports::{
    BatchOperation, ConsensusSubscription, FailingKVStore, InMemoryKVStore, KeyValueStore,
    MockConsensusSubscription, TransactionIndexApi,
};
pub use service::TransactionIndex;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
