//! # Adapters
//!
//! - `lock`: exclusive process lock on an index directory
//! - `rocksdb`: on-disk store (`rocksdb` feature)
//! - `subscription`: drives the index from a consensus change feed

pub mod lock;
#[cfg(feature = "rocksdb")]
pub mod rocksdb;
pub mod subscription;

pub use lock::{DatabaseLock, LockError};
#[cfg(feature = "rocksdb")]
pub use self::rocksdb::RocksDbStore;
pub use subscription::SubscriptionDriver;
