//! Index configuration.

use shared_types::UnlockCondition;

/// Configuration of a [`crate::TransactionIndex`].
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Mint condition stored at height 0; must match on every reopen.
    pub genesis_mint_condition: UnlockCondition,
    /// fsync every committed consensus change.
    pub sync_writes: bool,
    /// On-disk storage; `None` keeps the index in memory.
    pub rocksdb: Option<RocksDbConfig>,
}

impl IndexConfig {
    pub fn new(genesis_mint_condition: UnlockCondition) -> Self {
        Self {
            genesis_mint_condition,
            sync_writes: true,
            rocksdb: None,
        }
    }

    pub fn with_rocksdb(mut self, rocksdb: RocksDbConfig) -> Self {
        self.sync_writes = rocksdb.sync_writes;
        self.rocksdb = Some(rocksdb);
        self
    }

    /// RocksDB settings with `sync_writes` applied.
    pub fn rocksdb_config(&self) -> Option<RocksDbConfig> {
        self.rocksdb.clone().map(|mut config| {
            config.sync_writes = self.sync_writes;
            config
        })
    }
}

/// RocksDB tuning for the index store.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Path to the database directory
    pub path: String,
    /// Block cache size in bytes (default: 64MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 16MB)
    pub write_buffer_size: usize,
    /// Maximum number of write buffers (default: 2)
    pub max_write_buffer_number: i32,
    /// Enable fsync after each write (default: true for durability)
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: "./data/transactiondb".to_string(),
            block_cache_size: 64 * 1024 * 1024,  // 64MB
            write_buffer_size: 16 * 1024 * 1024, // 16MB
            max_write_buffer_number: 2,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Create config for testing (smaller buffers, no sync)
    pub fn for_testing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 4 * 1024 * 1024,  // 4MB
            write_buffer_size: 1024 * 1024,     // 1MB
            max_write_buffer_number: 2,
            sync_writes: false,
        }
    }
}
