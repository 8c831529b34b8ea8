//! # Transaction Index Service
//!
//! Folds the consensus change feed into the index. Each change is staged
//! over the committed state and written as one atomic batch together with
//! the new cursor, so the index is always at a change boundary.
//!
//! ## Concurrency
//!
//! One change is processed at a time. Queries read the committed state
//! concurrently and never observe a partially applied change.

mod handlers;
mod migrations;
mod overlay;
mod queries;
mod shutdown;


use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use shared_types::{Block, ConsensusChange, Timestamp};
use tc_01_typed_transactions::{BotLookup, BotRecord, BotRecordReadRegistry};
use tc_telemetry::IndexMetrics;
use tracing::{debug, error, info};

use crate::config::IndexConfig;
use crate::domain::keys::internal;
use crate::domain::{IndexError, IndexStats, KeyPrefix, LookupError};
use crate::ports::inbound::TransactionIndexApi;
use crate::ports::outbound::{InMemoryKVStore, KeyValueStore};
use handlers::TxContext;
use overlay::StagedWrites;
use shutdown::ShutdownGate;

/// Persistent index of mint conditions, bot records and ERC20 mappings.
///
/// Implements the registry traits of the typed transaction protocol, so it
/// can back a `TransactionProtocolService` directly.
pub struct TransactionIndex<KV: KeyValueStore> {
    store: RwLock<KV>,
    stats: RwLock<IndexStats>,
    gate: ShutdownGate,
    metrics: &'static IndexMetrics,
}

impl<KV: KeyValueStore> TransactionIndex<KV> {
    /// Open the index in `store`, creating or migrating it as needed.
    ///
    /// Fails with [`IndexError::GenesisMismatch`] if the store was created
    /// for another network.
    pub fn open(mut store: KV, config: &IndexConfig) -> Result<Self, IndexError> {
        let stats = migrations::open_or_create(&mut store, &config.genesis_mint_condition)?;
        let metrics = IndexMetrics::global();
        metrics.height.set(i64::try_from(stats.height).unwrap_or(i64::MAX));
        Ok(Self {
            store: RwLock::new(store),
            stats: RwLock::new(stats),
            gate: ShutdownGate::new(),
            metrics,
        })
    }

    /// Look up a bot by id, name or public key, in that order of preference.
    pub fn lookup_record(&self, input: &str) -> Result<BotRecord, LookupError> {
        let record = match BotLookup::parse(input)? {
            BotLookup::Id(id) => self.record_for_id(id)?,
            BotLookup::Name(name) => self.record_for_name(&name)?,
            BotLookup::PublicKey(key) => self.record_for_key(&key)?,
        };
        Ok(record)
    }

    fn commit(&self, change: &ConsensusChange) -> Result<IndexStats, IndexError> {
        // excludes other writers, not readers, until the batch is ready
        let store = self.store.upgradable_read();
        let mut stats = *self.stats.read();

        let operations = {
            let mut staged = StagedWrites::new(&*store);
            stage_change(&mut staged, &mut stats, change)?;
            staged.put_encoded(KeyPrefix::internal_key(internal::STATS), &stats);
            staged.into_operations()
        };

        let mut store = RwLockUpgradableReadGuard::upgrade(store);
        store.atomic_batch_write(operations)?;
        *self.stats.write() = stats;
        Ok(stats)
    }
}

impl TransactionIndex<InMemoryKVStore> {
    /// Volatile index, for tests and light tooling.
    pub fn open_in_memory(config: &IndexConfig) -> Result<Self, IndexError> {
        Self::open(InMemoryKVStore::new(), config)
    }
}

#[cfg(feature = "rocksdb")]
impl TransactionIndex<crate::adapters::RocksDbStore> {
    /// Open the on-disk index described by `config`, with default RocksDB
    /// settings if it names none.
    pub fn open_rocksdb(config: &IndexConfig) -> Result<Self, IndexError> {
        let rocksdb = config
            .rocksdb_config()
            .unwrap_or_else(|| crate::config::RocksDbConfig {
                sync_writes: config.sync_writes,
                ..Default::default()
            });
        let store = crate::adapters::RocksDbStore::open(&rocksdb)?;
        Self::open(store, config)
    }
}

impl<KV: KeyValueStore> TransactionIndexApi for TransactionIndex<KV> {
    fn process_consensus_change(&self, change: &ConsensusChange) -> Result<(), IndexError> {
        let _guard = self.gate.enter()?;
        let was_synced = self.stats.read().synced;

        match self.commit(change) {
            Ok(stats) => {
                self.metrics.record_change(
                    change.reverted_blocks.len(),
                    change.applied_blocks.len(),
                    stats.height,
                );
                debug!(
                    "[tc-02] consensus change {}: -{} +{} blocks, height {}",
                    change.id,
                    change.reverted_blocks.len(),
                    change.applied_blocks.len(),
                    stats.height
                );
                if stats.synced && !was_synced {
                    info!("[tc-02] transaction index synced at height {}", stats.height);
                }
                Ok(())
            }
            Err(e) => {
                self.metrics.record_failure();
                error!("[tc-02] consensus change {} not indexed: {}", change.id, e);
                Err(e)
            }
        }
    }

    fn stats(&self) -> IndexStats {
        *self.stats.read()
    }

    fn close(&self) {
        self.gate.close();
        info!("[tc-02] transaction index closed");
    }
}

// ============================================================================
// Change Staging
// ============================================================================

/// Stage the effects of `change` and advance `stats` accordingly.
fn stage_change<KV: KeyValueStore + ?Sized>(
    w: &mut StagedWrites<'_, KV>,
    stats: &mut IndexStats,
    change: &ConsensusChange,
) -> Result<(), IndexError> {
    for block in &change.reverted_blocks {
        revert_block(w, stats, block)?;
    }
    for block in &change.applied_blocks {
        apply_block(w, stats, block)?;
    }
    stats.cursor = change.id;
    stats.synced = change.synced;
    Ok(())
}

fn apply_block<KV: KeyValueStore + ?Sized>(
    w: &mut StagedWrites<'_, KV>,
    stats: &mut IndexStats,
    block: &Block,
) -> Result<(), IndexError> {
    stats.height += 1;
    stats.chain_time = block.timestamp;
    w.put(
        KeyPrefix::block_time_key(stats.height),
        block.timestamp.to_le_bytes().to_vec(),
    );

    for (i, tx) in block.transactions.iter().enumerate() {
        let ctx = TxContext {
            height: stats.height,
            block_time: block.timestamp,
            sequence: sequence(i)?,
            txid: tx.id(),
        };
        handlers::apply_transaction(w, &ctx, tx)?;
    }
    Ok(())
}

fn revert_block<KV: KeyValueStore + ?Sized>(
    w: &mut StagedWrites<'_, KV>,
    stats: &mut IndexStats,
    block: &Block,
) -> Result<(), IndexError> {
    if stats.height == 0 {
        return Err(IndexError::corruption(format!(
            "block {} reverted before any block was applied",
            block.id()
        )));
    }

    for (i, tx) in block.transactions.iter().enumerate().rev() {
        let ctx = TxContext {
            height: stats.height,
            block_time: block.timestamp,
            sequence: sequence(i)?,
            txid: tx.id(),
        };
        handlers::revert_transaction(w, &ctx, tx)?;
    }

    w.delete(KeyPrefix::block_time_key(stats.height));
    stats.height -= 1;
    // indexes migrated from 1.0 lack older block times
    stats.chain_time = block_time_at(w, stats.height)?.unwrap_or(block.timestamp);
    Ok(())
}

fn block_time_at<KV: KeyValueStore + ?Sized>(
    w: &StagedWrites<'_, KV>,
    height: u64,
) -> Result<Option<Timestamp>, IndexError> {
    match w.get(&KeyPrefix::block_time_key(height))? {
        None => Ok(None),
        Some(bytes) => {
            let bytes: [u8; 8] = bytes
                .as_slice()
                .try_into()
                .map_err(|_| IndexError::corruption(format!("block time at height {}", height)))?;
            Ok(Some(Timestamp::from_le_bytes(bytes)))
        }
    }
}

fn sequence(index: usize) -> Result<u16, IndexError> {
    u16::try_from(index)
        .map_err(|_| IndexError::corruption("block holds more than 65536 transactions"))
}
