//! # Outbound Ports (Driven Ports)
//!
//! Dependencies the transaction index requires from its host: an ordered
//! key-value store and the consensus change feed.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{ConsensusChange, ConsensusChangeId};
use tokio::sync::mpsc;

use crate::domain::errors::{IndexError, KVStoreError};

/// Key-value pairs returned by a prefix scan.
pub type ScanResult = Vec<(Vec<u8>, Vec<u8>)>;

/// Abstract interface for key-value database operations.
///
/// Production: `RocksDbStore` (adapters/rocksdb.rs, `rocksdb` feature)
/// Testing: `InMemoryKVStore` (below)
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// Check if a key exists.
    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.get(key)?.is_some())
    }

    /// All pairs whose key starts with `prefix`, in ascending key order.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError>;

    /// Execute an atomic batch write.
    ///
    /// Either all operations are applied, or none are.
    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError>;
}

/// Batch operation for atomic writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Delete a key.
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a Delete operation.
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete { key: key.into() }
    }
}

/// Ordered feed of consensus changes, replayable from a cursor.
#[async_trait]
pub trait ConsensusSubscription: Send + Sync {
    /// Deliver every change after `from` (all of them for
    /// [`ConsensusChangeId::BEGINNING`]), then every new one.
    async fn subscribe(
        &self,
        from: ConsensusChangeId,
    ) -> Result<mpsc::Receiver<ConsensusChange>, IndexError>;

    /// Stop delivering changes.
    async fn unsubscribe(&self);
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// In-memory key-value store, ordered like an on-disk store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryKVStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryKVStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        Ok(self
            .data
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    self.data.insert(key, value);
                }
                BatchOperation::Delete { key } => {
                    self.data.remove(&key);
                }
            }
        }
        Ok(())
    }
}

/// In-memory store whose batch writes fail while its switch is on.
#[derive(Debug, Default)]
pub struct FailingKVStore {
    inner: InMemoryKVStore,
    fail_writes: Arc<AtomicBool>,
}

impl FailingKVStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared switch; set it to make every following batch write fail.
    pub fn failure_switch(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.fail_writes)
    }
}

impl KeyValueStore for FailingKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        self.inner.get(key)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        self.inner.prefix_scan(prefix)
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(KVStoreError::IOError {
                message: "injected write failure".to_string(),
            });
        }
        self.inner.atomic_batch_write(operations)
    }
}

/// Consensus feed replaying a fixed list of changes.
///
/// The channel stays open after the replay unless `close_after_replay` is
/// set, so a driver only stops on shutdown or unsubscribe.
#[derive(Debug, Default)]
pub struct MockConsensusSubscription {
    changes: Vec<ConsensusChange>,
    close_after_replay: bool,
    sender: Mutex<Option<mpsc::Sender<ConsensusChange>>>,
    subscribed_from: Mutex<Option<ConsensusChangeId>>,
    unsubscribed: AtomicBool,
}

impl MockConsensusSubscription {
    pub fn new(changes: Vec<ConsensusChange>) -> Self {
        Self {
            changes,
            ..Default::default()
        }
    }

    pub fn closing(changes: Vec<ConsensusChange>) -> Self {
        Self {
            close_after_replay: true,
            ..Self::new(changes)
        }
    }

    pub fn subscribed_from(&self) -> Option<ConsensusChangeId> {
        *self.subscribed_from.lock()
    }

    pub fn is_unsubscribed(&self) -> bool {
        self.unsubscribed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConsensusSubscription for MockConsensusSubscription {
    async fn subscribe(
        &self,
        from: ConsensusChangeId,
    ) -> Result<mpsc::Receiver<ConsensusChange>, IndexError> {
        let start = if from == ConsensusChangeId::BEGINNING {
            0
        } else {
            self.changes
                .iter()
                .position(|c| c.id == from)
                .map(|i| i + 1)
                .ok_or_else(|| IndexError::Subscription(format!("unknown consensus change {}", from)))?
        };

        let pending = &self.changes[start..];
        let (tx, rx) = mpsc::channel(pending.len().max(1));
        for change in pending {
            tx.send(change.clone())
                .await
                .map_err(|e| IndexError::Subscription(e.to_string()))?;
        }
        *self.subscribed_from.lock() = Some(from);
        if !self.close_after_replay {
            *self.sender.lock() = Some(tx);
        }
        Ok(rx)
    }

    async fn unsubscribe(&self) {
        self.sender.lock().take();
        self.unsubscribed.store(true, Ordering::SeqCst);
    }
}
