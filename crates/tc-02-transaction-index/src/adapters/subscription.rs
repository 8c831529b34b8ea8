//! # Consensus Subscription Driver
//!
//! Feeds consensus changes into the index, one at a time, resuming from
//! the index's persisted cursor. Stops on shutdown, on the end of the feed,
//! or on the first change the index fails to commit.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

use crate::domain::IndexError;
use crate::ports::inbound::TransactionIndexApi;
use crate::ports::outbound::ConsensusSubscription;

/// Runs a [`ConsensusSubscription`] into a [`TransactionIndexApi`].
pub struct SubscriptionDriver<S, I>
where
    S: ConsensusSubscription,
    I: TransactionIndexApi,
{
    subscription: Arc<S>,
    index: Arc<I>,
}

impl<S, I> SubscriptionDriver<S, I>
where
    S: ConsensusSubscription,
    I: TransactionIndexApi,
{
    pub fn new(subscription: Arc<S>, index: Arc<I>) -> Self {
        Self {
            subscription,
            index,
        }
    }

    /// Process changes until `shutdown` turns true or the feed ends.
    ///
    /// Always unsubscribes before returning. A failed change is not
    /// committed, so a later run retries it from the same cursor.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), IndexError> {
        let from = self.index.last_consensus_change_id();
        let mut changes = self.subscription.subscribe(from).await?;
        info!("[tc-02] subscribed to consensus changes from {}", from);

        let result = loop {
            if *shutdown.borrow() {
                break Ok(());
            }
            tokio::select! {
                changed = shutdown.changed() => {
                    // a dropped sender also means shutdown
                    if changed.is_err() {
                        break Ok(());
                    }
                }
                change = changes.recv() => {
                    let Some(change) = change else {
                        info!("[tc-02] consensus change feed closed");
                        break Ok(());
                    };
                    if let Err(e) = self.index.process_consensus_change(&change) {
                        error!("[tc-02] consensus change {} failed: {}", change.id, e);
                        break Err(e);
                    }
                }
            }
        };

        self.subscription.unsubscribe().await;
        info!("[tc-02] unsubscribed from consensus changes");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use crate::ports::outbound::{FailingKVStore, MockConsensusSubscription};
    use crate::service::TransactionIndex;
    use shared_types::{Block, ConsensusChange, ConsensusChangeId, UnlockCondition};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn changes(count: u8) -> Vec<ConsensusChange> {
        (1..=count)
            .map(|n| ConsensusChange {
                id: ConsensusChangeId([n; 32]),
                reverted_blocks: vec![],
                applied_blocks: vec![Block {
                    timestamp: 1_600_000_000 + u64::from(n) * 600,
                    ..Default::default()
                }],
                synced: n == count,
            })
            .collect()
    }

    fn config() -> IndexConfig {
        IndexConfig::new(UnlockCondition::Nil)
    }

    #[tokio::test]
    async fn test_driver_runs_feed_to_end() {
        let index = Arc::new(TransactionIndex::open_in_memory(&config()).unwrap());
        let feed = Arc::new(MockConsensusSubscription::closing(changes(3)));
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        SubscriptionDriver::new(feed.clone(), index.clone())
            .run(shutdown_rx)
            .await
            .unwrap();

        let stats = index.stats();
        assert_eq!(stats.height, 3);
        assert_eq!(stats.cursor, ConsensusChangeId([3; 32]));
        assert!(stats.synced);
        assert_eq!(feed.subscribed_from(), Some(ConsensusChangeId::BEGINNING));
        assert!(feed.is_unsubscribed());
    }

    #[tokio::test]
    async fn test_driver_resumes_from_cursor() {
        let index = Arc::new(TransactionIndex::open_in_memory(&config()).unwrap());
        let all = changes(3);
        index.process_consensus_change(&all[0]).unwrap();

        let feed = Arc::new(MockConsensusSubscription::closing(all));
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        SubscriptionDriver::new(feed.clone(), index.clone())
            .run(shutdown_rx)
            .await
            .unwrap();

        assert_eq!(feed.subscribed_from(), Some(ConsensusChangeId([1; 32])));
        assert_eq!(index.stats().height, 3);
    }

    #[tokio::test]
    async fn test_driver_stops_on_shutdown() {
        let index = Arc::new(TransactionIndex::open_in_memory(&config()).unwrap());
        // keeps the feed open after the replay
        let feed = Arc::new(MockConsensusSubscription::new(changes(2)));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let driver = SubscriptionDriver::new(feed.clone(), index.clone());
        let handle = tokio::spawn(async move { driver.run(shutdown_rx).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap().unwrap();

        assert_eq!(index.stats().height, 2);
        assert!(feed.is_unsubscribed());
    }

    #[tokio::test]
    async fn test_driver_stops_on_failed_change() {
        let store = FailingKVStore::new();
        let switch = store.failure_switch();
        let index = Arc::new(TransactionIndex::open(store, &config()).unwrap());
        switch.store(true, Ordering::SeqCst);

        let feed = Arc::new(MockConsensusSubscription::closing(changes(2)));
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let result = SubscriptionDriver::new(feed.clone(), index.clone())
            .run(shutdown_rx)
            .await;

        assert!(matches!(result, Err(IndexError::Storage(_))));
        assert_eq!(index.stats().cursor, ConsensusChangeId::BEGINNING);
        assert!(feed.is_unsubscribed());
    }
}
