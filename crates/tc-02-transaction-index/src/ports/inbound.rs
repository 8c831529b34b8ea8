//! # Inbound Ports (Driving Ports)
//!
//! The write side of the index. Reads go through the registry traits of
//! the typed transaction protocol, which the index implements.

use shared_types::{ConsensusChange, ConsensusChangeId};

use crate::domain::{IndexError, IndexStats};

/// Consensus-facing API of the transaction index.
///
/// Changes must be delivered one at a time, in feed order.
pub trait TransactionIndexApi: Send + Sync {
    /// Revert and apply the blocks of `change` and advance the cursor, all in
    /// one atomic write. On error nothing is written.
    fn process_consensus_change(&self, change: &ConsensusChange) -> Result<(), IndexError>;

    /// Last committed stats.
    fn stats(&self) -> IndexStats;

    /// Cursor to resume the consensus subscription from.
    fn last_consensus_change_id(&self) -> ConsensusChangeId {
        self.stats().cursor
    }

    /// Wait for in-flight work, then reject all new work.
    fn close(&self);
}
