//! # Blocks and Consensus Changes
//!
//! Input of the transaction index: the consensus engine delivers ordered
//! batches of reverted and applied blocks, each tagged with a resumable cursor.

use serde::{Deserialize, Serialize};

use crate::codec::{Encode, Encoder};
use crate::primitives::{BlockId, ConsensusChangeId, Timestamp};
use crate::transaction::Transaction;

/// A block as seen by this layer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "parentid")]
    pub parent_id: BlockId,
    pub timestamp: Timestamp,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn id(&self) -> BlockId {
        BlockId(crate::codec::hash_object(self))
    }
}

impl Encode for Block {
    fn encode(&self, enc: &mut Encoder) {
        enc.put(&self.parent_id).put_u64(self.timestamp);
        enc.put_len(self.transactions.len());
        for tx in &self.transactions {
            enc.put(&tx.id());
        }
    }
}

/// One batch of the consensus change feed.
///
/// `reverted_blocks` are ordered newest first, `applied_blocks` oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConsensusChange {
    pub id: ConsensusChangeId,
    #[serde(rename = "revertedblocks")]
    pub reverted_blocks: Vec<Block>,
    #[serde(rename = "appliedblocks")]
    pub applied_blocks: Vec<Block>,
    pub synced: bool,
}
