//! Ports for the replica
//!
//! - `Dispatcher`: broadcasts actions to the shard (outbound, async)
//! - `TxPool`: source of transactions for proposals (outbound, sync)

use async_trait::async_trait;
use hd_01_block::Transaction;
use hd_02_consensus::Action;
use shared_crypto::Hash;

/// Delivers actions to every member of a shard, the sender included.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Broadcast an action within the given shard.
    ///
    /// Delivery is best effort. An error means nobody could be reached.
    async fn dispatch(&self, shard: Hash, action: Action) -> Result<(), String>;
}

/// Pending transactions waiting to be proposed
pub trait TxPool: Send + Sync {
    /// Add a transaction. Returns `false` if it was already queued or the
    /// pool is full.
    fn enqueue(&self, tx: Transaction) -> bool;

    /// Oldest transactions, up to `max`, without removing them.
    fn pending(&self, max: usize) -> Vec<Transaction>;

    /// Drop transactions that were committed.
    fn remove(&self, txs: &[Transaction]);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
