//! In-memory FIFO transaction pool

use crate::ports::TxPool;
use hd_01_block::Transaction;
use parking_lot::Mutex;
use shared_crypto::Hash;
use std::collections::{HashSet, VecDeque};
use tracing::trace;

/// Default number of transactions a pool holds
pub const DEFAULT_POOL_CAPACITY: usize = 10_000;

/// FIFO pool deduplicated by transaction hash
pub struct FifoPool {
    capacity: usize,
    inner: Mutex<PoolInner>,
}

#[derive(Default)]
struct PoolInner {
    queue: VecDeque<Transaction>,
    hashes: HashSet<Hash>,
}

impl FifoPool {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_POOL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(PoolInner::default()),
        }
    }
}

impl Default for FifoPool {
    fn default() -> Self {
        Self::new()
    }
}

impl TxPool for FifoPool {
    fn enqueue(&self, tx: Transaction) -> bool {
        let mut inner = self.inner.lock();
        if inner.queue.len() >= self.capacity {
            trace!(capacity = self.capacity, "Pool full, dropping transaction");
            return false;
        }
        if !inner.hashes.insert(tx.hash()) {
            return false;
        }
        inner.queue.push_back(tx);
        true
    }

    fn pending(&self, max: usize) -> Vec<Transaction> {
        self.inner.lock().queue.iter().take(max).cloned().collect()
    }

    fn remove(&self, txs: &[Transaction]) {
        if txs.is_empty() {
            return;
        }
        let committed: HashSet<Hash> = txs.iter().map(Transaction::hash).collect();
        let mut inner = self.inner.lock();
        inner.queue.retain(|tx| !committed.contains(&tx.hash()));
        inner.hashes.retain(|hash| !committed.contains(hash));
    }

    fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }
}
