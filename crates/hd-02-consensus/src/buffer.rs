//! Transition buffer
//!
//! Holds transitions for points the state machine has not reached yet.
//! Transitions are bucketed by `(height, round)` and kept in arrival order
//! within a bucket. When full, the points furthest ahead go first: whole
//! buckets are evicted from the highest point down, and a transition above
//! everything already held is dropped instead of buffered.

use crate::domain::Transition;
use hd_01_block::{Height, Round};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug)]
pub struct TransitionBuffer {
    capacity: usize,
    len: usize,
    buckets: BTreeMap<(Height, Round), Vec<Transition>>,
}

impl TransitionBuffer {
    /// `capacity` counts transitions; 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            len: 0,
            buckets: BTreeMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Buffer `transition`, returning how many transitions were dropped to
    /// make room. A dropped `transition` itself counts as one.
    pub fn push(&mut self, transition: Transition) -> usize {
        let point = transition.point();
        let mut evicted = 0;
        while self.len >= self.capacity {
            let Some(entry) = self.buckets.last_entry() else {
                break;
            };
            if point >= *entry.key() {
                debug!(height = point.0, round = point.1, "Transition buffer full, dropping furthest transition");
                return evicted + 1;
            }
            let ((height, round), bucket) = entry.remove_entry();
            debug!(height, round, dropped = bucket.len(), "Transition buffer full, evicting bucket");
            self.len -= bucket.len();
            evicted += bucket.len();
        }

        self.buckets
            .entry(point)
            .or_default()
            .push(transition);
        self.len += 1;
        evicted
    }

    /// Remove and return everything buffered for `(height, round)`, in
    /// arrival order.
    pub fn dequeue(&mut self, height: Height, round: Round) -> Vec<Transition> {
        let bucket = self.buckets.remove(&(height, round)).unwrap_or_default();
        self.len -= bucket.len();
        bucket
    }

    /// Discard every bucket strictly below `(height, round)`.
    pub fn drop_below(&mut self, height: Height, round: Round) {
        let kept = self.buckets.split_off(&(height, round));
        let dropped: usize = self.buckets.values().map(Vec::len).sum();
        self.len -= dropped;
        self.buckets = kept;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
