//! # Consensus Metrics
//!
//! Prometheus metrics for the round state machine.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! hd-02-consensus = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `hyperdrive_blocks_committed_total` - Blocks appended to the chain
//! - `hyperdrive_rounds_skipped_total` - Rounds that ended in a nil commit
//! - `hyperdrive_votes_rejected_total` - Votes that failed verification (by kind)
//! - `hyperdrive_transitions_buffered_total` - Future transitions buffered
//! - `hyperdrive_buffer_evictions_total` - Buffered transitions evicted on overflow

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Blocks appended to the chain
    pub static ref BLOCKS_COMMITTED: IntCounter = register_int_counter!(
        "hyperdrive_blocks_committed_total",
        "Total number of blocks committed"
    )
    .expect("Failed to create BLOCKS_COMMITTED metric");

    /// Rounds skipped after a nil commit
    pub static ref ROUNDS_SKIPPED: IntCounter = register_int_counter!(
        "hyperdrive_rounds_skipped_total",
        "Total number of rounds skipped without a block"
    )
    .expect("Failed to create ROUNDS_SKIPPED metric");

    /// Rejected votes, labeled by kind
    pub static ref VOTES_REJECTED: IntCounterVec = register_int_counter_vec!(
        "hyperdrive_votes_rejected_total",
        "Total number of votes rejected by a quorum builder",
        &["kind"]
    )
    .expect("Failed to create VOTES_REJECTED metric");

    /// Transitions pushed to the buffer
    pub static ref TRANSITIONS_BUFFERED: IntCounter = register_int_counter!(
        "hyperdrive_transitions_buffered_total",
        "Total number of future transitions buffered"
    )
    .expect("Failed to create TRANSITIONS_BUFFERED metric");

    /// Transitions evicted from a full buffer
    pub static ref BUFFER_EVICTIONS: IntCounter = register_int_counter!(
        "hyperdrive_buffer_evictions_total",
        "Total number of buffered transitions evicted on overflow"
    )
    .expect("Failed to create BUFFER_EVICTIONS metric");
}

#[cfg(feature = "metrics")]
pub fn record_block_committed() {
    BLOCKS_COMMITTED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_round_skipped() {
    ROUNDS_SKIPPED.inc();
}

/// Record a rejected vote with its kind
#[cfg(feature = "metrics")]
pub fn record_vote_rejected(kind: &str) {
    VOTES_REJECTED.with_label_values(&[kind]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_transition_buffered(evicted: usize) {
    TRANSITIONS_BUFFERED.inc();
    BUFFER_EVICTIONS.inc_by(evicted as u64);
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_block_committed() {}

#[cfg(not(feature = "metrics"))]
pub fn record_round_skipped() {}

#[cfg(not(feature = "metrics"))]
pub fn record_vote_rejected(_kind: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_transition_buffered(_evicted: usize) {}
