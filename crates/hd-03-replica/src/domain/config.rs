//! Replica configuration

use super::ReplicaError;
use hd_02_consensus::DEFAULT_BUFFER_CAPACITY;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Per-replica settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaConfig {
    /// Upper bound on transactions pulled from the pool per proposal
    pub max_txs_per_block: usize,
    /// Time without progress before a `TimedOut` is injected
    pub propose_timeout_ms: u64,
    /// Capacity of the transition buffer
    pub buffer_capacity: usize,
}

impl Default for ReplicaConfig {
    fn default() -> Self {
        Self {
            max_txs_per_block: 512,
            propose_timeout_ms: 1_000,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl ReplicaConfig {
    /// Defaults overridden by environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `HD_MAX_TXS_PER_BLOCK` (default: 512)
    /// - `HD_PROPOSE_TIMEOUT_MS` (default: 1000)
    /// - `HD_BUFFER_CAPACITY` (default: 128)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_txs_per_block: parse_env("HD_MAX_TXS_PER_BLOCK").unwrap_or(defaults.max_txs_per_block),
            propose_timeout_ms: parse_env("HD_PROPOSE_TIMEOUT_MS")
                .unwrap_or(defaults.propose_timeout_ms),
            buffer_capacity: parse_env("HD_BUFFER_CAPACITY").unwrap_or(defaults.buffer_capacity),
        }
    }

    pub fn propose_timeout(&self) -> Duration {
        Duration::from_millis(self.propose_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ReplicaError> {
        if self.propose_timeout_ms == 0 {
            return Err(ReplicaError::Config(
                "propose_timeout_ms must be positive".into(),
            ));
        }
        if self.buffer_capacity == 0 {
            return Err(ReplicaError::Config(
                "buffer_capacity must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
