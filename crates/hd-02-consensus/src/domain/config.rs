//! Consensus configuration

use super::{ConsensusError, ConsensusResult};
use serde::{Deserialize, Serialize};

/// Default transition buffer capacity
pub const DEFAULT_BUFFER_CAPACITY: usize = 128;

/// Smallest number of distinct signatories that certifies a vote group in a
/// set of `n` validators: `⌊2n/3⌋ + 1`, which is `2f + 1` for `n = 3f + 1`.
pub fn quorum_threshold(n: usize) -> usize {
    2 * n / 3 + 1
}

/// State machine configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Quorum threshold for polkas and commits
    pub threshold: usize,
    /// Maximum number of buffered future transitions
    pub buffer_capacity: usize,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            threshold: 1,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl ConsensusConfig {
    /// Config for a validator set of `n` members.
    pub fn for_validators(n: usize) -> Self {
        Self {
            threshold: quorum_threshold(n),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> ConsensusResult<()> {
        if self.threshold == 0 {
            return Err(ConsensusError::InvalidConfig(
                "threshold must be at least 1".into(),
            ));
        }
        if self.buffer_capacity == 0 {
            return Err(ConsensusError::InvalidConfig(
                "buffer_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
