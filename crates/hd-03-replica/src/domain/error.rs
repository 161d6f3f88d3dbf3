//! Error types for the replica

use hd_02_consensus::ConsensusError;

/// Replica error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplicaError {
    #[error("Consensus error: {0}")]
    Consensus(#[from] ConsensusError),

    #[error("Dispatch error: {0}")]
    Dispatch(String),

    #[error("Invalid config: {0}")]
    Config(String),
}
