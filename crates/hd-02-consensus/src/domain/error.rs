//! Error types for the consensus subsystem

use hd_01_block::BlockError;
use shared_crypto::CryptoError;

/// Consensus error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsensusError {
    /// A vote or certificate was rejected by a builder, or block construction failed
    #[error("Block error: {0}")]
    Block(#[from] BlockError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type for consensus operations
pub type ConsensusResult<T> = Result<T, ConsensusError>;
