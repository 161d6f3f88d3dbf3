//! Error types for the block subsystem

use shared_crypto::{CryptoError, Hash, Signatory};

/// Block, vote and certificate errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockError {
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Signature does not recover to signatory {0}")]
    InvalidSignature(Signatory),

    #[error("Header mismatch: block carries {expected}, content hashes to {computed}")]
    HeaderMismatch { expected: Hash, computed: Hash },

    #[error("Certificate shape: {signatures} signatures for {signatories} signatories")]
    CertificateShape {
        signatures: usize,
        signatories: usize,
    },

    #[error("Vote mismatch: {0}")]
    VoteMismatch(String),

    #[error("Duplicate signatory in certificate: {0}")]
    DuplicateSignatory(Signatory),

    #[error("Below threshold: {got} signatories, required {required}")]
    BelowThreshold { got: usize, required: usize },
}

/// Result type for block operations
pub type BlockResult<T> = Result<T, BlockError>;
