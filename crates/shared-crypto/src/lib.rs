//! # Shared Crypto - Identity and Hashing Primitives
//!
//! Everything a replica needs to name things and prove who said them.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256 | Block headers, vote digests, Merkle roots |
//! | `ecdsa` | secp256k1 (recoverable) | Replica identity and vote signing |
//!
//! ## Security Properties
//!
//! - **secp256k1**: RFC 6979 deterministic, low-S normalization
//! - **Signatory**: SHA-256 of the uncompressed public key coordinates, so a
//!   signature plus a hash is enough to learn who signed

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;

// Re-exports
pub use ecdsa::{
    verify_batch, Secp256k1KeyPair, Signatory, Signature, Signer, SIGNATORY_LENGTH,
    SIGNATURE_LENGTH,
};
pub use errors::CryptoError;
pub use hashing::{merkle_root, merkle_root_signatories, Hash, HASH_LENGTH};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
