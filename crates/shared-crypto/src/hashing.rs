//! # SHA-256 Hashing
//!
//! Content addressing for blocks and votes, plus the pairwise Merkle
//! aggregation used for signatory sets.
//!
//! ## Merkle Packing
//!
//! Leaves are hashed in pairs from left to right. When a level has an odd
//! number of elements the *first* one is carried up unhashed, so the tree
//! for three leaves is:
//!
//! ```text
//!   /\
//!  / /\
//! h0 h1 h2
//! ```

use crate::{CryptoError, Signatory};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Number of bytes in a [`Hash`].
pub const HASH_LENGTH: usize = 32;

/// 256-bit SHA-2 digest.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash(pub [u8; HASH_LENGTH]);

impl Hash {
    /// The all-zero hash (genesis header, empty Merkle root).
    pub const ZERO: Hash = Hash([0u8; HASH_LENGTH]);

    /// SHA-256 over `data`.
    pub fn digest(data: &[u8]) -> Self {
        Hash(Sha256::digest(data).into())
    }

    /// Decode from a byte slice that must be exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let array: [u8; HASH_LENGTH] =
            bytes.try_into().map_err(|_| CryptoError::InvalidLength {
                expected: HASH_LENGTH,
                actual: bytes.len(),
            })?;
        Ok(Hash(array))
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }

    /// True for [`Hash::ZERO`].
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_LENGTH]
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", &hex::encode(self.0)[..12])
    }
}

impl From<[u8; HASH_LENGTH]> for Hash {
    fn from(bytes: [u8; HASH_LENGTH]) -> Self {
        Hash(bytes)
    }
}

fn hash_pair(left: &[u8; HASH_LENGTH], right: &[u8; HASH_LENGTH]) -> [u8; HASH_LENGTH] {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Pack a level in place until a single root remains.
fn merkle_root_in_place(mut level: Vec<[u8; HASH_LENGTH]>) -> Hash {
    if level.is_empty() {
        return Hash::ZERO;
    }
    while level.len() > 1 {
        let carry = level.len() & 1;
        let pairs = level.len() / 2;
        for i in 0..pairs {
            let left = carry + 2 * i;
            level[carry + i] = hash_pair(&level[left], &level[left + 1]);
        }
        level.truncate(carry + pairs);
    }
    Hash(level[0])
}

/// Merkle root of `hashes`. The input is left untouched.
///
/// `merkle_root(&[]) == Hash::ZERO` and `merkle_root(&[h]) == h`.
pub fn merkle_root(hashes: &[Hash]) -> Hash {
    merkle_root_in_place(hashes.iter().map(|h| h.0).collect())
}

/// Same packing as [`merkle_root`] with signatories as leaves.
pub fn merkle_root_signatories(signatories: &[Signatory]) -> Hash {
    merkle_root_in_place(signatories.iter().map(|s| s.0).collect())
}
