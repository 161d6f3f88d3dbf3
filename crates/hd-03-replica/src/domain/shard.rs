//! Shard membership and proposer rotation

use hd_01_block::{Height, Round};
use hd_02_consensus::quorum_threshold;
use serde::{Deserialize, Serialize};
use shared_crypto::{merkle_root_signatories, Hash, Signatory};

/// Fixed validator set of one shard
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shard {
    pub hash: Hash,
    pub signatories: Vec<Signatory>,
}

impl Shard {
    pub fn new(hash: Hash, signatories: Vec<Signatory>) -> Self {
        Self { hash, signatories }
    }

    /// Shard identified by the Merkle root of its members.
    pub fn from_signatories(signatories: Vec<Signatory>) -> Self {
        let hash = merkle_root_signatories(&signatories);
        Self::new(hash, signatories)
    }

    pub fn len(&self) -> usize {
        self.signatories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatories.is_empty()
    }

    pub fn contains(&self, signatory: &Signatory) -> bool {
        self.signatories.contains(signatory)
    }

    /// Round-robin over `(height + round) mod n`. Both terms are reduced
    /// first so any point taken from the wire is safe to pass.
    pub fn proposer(&self, height: Height, round: Round) -> Option<Signatory> {
        if self.signatories.is_empty() {
            return None;
        }
        let n = self.signatories.len() as i64;
        let index = (height.rem_euclid(n) + round.rem_euclid(n)).rem_euclid(n) as usize;
        Some(self.signatories[index])
    }

    /// `⌊2n/3⌋ + 1`
    pub fn threshold(&self) -> usize {
        quorum_threshold(self.signatories.len())
    }
}
