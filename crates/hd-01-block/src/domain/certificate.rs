//! Quorum certificates
//!
//! A [`Polka`] proves that a quorum pre-voted for the same block (or nil) at
//! one height and round. A [`Commit`] proves that a quorum pre-committed on
//! that polka.

use super::{
    pre_commit_digest, pre_vote_digest, BlockError, BlockResult, Height, Round, SignedBlock,
};
use serde::{Deserialize, Serialize};
use shared_crypto::{merkle_root_signatories, verify_batch, Hash, Signatory, Signature};
use std::collections::HashSet;

/// Pre-vote quorum certificate
///
/// `signatures[i]` was produced by `signatories[i]`; both are in arrival
/// order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polka {
    pub block: Option<SignedBlock>,
    pub height: Height,
    pub round: Round,
    pub signatures: Vec<Signature>,
    pub signatories: Vec<Signatory>,
}

impl Polka {
    pub fn block_header(&self) -> Option<Hash> {
        self.block.as_ref().map(SignedBlock::header)
    }

    /// Merkle root of the signatories, in certificate order
    pub fn signatory_root(&self) -> Hash {
        merkle_root_signatories(&self.signatories)
    }

    /// Check shape, distinctness, threshold and every signature.
    pub fn verify(&self, threshold: usize) -> BlockResult<()> {
        let digest = pre_vote_digest(self.height, self.round, self.block_header().as_ref());
        verify_quorum(&digest, &self.signatures, &self.signatories, threshold)
    }
}

/// Pre-commit quorum certificate over a [`Polka`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub polka: Polka,
    pub signatures: Vec<Signature>,
    pub signatories: Vec<Signatory>,
}

impl Commit {
    pub fn height(&self) -> Height {
        self.polka.height
    }

    pub fn round(&self) -> Round {
        self.polka.round
    }

    /// Committed block, or `None` when the round committed to nil
    pub fn block(&self) -> Option<&SignedBlock> {
        self.polka.block.as_ref()
    }

    pub fn block_header(&self) -> Option<Hash> {
        self.polka.block_header()
    }

    pub fn signatory_root(&self) -> Hash {
        merkle_root_signatories(&self.signatories)
    }

    /// Check the pre-commit signatures. The embedded polka is checked
    /// separately with [`Polka::verify`].
    pub fn verify(&self, threshold: usize) -> BlockResult<()> {
        let digest = pre_commit_digest(self.height(), self.round(), self.block_header().as_ref());
        verify_quorum(&digest, &self.signatures, &self.signatories, threshold)
    }
}

fn verify_quorum(
    digest: &Hash,
    signatures: &[Signature],
    signatories: &[Signatory],
    threshold: usize,
) -> BlockResult<()> {
    if signatures.len() != signatories.len() {
        return Err(BlockError::CertificateShape {
            signatures: signatures.len(),
            signatories: signatories.len(),
        });
    }

    let mut seen = HashSet::with_capacity(signatories.len());
    for signatory in signatories {
        if !seen.insert(signatory) {
            return Err(BlockError::DuplicateSignatory(*signatory));
        }
    }

    if signatories.len() < threshold {
        return Err(BlockError::BelowThreshold {
            got: signatories.len(),
            required: threshold,
        });
    }

    let items: Vec<_> = signatures
        .iter()
        .zip(signatories)
        .map(|(signature, signatory)| (*digest, *signature, *signatory))
        .collect();
    match verify_batch(&items).iter().position(|ok| !ok) {
        Some(index) => Err(BlockError::InvalidSignature(signatories[index])),
        None => Ok(()),
    }
}
