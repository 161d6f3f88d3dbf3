//! Pre-votes and pre-commits
//!
//! A vote signs the digest of `(kind, height, round, block header)` where a
//! missing block is the nil vote. Votes that agree on that tuple are
//! interchangeable for quorum counting.

use super::{BlockError, BlockResult, Commit, Height, Polka, Round, SignedBlock};
use serde::{Deserialize, Serialize};
use shared_crypto::{Hash, Signatory, Signature, Signer};
use std::fmt::Debug;

const PRE_VOTE_TAG: &[u8] = b"PREVOTE";
const PRE_COMMIT_TAG: &[u8] = b"PRECOMMIT";

fn vote_digest(tag: &[u8], height: Height, round: Round, header: Option<&Hash>) -> Hash {
    let mut buf = Vec::with_capacity(tag.len() + 8 + 8 + 1 + 32);
    buf.extend_from_slice(tag);
    buf.extend_from_slice(&height.to_le_bytes());
    buf.extend_from_slice(&round.to_le_bytes());
    match header {
        Some(header) => {
            buf.push(1);
            buf.extend_from_slice(header.as_bytes());
        }
        None => buf.push(0),
    }
    Hash::digest(&buf)
}

/// Digest signed by every pre-vote for this tuple
pub fn pre_vote_digest(height: Height, round: Round, header: Option<&Hash>) -> Hash {
    vote_digest(PRE_VOTE_TAG, height, round, header)
}

/// Digest signed by every pre-commit for this tuple
pub fn pre_commit_digest(height: Height, round: Round, header: Option<&Hash>) -> Hash {
    vote_digest(PRE_COMMIT_TAG, height, round, header)
}

fn check_signature(digest: &Hash, signature: &Signature, signatory: &Signatory) -> BlockResult<()> {
    if signature.recover(digest)? != *signatory {
        return Err(BlockError::InvalidSignature(*signatory));
    }
    Ok(())
}

/// First-phase vote. `block: None` is a vote for nil.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreVote {
    pub block: Option<SignedBlock>,
    pub height: Height,
    pub round: Round,
}

impl PreVote {
    pub fn new(block: Option<SignedBlock>, height: Height, round: Round) -> Self {
        Self {
            block,
            height,
            round,
        }
    }

    /// Nil vote
    pub fn nil(height: Height, round: Round) -> Self {
        Self::new(None, height, round)
    }

    pub fn block_header(&self) -> Option<Hash> {
        self.block.as_ref().map(SignedBlock::header)
    }

    pub fn digest(&self) -> Hash {
        pre_vote_digest(self.height, self.round, self.block_header().as_ref())
    }

    pub fn sign<S: Signer + ?Sized>(self, signer: &S) -> BlockResult<SignedPreVote> {
        let signature = signer.sign(&self.digest())?;
        Ok(SignedPreVote {
            pre_vote: self,
            signature,
            signatory: signer.signatory(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPreVote {
    pub pre_vote: PreVote,
    pub signature: Signature,
    pub signatory: Signatory,
}

impl SignedPreVote {
    /// Check the referenced block (if any) and the vote signature.
    pub fn verify(&self) -> BlockResult<()> {
        if let Some(block) = &self.pre_vote.block {
            if block.height() != self.pre_vote.height {
                return Err(BlockError::VoteMismatch(format!(
                    "pre-vote at height {} references block at height {}",
                    self.pre_vote.height,
                    block.height()
                )));
            }
            block.verify()?;
        }
        check_signature(&self.pre_vote.digest(), &self.signature, &self.signatory)
    }
}

/// Second-phase vote, justified by a polka for the same height and round
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreCommit {
    pub polka: Polka,
    pub height: Height,
    pub round: Round,
}

impl PreCommit {
    /// Pre-commit on `polka` at the polka's own height and round.
    pub fn new(polka: Polka) -> Self {
        let (height, round) = (polka.height, polka.round);
        Self {
            polka,
            height,
            round,
        }
    }

    pub fn block_header(&self) -> Option<Hash> {
        self.polka.block_header()
    }

    pub fn digest(&self) -> Hash {
        pre_commit_digest(self.height, self.round, self.block_header().as_ref())
    }

    pub fn sign<S: Signer + ?Sized>(self, signer: &S) -> BlockResult<SignedPreCommit> {
        let signature = signer.sign(&self.digest())?;
        Ok(SignedPreCommit {
            pre_commit: self,
            signature,
            signatory: signer.signatory(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPreCommit {
    pub pre_commit: PreCommit,
    pub signature: Signature,
    pub signatory: Signatory,
}

impl SignedPreCommit {
    /// Check that the polka matches the vote's point, that its block is
    /// intact, then the signature.
    ///
    /// The polka's own signatures need the shard threshold and are checked
    /// with [`Polka::verify`].
    pub fn verify(&self) -> BlockResult<()> {
        let pre_commit = &self.pre_commit;
        if pre_commit.polka.height != pre_commit.height || pre_commit.polka.round != pre_commit.round
        {
            return Err(BlockError::VoteMismatch(format!(
                "pre-commit at ({}, {}) carries polka at ({}, {})",
                pre_commit.height, pre_commit.round, pre_commit.polka.height, pre_commit.polka.round
            )));
        }
        if let Some(block) = &pre_commit.polka.block {
            if block.height() != pre_commit.height {
                return Err(BlockError::VoteMismatch(format!(
                    "pre-commit at height {} references block at height {}",
                    pre_commit.height,
                    block.height()
                )));
            }
            block.verify()?;
        }
        check_signature(&pre_commit.digest(), &self.signature, &self.signatory)
    }
}

/// Common view of a signed vote, used by the quorum builders.
pub trait Vote: Clone + Debug {
    /// Certificate formed by a quorum of agreeing votes
    type Certificate: Clone + Debug;

    fn height(&self) -> Height;
    fn round(&self) -> Round;
    fn signatory(&self) -> Signatory;
    fn signature(&self) -> Signature;
    /// Header the vote agrees on; `None` for nil
    fn block_header(&self) -> Option<Hash>;
    fn verify(&self) -> BlockResult<()>;
    /// Build a certificate using `self` as the representative of its group.
    fn certify(&self, signatures: Vec<Signature>, signatories: Vec<Signatory>)
        -> Self::Certificate;
}

impl Vote for SignedPreVote {
    type Certificate = Polka;

    fn height(&self) -> Height {
        self.pre_vote.height
    }

    fn round(&self) -> Round {
        self.pre_vote.round
    }

    fn signatory(&self) -> Signatory {
        self.signatory
    }

    fn signature(&self) -> Signature {
        self.signature
    }

    fn block_header(&self) -> Option<Hash> {
        self.pre_vote.block_header()
    }

    fn verify(&self) -> BlockResult<()> {
        SignedPreVote::verify(self)
    }

    fn certify(&self, signatures: Vec<Signature>, signatories: Vec<Signatory>) -> Polka {
        Polka {
            block: self.pre_vote.block.clone(),
            height: self.pre_vote.height,
            round: self.pre_vote.round,
            signatures,
            signatories,
        }
    }
}

impl Vote for SignedPreCommit {
    type Certificate = Commit;

    fn height(&self) -> Height {
        self.pre_commit.height
    }

    fn round(&self) -> Round {
        self.pre_commit.round
    }

    fn signatory(&self) -> Signatory {
        self.signatory
    }

    fn signature(&self) -> Signature {
        self.signature
    }

    fn block_header(&self) -> Option<Hash> {
        self.pre_commit.block_header()
    }

    fn verify(&self) -> BlockResult<()> {
        SignedPreCommit::verify(self)
    }

    fn certify(&self, signatures: Vec<Signature>, signatories: Vec<Signatory>) -> Commit {
        Commit {
            polka: self.pre_commit.polka.clone(),
            signatures,
            signatories,
        }
    }
}
