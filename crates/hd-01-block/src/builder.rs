//! Quorum certificate builders
//!
//! One accumulator per `(height, round)`. Each signatory holds a single slot;
//! a later vote from the same signatory replaces the earlier one and takes a
//! new arrival position. Votes are grouped by block header (nil is its own
//! group) and the first group to reach the threshold is certified and frozen.
//! Further inserts for that point return the frozen certificate.

use crate::domain::{BlockResult, Commit, Height, Polka, Round, SignedPreCommit, SignedPreVote, Vote};
use shared_crypto::Signatory;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace};

/// Builds polkas from pre-votes
pub type PolkaBuilder = QuorumBuilder<SignedPreVote>;

/// Builds commits from pre-commits
pub type CommitBuilder = QuorumBuilder<SignedPreCommit>;

#[derive(Debug)]
struct RoundVotes<V: Vote> {
    next_seq: u64,
    votes: HashMap<Signatory, (u64, V)>,
    certificate: Option<V::Certificate>,
}

impl<V: Vote> Default for RoundVotes<V> {
    fn default() -> Self {
        Self {
            next_seq: 0,
            votes: HashMap::new(),
            certificate: None,
        }
    }
}

/// Accumulates votes until a quorum agrees
#[derive(Debug)]
pub struct QuorumBuilder<V: Vote> {
    threshold: usize,
    rounds: BTreeMap<(Height, Round), RoundVotes<V>>,
}

impl<V: Vote> QuorumBuilder<V> {
    /// A threshold of 0 is treated as 1.
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
            rounds: BTreeMap::new(),
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Verify and count `vote`.
    ///
    /// Returns `Ok(Some(certificate))` once a quorum exists for the vote's
    /// point, `Ok(None)` while still short, and `Err` for a vote that fails
    /// verification. Rejected votes never occupy a slot.
    pub fn insert(&mut self, vote: V) -> BlockResult<Option<V::Certificate>> {
        vote.verify()?;

        let threshold = self.threshold;
        let (height, round) = (vote.height(), vote.round());
        let entry = self.rounds.entry((height, round)).or_default();
        if let Some(certificate) = &entry.certificate {
            return Ok(Some(certificate.clone()));
        }

        let seq = entry.next_seq;
        entry.next_seq += 1;
        let header = vote.block_header();
        let signatory = vote.signatory();
        if entry.votes.insert(signatory, (seq, vote)).is_some() {
            debug!(height, round, %signatory, "Vote replaced an earlier vote from the same signatory");
        }

        let mut group: Vec<&(u64, V)> = entry
            .votes
            .values()
            .filter(|(_, v)| v.block_header() == header)
            .collect();
        trace!(height, round, agreeing = group.len(), threshold, "Vote counted");
        if group.len() < threshold {
            return Ok(None);
        }

        group.sort_by_key(|(seq, _)| *seq);
        let signatures = group.iter().map(|(_, v)| v.signature()).collect();
        let signatories = group.iter().map(|(_, v)| v.signatory()).collect();
        let certificate = group[0].1.certify(signatures, signatories);

        debug!(height, round, has_block = header.is_some(), "Quorum reached");
        entry.certificate = Some(certificate.clone());
        Ok(Some(certificate))
    }

    /// Certificate already formed for this point, if any
    pub fn certificate(&self, height: Height, round: Round) -> Option<V::Certificate> {
        self.rounds
            .get(&(height, round))
            .and_then(|entry| entry.certificate.clone())
    }

    /// Distinct signatories currently held for this point
    pub fn votes(&self, height: Height, round: Round) -> usize {
        self.rounds
            .get(&(height, round))
            .map_or(0, |entry| entry.votes.len())
    }

    /// Release the accumulator for one point.
    pub fn drop(&mut self, height: Height, round: Round) {
        self.rounds.remove(&(height, round));
    }

    /// Release every accumulator strictly below `(height, round)`.
    pub fn drop_below(&mut self, height: Height, round: Round) {
        self.rounds = self.rounds.split_off(&(height, round));
    }

    /// Number of points with an accumulator
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }
}

impl QuorumBuilder<SignedPreVote> {
    pub fn polka(&self, height: Height, round: Round) -> Option<Polka> {
        self.certificate(height, round)
    }
}

impl QuorumBuilder<SignedPreCommit> {
    pub fn commit(&self, height: Height, round: Round) -> Option<Commit> {
        self.certificate(height, round)
    }
}
