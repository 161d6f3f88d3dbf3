//! Round state machine
//!
//! # Architecture
//! - Single writer: one machine per shard, fed one transition at a time
//! - Stale transitions (below the current point) are discarded
//! - Future transitions are buffered and replayed once the point is reached
//! - Pre-votes and pre-commits for the current point are counted in any phase
//! - A commit for the current point is applied in any phase
//!
//! ```text
//! WaitForPropose(h, r) ──Proposed/TimedOut──→ WaitForPolka(h, r)
//! WaitForPolka(h, r)   ──Polka──────────────→ WaitForCommit(h, r)
//! any phase            ──Commit(block)──────→ WaitForPropose(h + 1, 0)
//! any phase            ──Commit(nil)────────→ WaitForPropose(h, r + 1)
//! ```

use crate::buffer::TransitionBuffer;
use crate::domain::{Action, ConsensusConfig, ConsensusResult, State, Transition};
use crate::metrics;
use hd_01_block::{
    Block, BlockError, BlockResult, Blockchain, Commit, CommitBuilder, Height, PolkaBuilder,
    PreCommit, PreVote, Round, SignedBlock, SignedPreCommit, SignedPreVote, Transaction,
};
use shared_crypto::{Signatory, Signer};
use std::cmp::Ordering;
use std::collections::VecDeque;
use tracing::{debug, error, info, trace, warn};

/// Consensus state for one shard
pub struct StateMachine<S: Signer> {
    config: ConsensusConfig,
    signer: S,
    state: State,
    blockchain: Blockchain,
    polka_builder: PolkaBuilder,
    commit_builder: CommitBuilder,
    buffer: TransitionBuffer,
    /// Buffered transitions released by the last advance
    pending: VecDeque<Transition>,
}

impl<S: Signer> StateMachine<S> {
    /// Start at `WaitForPropose(blockchain.height() + 1, 0)`.
    pub fn new(config: ConsensusConfig, signer: S, blockchain: Blockchain) -> ConsensusResult<Self> {
        let state = State::WaitForPropose {
            height: blockchain.height() + 1,
            round: 0,
        };
        Self::with_state(config, signer, blockchain, state)
    }

    /// Start at an explicit state.
    pub fn with_state(
        config: ConsensusConfig,
        signer: S,
        blockchain: Blockchain,
        state: State,
    ) -> ConsensusResult<Self> {
        config.validate()?;
        info!(
            signatory = %signer.signatory(),
            threshold = config.threshold,
            %state,
            "Starting state machine"
        );
        Ok(Self {
            polka_builder: PolkaBuilder::new(config.threshold),
            commit_builder: CommitBuilder::new(config.threshold),
            buffer: TransitionBuffer::new(config.buffer_capacity),
            pending: VecDeque::new(),
            config,
            signer,
            state,
            blockchain,
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn blockchain(&self) -> &Blockchain {
        &self.blockchain
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    pub fn signatory(&self) -> Signatory {
        self.signer.signatory()
    }

    pub fn polka_builder(&self) -> &PolkaBuilder {
        &self.polka_builder
    }

    pub fn commit_builder(&self) -> &CommitBuilder {
        &self.commit_builder
    }

    /// Number of buffered future transitions
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Build and sign a block for the current point on top of the head.
    ///
    /// Returns `None` outside `WaitForPropose`. The state is not changed; the
    /// proposal takes effect when it comes back as [`Transition::Proposed`].
    pub fn propose(&self, time: u64, txs: Vec<Transaction>) -> ConsensusResult<Option<Action>> {
        let State::WaitForPropose { height, round } = self.state else {
            return Ok(None);
        };
        let parent = self.blockchain.head().0.header();
        let block = Block::new(time, height, round, parent, txs)?.sign(&self.signer)?;
        debug!(height, round, header = %block.header(), txs = block.txs().len(), "Proposing block");
        Ok(Some(Action::Propose(block)))
    }

    /// Feed one transition.
    ///
    /// The transition itself yields at most one action of its own. A
    /// certificate that already exists when a phase is entered, and buffered
    /// transitions replayed after an advance, may append further actions in
    /// order. An error is returned only for the transition passed in and
    /// leaves the machine unchanged; errors from replayed transitions are
    /// logged and skipped.
    pub fn transition(&mut self, transition: Transition) -> ConsensusResult<Vec<Action>> {
        let mut actions = Vec::new();
        self.handle(transition, &mut actions)?;

        while let Some(replayed) = self.pending.pop_front() {
            let (height, round) = replayed.point();
            let kind = replayed.kind();
            if let Err(e) = self.handle(replayed, &mut actions) {
                warn!(height, round, kind, error = %e, "Dropping buffered transition");
            }
        }
        Ok(actions)
    }

    fn handle(&mut self, transition: Transition, actions: &mut Vec<Action>) -> ConsensusResult<()> {
        let current = self.state.point();
        let (height, round) = transition.point();
        match (height, round).cmp(&current) {
            Ordering::Less => {
                trace!(height, round, kind = transition.kind(), state = %self.state, "Discarding stale transition");
                return Ok(());
            }
            Ordering::Greater => {
                if matches!(transition, Transition::TimedOut { .. }) {
                    trace!(height, round, "Discarding timeout for a future round");
                    return Ok(());
                }
                trace!(height, round, kind = transition.kind(), "Buffering future transition");
                let evicted = self.buffer.push(transition);
                metrics::record_transition_buffered(evicted);
                return Ok(());
            }
            Ordering::Equal => {}
        }

        match transition {
            Transition::Proposed(block) => self.on_proposed(block, actions),
            Transition::PreVoted(vote) => self.on_pre_voted(vote, actions),
            Transition::PreCommitted(vote) => self.on_pre_committed(vote),
            Transition::TimedOut { .. } => self.on_timed_out(actions),
        }
    }

    fn on_proposed(&mut self, block: SignedBlock, actions: &mut Vec<Action>) -> ConsensusResult<()> {
        let State::WaitForPropose { height, round } = self.state else {
            trace!(state = %self.state, "Ignoring proposal outside WaitForPropose");
            return Ok(());
        };

        let pre_vote = match self.validate_proposal(&block) {
            Ok(()) => PreVote::new(Some(block), height, round),
            Err(e) => {
                warn!(height, round, proposer = %block.signatory, error = %e, "Invalid proposal, pre-voting nil");
                PreVote::nil(height, round)
            }
        };
        let vote = pre_vote.sign(&self.signer)?;

        self.state = State::WaitForPolka { height, round };
        actions.push(Action::PreVote(vote));
        self.progress_polka(actions);
        Ok(())
    }

    fn on_pre_voted(&mut self, vote: SignedPreVote, actions: &mut Vec<Action>) -> ConsensusResult<()> {
        let signatory = vote.signatory;
        let polka = self.polka_builder.insert(vote).map_err(|e| {
            warn!(%signatory, error = %e, "Rejected pre-vote");
            metrics::record_vote_rejected("pre_vote");
            e
        })?;
        if polka.is_some() {
            self.progress_polka(actions);
        }
        Ok(())
    }

    /// The carried polka must itself hold a quorum; the earliest pre-commit
    /// of a group supplies the commit's block.
    fn on_pre_committed(&mut self, vote: SignedPreCommit) -> ConsensusResult<()> {
        let signatory = vote.signatory;
        let threshold = self.config.threshold;
        let commit = vote
            .pre_commit
            .polka
            .verify(threshold)
            .and_then(|()| self.commit_builder.insert(vote))
            .map_err(|e| {
                warn!(%signatory, error = %e, "Rejected pre-commit");
                metrics::record_vote_rejected("pre_commit");
                e
            })?;
        if let Some(commit) = commit {
            self.apply_commit(commit);
        }
        Ok(())
    }

    fn on_timed_out(&mut self, actions: &mut Vec<Action>) -> ConsensusResult<()> {
        let State::WaitForPropose { height, round } = self.state else {
            return Ok(());
        };
        debug!(height, round, "Proposal timed out, pre-voting nil");
        let vote = PreVote::nil(height, round).sign(&self.signer)?;

        self.state = State::WaitForPolka { height, round };
        actions.push(Action::PreVote(vote));
        self.progress_polka(actions);
        Ok(())
    }

    /// Local checks against the chain head; signatures included.
    fn validate_proposal(&self, block: &SignedBlock) -> BlockResult<()> {
        let (head, _) = self.blockchain.head();
        if block.height() != head.height() + 1 {
            return Err(BlockError::VoteMismatch(format!(
                "proposal at height {} does not follow head at {}",
                block.height(),
                head.height()
            )));
        }
        if block.parent_header() != head.header() {
            return Err(BlockError::VoteMismatch(format!(
                "proposal parent {} is not head {}",
                block.parent_header(),
                head.header()
            )));
        }
        block.verify()
    }

    /// Pre-commit if waiting for a polka that now exists.
    fn progress_polka(&mut self, actions: &mut Vec<Action>) {
        let State::WaitForPolka { height, round } = self.state else {
            return;
        };
        let Some(polka) = self.polka_builder.polka(height, round) else {
            return;
        };

        let has_block = polka.block.is_some();
        let vote = match PreCommit::new(polka).sign(&self.signer) {
            Ok(vote) => vote,
            Err(e) => {
                error!(height, round, error = %e, "Failed to sign pre-commit");
                return;
            }
        };
        debug!(height, round, has_block, "Polka formed, pre-committing");
        self.state = State::WaitForCommit { height, round };
        actions.push(Action::PreCommit(vote));

        if let Some(commit) = self.commit_builder.commit(height, round) {
            self.apply_commit(commit);
        }
    }

    fn apply_commit(&mut self, commit: Commit) {
        let (height, round) = (commit.height(), commit.round());
        if (height, round) != self.state.point() {
            return;
        }

        let Some(block) = commit.block() else {
            info!(height, round, "Nil commit, skipping round");
            metrics::record_round_skipped();
            self.advance(height, round + 1);
            return;
        };

        if self.blockchain.extend(&commit) {
            info!(
                height,
                round,
                header = %block.header(),
                txs = block.txs().len(),
                signatories = commit.signatories.len(),
                "Block committed"
            );
            metrics::record_block_committed();
            self.advance(height + 1, 0);
        } else {
            error!(height, round, "Committed block does not extend the chain, skipping round");
            self.advance(height, round + 1);
        }
    }

    fn advance(&mut self, height: Height, round: Round) {
        self.state = State::WaitForPropose { height, round };
        self.polka_builder.drop_below(height, round);
        self.commit_builder.drop_below(height, round);
        self.buffer.drop_below(height, round);

        let replay = self.buffer.dequeue(height, round);
        if !replay.is_empty() {
            debug!(height, round, count = replay.len(), "Replaying buffered transitions");
        }
        self.pending.extend(replay);
    }
}
