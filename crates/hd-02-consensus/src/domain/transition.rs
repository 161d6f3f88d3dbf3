//! Transitions consumed and actions emitted by the state machine

use hd_01_block::{BlockResult, Height, Round, SignedBlock, SignedPreCommit, SignedPreVote};
use serde::{Deserialize, Serialize};

/// Event fed into the state machine
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    Proposed(SignedBlock),
    PreVoted(SignedPreVote),
    PreCommitted(SignedPreCommit),
    /// Injected by whoever owns the wall clock when no proposal arrived in time
    TimedOut { height: Height, round: Round },
}

impl Transition {
    /// `(height, round)` the transition belongs to
    pub fn point(&self) -> (Height, Round) {
        match self {
            Transition::Proposed(block) => (block.height(), block.round()),
            Transition::PreVoted(vote) => (vote.pre_vote.height, vote.pre_vote.round),
            Transition::PreCommitted(vote) => (vote.pre_commit.height, vote.pre_commit.round),
            Transition::TimedOut { height, round } => (*height, *round),
        }
    }

    pub fn height(&self) -> Height {
        self.point().0
    }

    pub fn round(&self) -> Round {
        self.point().1
    }

    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Transition::Proposed(_) => "proposed",
            Transition::PreVoted(_) => "pre_voted",
            Transition::PreCommitted(_) => "pre_committed",
            Transition::TimedOut { .. } => "timed_out",
        }
    }

    /// Signature check, side-effect free and safe to run in parallel.
    pub fn verify(&self) -> BlockResult<()> {
        match self {
            Transition::Proposed(block) => block.verify(),
            Transition::PreVoted(vote) => vote.verify(),
            Transition::PreCommitted(vote) => vote.verify(),
            Transition::TimedOut { .. } => Ok(()),
        }
    }
}

/// Intent emitted by the state machine, to be broadcast by a dispatcher
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Propose(SignedBlock),
    PreVote(SignedPreVote),
    PreCommit(SignedPreCommit),
}

impl Action {
    pub fn point(&self) -> (Height, Round) {
        match self {
            Action::Propose(block) => (block.height(), block.round()),
            Action::PreVote(vote) => (vote.pre_vote.height, vote.pre_vote.round),
            Action::PreCommit(vote) => (vote.pre_commit.height, vote.pre_commit.round),
        }
    }
}

/// What a peer sees when an action is delivered.
impl From<Action> for Transition {
    fn from(action: Action) -> Self {
        match action {
            Action::Propose(block) => Transition::Proposed(block),
            Action::PreVote(vote) => Transition::PreVoted(vote),
            Action::PreCommit(vote) => Transition::PreCommitted(vote),
        }
    }
}
