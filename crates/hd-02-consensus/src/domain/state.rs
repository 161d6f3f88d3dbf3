//! Round phases

use hd_01_block::{Height, Round};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of the state machine at one `(height, round)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum State {
    WaitForPropose { height: Height, round: Round },
    WaitForPolka { height: Height, round: Round },
    WaitForCommit { height: Height, round: Round },
}

impl State {
    pub fn height(&self) -> Height {
        self.point().0
    }

    pub fn round(&self) -> Round {
        self.point().1
    }

    /// `(height, round)`, ordered lexicographically
    pub fn point(&self) -> (Height, Round) {
        match *self {
            State::WaitForPropose { height, round }
            | State::WaitForPolka { height, round }
            | State::WaitForCommit { height, round } => (height, round),
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (height, round) = self.point();
        let phase = match self {
            State::WaitForPropose { .. } => "WaitForPropose",
            State::WaitForPolka { .. } => "WaitForPolka",
            State::WaitForCommit { .. } => "WaitForCommit",
        };
        write!(f, "{phase}({height}, {round})")
    }
}
