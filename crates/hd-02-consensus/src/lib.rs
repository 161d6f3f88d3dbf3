//! # hd-02-consensus
//!
//! Round-based BFT decision engine for Hyperdrive.
//!
//! ## Architecture
//!
//! A [`StateMachine`] owns the [`Blockchain`](hd_01_block::Blockchain), the
//! polka and commit builders and a [`TransitionBuffer`]. Verified network
//! messages enter as [`Transition`]s; the machine answers with [`Action`]s for
//! a dispatcher to broadcast. It never blocks and never performs I/O.
//!
//! ```text
//! Transition ──→ [StateMachine] ──→ Vec<Action>
//!                   │     ↑
//!          future   ↓     │ replay on advance
//!               [TransitionBuffer]
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hd_02_consensus::{ConsensusConfig, StateMachine, Transition};
//!
//! let mut machine = StateMachine::new(ConsensusConfig::for_validators(4), signer, Blockchain::new())?;
//! for action in machine.transition(Transition::Proposed(block))? {
//!     dispatcher.dispatch(action).await?;
//! }
//! ```
//!
//! ## Safety
//!
//! Heights only advance through a commit certificate, and rounds only skip
//! through a nil commit certificate. Timeouts can make a replica pre-vote nil
//! but never move it past a round on their own.

pub mod buffer;
pub mod domain;
pub mod metrics;
pub mod service;

pub use buffer::TransitionBuffer;
pub use domain::{
    quorum_threshold, Action, ConsensusConfig, ConsensusError, ConsensusResult, State, Transition,
    DEFAULT_BUFFER_CAPACITY,
};
pub use service::StateMachine;
