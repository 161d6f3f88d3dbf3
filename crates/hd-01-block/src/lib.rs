//! # hd-01-block
//!
//! Block subsystem for Hyperdrive.
//!
//! ## Architecture
//!
//! ```text
//! SignedPreVote ──→ [PolkaBuilder] ──Polka──┐
//!                                           ↓
//! SignedPreCommit ─→ [CommitBuilder] ──Commit──→ [Blockchain::extend]
//! ```
//!
//! - `domain`: blocks, votes and quorum certificates
//! - `builder`: per `(height, round)` vote accumulators
//! - `blockchain`: the append-only log of committed blocks
//! - `codec`: bincode encoding of every message shape
//!
//! ## Safety
//!
//! Builders verify every vote before counting it, count each signatory at
//! most once per point, and freeze the first certificate they form. The log
//! only grows through a commit whose block extends the current head.

pub mod blockchain;
pub mod builder;
pub mod codec;
pub mod domain;

pub use blockchain::Blockchain;
pub use builder::{CommitBuilder, PolkaBuilder, QuorumBuilder};
pub use domain::{
    genesis, pre_commit_digest, pre_vote_digest, Block, BlockError, BlockResult, Commit, Height,
    Polka, PreCommit, PreVote, Round, SignedBlock, SignedPreCommit, SignedPreVote, Transaction,
    Vote,
};
