//! Domain layer for the block subsystem
//!
//! - block: blocks, transactions, genesis
//! - vote: pre-votes, pre-commits and their signing digests
//! - certificate: polkas and commits

mod block;
mod certificate;
mod error;
mod vote;

pub use block::*;
pub use certificate::*;
pub use error::*;
pub use vote::*;
