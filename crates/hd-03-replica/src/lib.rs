//! # Replica
//!
//! Runs the consensus state machine for one shard.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐ Message ┌────────────────────────────────────────┐
//! │   channel    │────────▶│ worker                                 │
//! └──────────────┘         │  batch ─▶ verify (rayon) ─▶ Replica    │
//!        ▲                 │                             │          │
//!        │                 │              StateMachine ◀─┘          │
//!        │                 └─────────────────┬──────────────────────┘
//!        │      Transition                   │ Action
//!        └───────────────── Dispatcher ◀─────┘
//! ```
//!
//! - Proposals are only accepted from the round-robin proposer of their point
//! - Votes are only accepted from shard members
//! - Committed transactions are removed from the pool
//!
//! The `hd-localnet` binary runs a full shard in-process via [`LocalNet`].

pub mod adapters;
pub mod domain;
pub mod localnet;
pub mod ports;
pub mod service;
pub mod worker;

pub use adapters::{ChannelDispatcher, FifoPool, DEFAULT_POOL_CAPACITY};
pub use domain::{Message, ReplicaConfig, ReplicaError, ReplicaEvent, Shard};
pub use localnet::{LocalNet, LocalReplica};
pub use ports::{Dispatcher, TxPool};
pub use service::Replica;
pub use worker::{run_worker, verify_transitions, MAX_BATCH};
