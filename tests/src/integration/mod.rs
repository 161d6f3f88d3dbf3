//! # Integration Tests
//!
//! Whole-shard behavior across hd-01-block, hd-02-consensus and
//! hd-03-replica.

pub mod network;
pub mod safety;
pub mod scenarios;
