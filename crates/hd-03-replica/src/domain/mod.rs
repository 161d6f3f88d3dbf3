//! Domain layer for the replica

mod config;
mod error;
mod message;
mod shard;

pub use config::*;
pub use error::*;
pub use message::*;
pub use shard::*;
