//! Adapters for the replica ports

mod dispatcher;
mod pool;

pub use dispatcher::ChannelDispatcher;
pub use pool::{FifoPool, DEFAULT_POOL_CAPACITY};
