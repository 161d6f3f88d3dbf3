//! Domain layer for the consensus subsystem

mod config;
mod error;
mod state;
mod transition;

pub use config::*;
pub use error::*;
pub use state::*;
pub use transition::*;
