//! Binary codec for blocks, votes and certificates.
//!
//! Fixed-width little-endian bincode. The same encoding is hashed to produce
//! block headers, so it must stay stable.

use crate::domain::{BlockError, BlockResult};
use bincode::Options;
use serde::{de::DeserializeOwned, Serialize};

/// Upper bound on a decoded message.
pub const MAX_MESSAGE_SIZE: u64 = 16 * 1024 * 1024;

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_MESSAGE_SIZE)
        .reject_trailing_bytes()
}

/// Encode any message shape.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> BlockResult<Vec<u8>> {
    options()
        .serialize(value)
        .map_err(|e| BlockError::Codec(e.to_string()))
}

/// Decode a message shape. Truncated or garbage input is an error.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> BlockResult<T> {
    options()
        .deserialize(bytes)
        .map_err(|e| BlockError::Codec(e.to_string()))
}
