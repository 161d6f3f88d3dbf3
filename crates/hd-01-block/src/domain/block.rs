//! Blocks and transactions

use super::{BlockError, BlockResult};
use crate::codec;
use serde::{Deserialize, Serialize};
use shared_crypto::{Hash, Signatory, Signature, Signer};
use std::fmt;

/// Position of a block in the chain. Genesis is height 0.
pub type Height = i64;

/// Voting attempt within a height. Resets to 0 at every new height.
pub type Round = i64;

/// Opaque transaction payload
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction(pub Vec<u8>);

impl Transaction {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// SHA-256 of the payload
    pub fn hash(&self) -> Hash {
        Hash::digest(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transaction({} bytes, {:?})", self.0.len(), self.hash())
    }
}

/// Unsigned block
///
/// `header` is the SHA-256 of the encoded content fields and doubles as the
/// block's identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Unix timestamp (seconds)
    pub time: u64,
    pub height: Height,
    pub round: Round,
    pub header: Hash,
    pub parent_header: Hash,
    pub txs: Vec<Transaction>,
}

/// Everything that goes into a header
#[derive(Serialize)]
struct BlockContent<'a> {
    time: u64,
    height: Height,
    round: Round,
    parent_header: &'a Hash,
    txs: &'a [Transaction],
}

impl Block {
    /// Build a block and compute its header.
    pub fn new(
        time: u64,
        height: Height,
        round: Round,
        parent_header: Hash,
        txs: Vec<Transaction>,
    ) -> BlockResult<Self> {
        let mut block = Self {
            time,
            height,
            round,
            header: Hash::ZERO,
            parent_header,
            txs,
        };
        block.header = block.compute_header()?;
        Ok(block)
    }

    /// Recompute the header from the content fields.
    pub fn compute_header(&self) -> BlockResult<Hash> {
        let content = BlockContent {
            time: self.time,
            height: self.height,
            round: self.round,
            parent_header: &self.parent_header,
            txs: &self.txs,
        };
        Ok(Hash::digest(&codec::encode(&content)?))
    }

    /// Sign the header, producing a proposal.
    pub fn sign<S: Signer + ?Sized>(self, signer: &S) -> BlockResult<SignedBlock> {
        let signature = signer.sign(&self.header)?;
        Ok(SignedBlock {
            block: self,
            signature,
            signatory: signer.signatory(),
        })
    }
}

/// A block together with its proposer's signature over the header
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedBlock {
    pub block: Block,
    pub signature: Signature,
    pub signatory: Signatory,
}

impl SignedBlock {
    pub fn header(&self) -> Hash {
        self.block.header
    }

    pub fn parent_header(&self) -> Hash {
        self.block.parent_header
    }

    pub fn height(&self) -> Height {
        self.block.height
    }

    pub fn round(&self) -> Round {
        self.block.round
    }

    pub fn txs(&self) -> &[Transaction] {
        &self.block.txs
    }

    pub fn is_genesis(&self) -> bool {
        *self == genesis()
    }

    /// Check header integrity, then that the signature recovers to the
    /// embedded signatory.
    pub fn verify(&self) -> BlockResult<()> {
        let computed = self.block.compute_header()?;
        if computed != self.block.header {
            return Err(BlockError::HeaderMismatch {
                expected: self.block.header,
                computed,
            });
        }
        let recovered = self.signature.recover(&self.block.header)?;
        if recovered != self.signatory {
            return Err(BlockError::InvalidSignature(self.signatory));
        }
        Ok(())
    }
}

/// The synthetic block at height 0. Never received, never stored.
pub fn genesis() -> SignedBlock {
    SignedBlock {
        block: Block {
            time: 0,
            height: 0,
            round: 0,
            header: Hash::ZERO,
            parent_header: Hash::ZERO,
            txs: Vec::new(),
        },
        signature: Signature::ZERO,
        signatory: Signatory::ZERO,
    }
}
