//! Append-only block log
//!
//! Blocks are stored densely from height 1 and indexed by header. Genesis is
//! synthesized, never stored, and is what an empty chain reports as its head.

use crate::domain::{genesis, Commit, Height, Round, SignedBlock};
use shared_crypto::Hash;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Committed blocks of one shard
#[derive(Clone, Debug)]
pub struct Blockchain {
    genesis: SignedBlock,
    /// `blocks[i]` is at height `i + 1`
    blocks: Vec<SignedBlock>,
    by_header: HashMap<Hash, usize>,
}

impl Blockchain {
    pub fn new() -> Self {
        Self {
            genesis: genesis(),
            blocks: Vec::new(),
            by_header: HashMap::new(),
        }
    }

    /// Height of the head, 0 when empty
    pub fn height(&self) -> Height {
        self.head().0.height()
    }

    /// Round the head was committed in, 0 when empty
    pub fn round(&self) -> Round {
        self.head().0.round()
    }

    /// Highest stored block, or genesis with `false` when empty.
    pub fn head(&self) -> (&SignedBlock, bool) {
        match self.blocks.last() {
            Some(block) => (block, true),
            None => (&self.genesis, false),
        }
    }

    pub fn block_by_header(&self, header: &Hash) -> Option<&SignedBlock> {
        self.by_header.get(header).map(|&index| &self.blocks[index])
    }

    pub fn block_at(&self, height: Height) -> Option<&SignedBlock> {
        if height < 1 {
            return None;
        }
        self.blocks.get(usize::try_from(height - 1).ok()?)
    }

    /// Number of stored blocks (genesis excluded)
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Append the block certified by `commit`.
    ///
    /// Returns `false` and leaves the log untouched for a nil commit, for a
    /// block that is not at `height() + 1`, for a block whose parent is not
    /// the current head, and for a block that fails [`SignedBlock::verify`].
    pub fn extend(&mut self, commit: &Commit) -> bool {
        let Some(block) = commit.block() else {
            debug!(height = commit.height(), round = commit.round(), "Nil commit, log unchanged");
            return false;
        };

        let (head, _) = self.head();
        if block.height() != head.height() + 1 {
            warn!(
                expected = head.height() + 1,
                actual = block.height(),
                "Commit skips a height, ignoring"
            );
            return false;
        }
        if block.parent_header() != head.header() {
            warn!(
                height = block.height(),
                parent = %block.parent_header(),
                head = %head.header(),
                "Committed block does not extend head, ignoring"
            );
            return false;
        }
        if let Err(e) = block.verify() {
            warn!(height = block.height(), error = %e, "Committed block fails verification, ignoring");
            return false;
        }

        self.by_header.insert(block.header(), self.blocks.len());
        self.blocks.push(block.clone());
        debug!(
            height = block.height(),
            round = block.round(),
            header = %block.header(),
            txs = block.txs().len(),
            "Block appended"
        );
        true
    }
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}
