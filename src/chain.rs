//! Append-only hash chain.
//!
//! Every block commits to the hash of the block before it, so editing any
//! stored block is detectable by [`Blockchain::verify`]. The chain always
//! holds its genesis block and only ever grows.

use log::{debug, warn};

use crate::error::{IntegrityError, IntegrityKind};
use crate::models::{now_millis, Block, ZERO_HASH};

#[derive(Debug, Clone)]
pub struct Blockchain {
    blocks: Vec<Block>,
}

impl Blockchain {
    pub fn new() -> Self {
        Self::with_genesis_at(now_millis())
    }

    pub fn with_genesis_at(created_at: u128) -> Self {
        Blockchain {
            blocks: vec![Block::genesis(created_at)],
        }
    }

    pub fn append(&mut self, voter: &str, payload: &str) -> &Block {
        self.append_at(voter, payload, now_millis())
    }

    /// Appends with a caller-supplied timestamp. No validation happens here;
    /// eligibility is the caller's job.
    pub fn append_at(&mut self, voter: &str, payload: &str, created_at: u128) -> &Block {
        let previous_hash = self.last().hash().to_string();
        let block = Block::new(
            self.blocks.len() as u64,
            voter,
            payload,
            created_at,
            previous_hash,
        );
        debug!("block {} sealed: {} -> {}", block.index(), block.voter(), block.hash());
        self.blocks.push(block);
        self.last()
    }

    /// Checks every block against its own fields and its predecessor.
    pub fn verify(&self) -> Result<(), IntegrityError> {
        verify_blocks(&self.blocks)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn last(&self) -> &Block {
        // The genesis block is never removed.
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Never true: the genesis block is always present.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn block_mut(&mut self, index: usize) -> &mut Block {
        &mut self.blocks[index]
    }
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a Blockchain {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Verifies an ordered run of blocks starting at genesis, such as an exported
/// history. Reports the first violation found.
pub fn verify_blocks(blocks: &[Block]) -> Result<(), IntegrityError> {
    let mut expected_previous = ZERO_HASH;
    for (position, block) in blocks.iter().enumerate() {
        let kind = if block.index() != position as u64 {
            Some(IntegrityKind::IndexMismatch)
        } else if !block.is_sealed() {
            Some(IntegrityKind::DigestMismatch)
        } else if block.previous_hash() != expected_previous {
            Some(IntegrityKind::BrokenLink)
        } else {
            None
        };
        if let Some(kind) = kind {
            let err = IntegrityError { index: position, kind };
            warn!("{}", err);
            return Err(err);
        }
        expected_previous = block.hash();
    }
    Ok(())
}
