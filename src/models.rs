use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

/// `previous_hash` of the genesis block.
pub const ZERO_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

pub const GENESIS_VOTER: &str = "Genesis";
pub const GENESIS_PAYLOAD: &str = "None";

/// The hashed part of a block.
///
/// The digest is SHA-256 over the compact JSON encoding of this struct, so the
/// field order below is part of the format:
///
/// ```text
/// {"index":..,"voter":..,"payload":..,"created_at":..,"previous_hash":..}
/// ```
#[derive(Serialize)]
pub struct BlockHeader<'a> {
    pub index: u64,
    pub voter: &'a str,
    pub payload: &'a str,
    pub created_at: u128,
    pub previous_hash: &'a str,
}

impl BlockHeader<'_> {
    pub fn digest(&self) -> String {
        // Serializing a struct of integers and strings cannot fail.
        let header_json = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&header_json);
        format!("{:x}", hasher.finalize())
    }
}

/// One vote (or the genesis marker) sealed into the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub(crate) index: u64,
    pub(crate) voter: String,
    pub(crate) payload: String,
    pub(crate) created_at: u128,
    pub(crate) previous_hash: String,
    pub(crate) hash: String,
}

impl Block {
    pub fn new(
        index: u64,
        voter: impl Into<String>,
        payload: impl Into<String>,
        created_at: u128,
        previous_hash: impl Into<String>,
    ) -> Self {
        let mut block = Block {
            index,
            voter: voter.into(),
            payload: payload.into(),
            created_at,
            previous_hash: previous_hash.into(),
            hash: String::new(),
        };
        block.hash = block.compute_hash();
        block
    }

    pub fn genesis(created_at: u128) -> Self {
        Block::new(0, GENESIS_VOTER, GENESIS_PAYLOAD, created_at, ZERO_HASH)
    }

    pub fn header(&self) -> BlockHeader<'_> {
        BlockHeader {
            index: self.index,
            voter: &self.voter,
            payload: &self.payload,
            created_at: self.created_at,
            previous_hash: &self.previous_hash,
        }
    }

    pub fn compute_hash(&self) -> String {
        self.header().digest()
    }

    /// True if the stored hash still matches the block's fields.
    pub fn is_sealed(&self) -> bool {
        self.hash == self.compute_hash()
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn voter(&self) -> &str {
        &self.voter
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn created_at(&self) -> u128 {
        self.created_at
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }
}

/// Milliseconds since the Unix epoch, 0 if the clock is before it.
pub fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic() {
        let a = Block::new(1, "V1", "Alice", 1_700_000_000_000, ZERO_HASH);
        let b = Block::new(1, "V1", "Alice", 1_700_000_000_000, ZERO_HASH);
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a.hash().len(), 64);
        assert!(a.hash().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn digest_covers_every_field() {
        let base = Block::new(1, "V1", "Alice", 42, ZERO_HASH);
        let variants = [
            Block::new(2, "V1", "Alice", 42, ZERO_HASH),
            Block::new(1, "V2", "Alice", 42, ZERO_HASH),
            Block::new(1, "V1", "Bob", 42, ZERO_HASH),
            Block::new(1, "V1", "Alice", 43, ZERO_HASH),
            Block::new(1, "V1", "Alice", 42, base.hash()),
        ];
        for v in &variants {
            assert_ne!(v.hash(), base.hash());
        }
    }

    #[test]
    fn field_boundaries_are_unambiguous() {
        // Plain concatenation would give both of these "V1Alice".
        let a = Block::new(1, "V1", "Alice", 0, ZERO_HASH);
        let b = Block::new(1, "V1A", "lice", 0, ZERO_HASH);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn header_encoding_is_fixed() {
        let block = Block::new(3, "V7", "Bob", 12, "ab");
        let json = serde_json::to_string(&block.header()).unwrap();
        assert_eq!(
            json,
            r#"{"index":3,"voter":"V7","payload":"Bob","created_at":12,"previous_hash":"ab"}"#
        );
    }

    #[test]
    fn genesis_block_shape() {
        let g = Block::genesis(5);
        assert!(g.is_genesis());
        assert_eq!(g.voter(), GENESIS_VOTER);
        assert_eq!(g.payload(), GENESIS_PAYLOAD);
        assert_eq!(g.previous_hash(), ZERO_HASH);
        assert!(g.is_sealed());
    }

    #[test]
    fn edited_block_is_not_sealed() {
        let mut block = Block::new(1, "V1", "Alice", 0, ZERO_HASH);
        block.payload = "Bob".into();
        assert!(!block.is_sealed());
    }
}
