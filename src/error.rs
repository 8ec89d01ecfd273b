use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Why a block failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityKind {
    /// `index` does not match the block's position.
    IndexMismatch,
    /// Stored hash differs from the hash recomputed from the fields.
    DigestMismatch,
    /// `previous_hash` does not match the preceding block's hash.
    BrokenLink,
}

impl fmt::Display for IntegrityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IntegrityKind::IndexMismatch => "index mismatch",
            IntegrityKind::DigestMismatch => "digest mismatch",
            IntegrityKind::BrokenLink => "broken link",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("chain integrity violation at block {index}: {kind}")]
pub struct IntegrityError {
    pub index: usize,
    pub kind: IntegrityKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoteError {
    #[error("voter {0} is not authorized")]
    InvalidVoter(String),

    #[error("voter {0} has already voted")]
    DuplicateVote(String),

    #[error("candidate {0} is not on the ballot")]
    UnknownCandidate(String),

    #[error("election is closed, {winner} has already won")]
    ElectionClosed { winner: String },
}

impl VoteError {
    /// Stable machine-readable name, used in API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            VoteError::InvalidVoter(_) => "InvalidVoter",
            VoteError::DuplicateVote(_) => "DuplicateVote",
            VoteError::UnknownCandidate(_) => "UnknownCandidate",
            VoteError::ElectionClosed { .. } => "ElectionClosed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditError {
    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error("tally drift for {candidate}: counted {counted}, ledger has {recorded}")]
    TallyDrift {
        candidate: String,
        counted: u64,
        recorded: u64,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read election config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse election config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid election config: {0}")]
    Invalid(String),

    #[error("{name} must be a valid {expected}, got {value:?}")]
    BadEnv {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}
