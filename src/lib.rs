//! Tamper-evident vote ledger: a SHA-256 hash chain of ballots, an election
//! session that gates votes against an allow-list, and a small HTTP front end.

pub mod chain;
pub mod config;
pub mod election;
pub mod error;
pub mod models;
pub mod server;

pub use chain::{verify_blocks, Blockchain};
pub use config::{ElectionConfig, ServerConfig};
pub use election::{Election, Receipt, Tally, Victory};
pub use error::{AuditError, ConfigError, IntegrityError, IntegrityKind, VoteError};
pub use models::{Block, ZERO_HASH};
