//! One election session: eligibility and duplicate gating in front of the
//! chain, the running tally, and the win signal.

use log::{info, warn};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashSet;

use crate::chain::Blockchain;
use crate::config::ElectionConfig;
use crate::error::{AuditError, ConfigError, VoteError};
use crate::models::Block;

/// Per-candidate counts, in ballot order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    counts: Vec<(String, u64)>,
}

impl Tally {
    pub fn new<S: AsRef<str>>(candidates: &[S]) -> Self {
        Tally {
            counts: candidates
                .iter()
                .map(|c| (c.as_ref().to_string(), 0))
                .collect(),
        }
    }

    /// Recounts from the ledger. Blocks whose payload is not a candidate
    /// (the genesis block) are skipped.
    pub fn from_blocks<'a, S, I>(candidates: &[S], blocks: I) -> Self
    where
        S: AsRef<str>,
        I: IntoIterator<Item = &'a Block>,
    {
        let mut tally = Tally::new(candidates);
        for block in blocks {
            if block.is_genesis() {
                continue;
            }
            tally.increment(block.payload());
        }
        tally
    }

    /// Returns the new count, or `None` for an unknown candidate.
    fn increment(&mut self, candidate: &str) -> Option<u64> {
        let entry = self.counts.iter_mut().find(|(c, _)| c == candidate)?;
        entry.1 += 1;
        Some(entry.1)
    }

    pub fn get(&self, candidate: &str) -> Option<u64> {
        self.counts
            .iter()
            .find(|(c, _)| c == candidate)
            .map(|(_, n)| *n)
    }

    pub fn contains(&self, candidate: &str) -> bool {
        self.get(candidate).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(c, n)| (c.as_str(), *n))
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|(_, n)| n).sum()
    }
}

impl Serialize for Tally {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for (candidate, votes) in &self.counts {
            map.serialize_entry(candidate, votes)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Victory {
    pub winner: String,
    pub tally: Tally,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Receipt {
    pub index: u64,
    pub hash: String,
    pub victory: Option<Victory>,
}

type VictoryListener = Box<dyn FnMut(&Victory) + Send>;

pub struct Election {
    config: ElectionConfig,
    eligible: HashSet<String>,
    used_voters: HashSet<String>,
    tally: Tally,
    winner: Option<String>,
    chain: Blockchain,
    listeners: Vec<VictoryListener>,
}

impl Election {
    pub fn new(config: ElectionConfig) -> Result<Self, ConfigError> {
        Self::with_chain(config, Blockchain::new())
    }

    /// Resumes a session on an existing chain. Voters already on the chain
    /// are marked as used and the tally and winner are rebuilt from it.
    pub fn with_chain(config: ElectionConfig, chain: Blockchain) -> Result<Self, ConfigError> {
        config.validate()?;
        let eligible = config.voters.iter().cloned().collect();
        let mut election = Election {
            tally: Tally::new(config.candidates.as_slice()),
            config,
            eligible,
            used_voters: HashSet::new(),
            winner: None,
            chain,
            listeners: Vec::new(),
        };
        for block in election.chain.iter().skip(1) {
            election.used_voters.insert(block.voter().to_string());
            let count = election.tally.increment(block.payload()).unwrap_or_default();
            if election.winner.is_none() && count >= election.config.win_threshold {
                election.winner = Some(block.payload().to_string());
            }
        }
        Ok(election)
    }

    /// Registers a callback fired once, when the first candidate reaches
    /// the win threshold.
    pub fn on_victory<F>(&mut self, listener: F)
    where
        F: FnMut(&Victory) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn submit(&mut self, voter: &str, candidate: &str) -> Result<Receipt, VoteError> {
        if let Err(err) = self.check(voter, candidate) {
            warn!("vote rejected: {}", err);
            return Err(err);
        }

        let block = self.chain.append(voter, candidate);
        let mut receipt = Receipt {
            index: block.index(),
            hash: block.hash().to_string(),
            victory: None,
        };
        self.used_voters.insert(voter.to_string());
        let count = self.tally.increment(candidate).unwrap_or_default();
        info!("vote {} recorded for {} ({} votes)", receipt.index, candidate, count);

        if self.winner.is_none() && count >= self.config.win_threshold {
            let victory = Victory {
                winner: candidate.to_string(),
                tally: self.tally.clone(),
            };
            info!("{} wins {} with {} votes", candidate, self.config.name, count);
            self.winner = Some(candidate.to_string());
            for listener in &mut self.listeners {
                listener(&victory);
            }
            receipt.victory = Some(victory);
        }
        Ok(receipt)
    }

    fn check(&self, voter: &str, candidate: &str) -> Result<(), VoteError> {
        if let Some(winner) = &self.winner {
            if self.config.close_on_win {
                return Err(VoteError::ElectionClosed {
                    winner: winner.clone(),
                });
            }
        }
        if !self.is_eligible(voter) {
            return Err(VoteError::InvalidVoter(voter.to_string()));
        }
        if !self.tally.contains(candidate) {
            return Err(VoteError::UnknownCandidate(candidate.to_string()));
        }
        if self.has_voted(voter) {
            return Err(VoteError::DuplicateVote(voter.to_string()));
        }
        Ok(())
    }

    /// Verifies the chain and checks the running tally against a recount.
    pub fn audit(&self) -> Result<(), AuditError> {
        self.chain.verify()?;
        let recount = Tally::from_blocks(self.config.candidates.as_slice(), &self.chain);
        for ((candidate, counted), (_, recorded)) in self.tally.iter().zip(recount.iter()) {
            if counted != recorded {
                return Err(AuditError::TallyDrift {
                    candidate: candidate.to_string(),
                    counted,
                    recorded,
                });
            }
        }
        Ok(())
    }

    pub fn is_eligible(&self, voter: &str) -> bool {
        self.eligible.contains(voter)
    }

    pub fn has_voted(&self, voter: &str) -> bool {
        self.used_voters.contains(voter)
    }

    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    pub fn chain(&self) -> &Blockchain {
        &self.chain
    }

    pub fn blocks(&self) -> &[Block] {
        self.chain.blocks()
    }

    pub fn config(&self) -> &ElectionConfig {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn chain_mut(&mut self) -> &mut Blockchain {
        &mut self.chain
    }
}
