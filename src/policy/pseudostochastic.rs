//! Pseudostochastic retention — a salted hash decides each rank's fate
//!
//! When a stratum stops being the newest, it survives iff the SHA-256 digest
//! of (salt, rank) passes a coin test. Deterministic for a given salt, so
//! every column sharing the salt keeps the same ranks, but only about half
//! of all ranks are kept: column size grows linearly and the uncertainty
//! bound is empirical.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{RankIter, RetentionPolicy};
use crate::Rank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PseudostochasticPolicy {
    /// Salt mixed into every rank's hash
    hash_salt: u64,
}

impl PseudostochasticPolicy {
    pub fn new(hash_salt: u64) -> Self {
        Self { hash_salt }
    }

    pub fn hash_salt(&self) -> u64 {
        self.hash_salt
    }

    /// Coin test applied to a superseded rank
    pub fn survives(&self, rank: Rank) -> bool {
        let mut hasher = Sha256::new();
        hasher.update(self.hash_salt.to_le_bytes());
        hasher.update(rank.to_le_bytes());
        hasher.finalize()[0] & 1 == 0
    }
}

impl RetentionPolicy for PseudostochasticPolicy {
    fn gen_drop_ranks(&self, num_depositions_completed: u64, _retained_ranks: &[Rank]) -> Vec<Rank> {
        match num_depositions_completed.checked_sub(1) {
            Some(prev) if prev > 0 && !self.survives(prev) => vec![prev],
            _ => Vec::new(),
        }
    }

    fn reads_retained_ranks(&self) -> bool {
        false
    }

    fn iter_retained_ranks(&self, num_strata_deposited: u64) -> Option<RankIter<'_>> {
        let last = num_strata_deposited.saturating_sub(1);
        Some(Box::new(
            (0..num_strata_deposited).filter(move |&rank| rank == 0 || rank == last || self.survives(rank)),
        ))
    }
}
