//! Stochastic retention — superseded strata survive by live coin flips
//!
//! Genuinely nondeterministic: two columns under the same policy keep
//! different ranks, so neither rank lookup nor iteration is available and the
//! uncertainty bound is the worst case.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::RetentionPolicy;
use crate::error::{Result, StrataError};
use crate::Rank;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StochasticParams")]
pub struct StochasticPolicy {
    /// Chance that a stratum survives once it stops being the newest
    retention_probability: f64,
}

#[derive(Deserialize)]
struct StochasticParams {
    retention_probability: f64,
}

impl TryFrom<StochasticParams> for StochasticPolicy {
    type Error = StrataError;

    fn try_from(params: StochasticParams) -> Result<Self> {
        Self::new(params.retention_probability)
    }
}

impl Default for StochasticPolicy {
    fn default() -> Self {
        Self {
            retention_probability: 0.5,
        }
    }
}

impl StochasticPolicy {
    pub fn new(retention_probability: f64) -> Result<Self> {
        let policy = Self { retention_probability };
        policy.validate()?;
        Ok(policy)
    }

    pub fn retention_probability(&self) -> f64 {
        self.retention_probability
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.retention_probability) {
            return Err(StrataError::InvalidPolicy(format!(
                "retention probability {} outside [0, 1]",
                self.retention_probability
            )));
        }
        Ok(())
    }
}

impl RetentionPolicy for StochasticPolicy {
    fn gen_drop_ranks(&self, num_depositions_completed: u64, _retained_ranks: &[Rank]) -> Vec<Rank> {
        match num_depositions_completed.checked_sub(1) {
            Some(prev) if prev > 0 && !rand::thread_rng().gen_bool(self.retention_probability) => {
                vec![prev]
            }
            _ => Vec::new(),
        }
    }

    fn reads_retained_ranks(&self) -> bool {
        false
    }
}
