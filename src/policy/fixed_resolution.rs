//! Fixed resolution — keep every `resolution`th stratum
//!
//! Column size grows linearly with depth; MRCA uncertainty never exceeds
//! `resolution - 1` ranks.

use serde::{Deserialize, Serialize};

use super::{RankIter, RetentionPolicy};
use crate::error::{Result, StrataError};
use crate::Rank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "FixedResolutionParams")]
pub struct FixedResolutionPolicy {
    /// Spacing between retained ranks
    resolution: u64,
}

/// Unchecked parameters as read from JSON
#[derive(Deserialize)]
struct FixedResolutionParams {
    resolution: u64,
}

impl TryFrom<FixedResolutionParams> for FixedResolutionPolicy {
    type Error = StrataError;

    fn try_from(params: FixedResolutionParams) -> Result<Self> {
        Self::new(params.resolution)
    }
}

impl FixedResolutionPolicy {
    pub fn new(resolution: u64) -> Result<Self> {
        let policy = Self { resolution };
        policy.validate()?;
        Ok(policy)
    }

    pub fn resolution(&self) -> u64 {
        self.resolution
    }

    pub fn validate(&self) -> Result<()> {
        if self.resolution == 0 {
            return Err(StrataError::InvalidPolicy(
                "fixed resolution must be at least 1".into(),
            ));
        }
        Ok(())
    }

    fn is_off_grid(&self, rank: Rank) -> bool {
        rank % self.resolution != 0
    }
}

impl RetentionPolicy for FixedResolutionPolicy {
    fn gen_drop_ranks(&self, num_depositions_completed: u64, _retained_ranks: &[Rank]) -> Vec<Rank> {
        match num_depositions_completed.checked_sub(1) {
            Some(prev) if prev > 0 && self.is_off_grid(prev) => vec![prev],
            _ => Vec::new(),
        }
    }

    fn reads_retained_ranks(&self) -> bool {
        false
    }

    fn calc_rank_at_column_index(&self, index: u64, num_strata_deposited: u64) -> Option<Rank> {
        let last = num_strata_deposited.saturating_sub(1);
        Some(index.saturating_mul(self.resolution).min(last))
    }

    fn iter_retained_ranks(&self, num_strata_deposited: u64) -> Option<RankIter<'_>> {
        let last = num_strata_deposited.checked_sub(1);
        let on_grid = (0..num_strata_deposited).step_by(self.resolution as usize);
        let tail = last.filter(|&r| self.is_off_grid(r));
        Some(Box::new(on_grid.chain(tail)))
    }

    fn calc_num_strata_retained_exact(&self, num_strata_deposited: u64) -> Option<u64> {
        let on_grid = num_strata_deposited.div_ceil(self.resolution);
        let tail = match num_strata_deposited.checked_sub(1) {
            Some(last) if self.is_off_grid(last) => 1,
            _ => 0,
        };
        Some(on_grid + tail)
    }

    fn calc_num_strata_retained_upper_bound(&self, num_strata_deposited: u64) -> u64 {
        num_strata_deposited.div_ceil(self.resolution) + 1
    }

    fn calc_mrca_uncertainty_abs_upper_bound(&self, first: u64, second: u64, _actual_mrca_rank: Rank) -> u64 {
        let least_last_rank = first.min(second).saturating_sub(1);
        (self.resolution - 1).min(least_last_rank)
    }

    fn calc_mrca_uncertainty_abs_upper_bound_pessimal_rank(&self, _first: u64, _second: u64) -> Rank {
        0
    }
}
