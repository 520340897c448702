//! Depth-proportional resolution — thin geometrically as the column deepens
//!
//! Retains multiples of a power-of-two stride that doubles whenever depth
//! outgrows `resolution` intervals, keeping at most `2 * resolution + 1`
//! strata. Uncertainty scales with total depth divided by `resolution`.

use serde::{Deserialize, Serialize};

use super::{detail, RankIter, RetentionPolicy};
use crate::error::{Result, StrataError};
use crate::Rank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "DepthProportionalParams")]
pub struct DepthProportionalPolicy {
    /// Target number of uncertainty intervals spanning the column
    resolution: u64,
}

#[derive(Deserialize)]
struct DepthProportionalParams {
    resolution: u64,
}

impl TryFrom<DepthProportionalParams> for DepthProportionalPolicy {
    type Error = StrataError;

    fn try_from(params: DepthProportionalParams) -> Result<Self> {
        Self::new(params.resolution)
    }
}

/// Spacing between retained ranks once `num_strata_deposited` strata exist
pub(super) fn provided_stride(resolution: u64, num_strata_deposited: u64) -> u64 {
    detail::bit_floor(num_strata_deposited / resolution).max(1)
}

impl DepthProportionalPolicy {
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
                "depth-proportional resolution must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl RetentionPolicy for DepthProportionalPolicy {
    fn gen_drop_ranks(&self, num_depositions_completed: u64, retained_ranks: &[Rank]) -> Vec<Rank> {
        let keep = self.iter_retained_ranks(num_depositions_completed + 1);
        keep.map_or_else(Vec::new, |keep| detail::drop_ranks_outside(retained_ranks, keep))
    }

    fn calc_rank_at_column_index(&self, index: u64, num_strata_deposited: u64) -> Option<Rank> {
        let stride = provided_stride(self.resolution, num_strata_deposited);
        let last = num_strata_deposited.saturating_sub(1);
        Some(index.saturating_mul(stride).min(last))
    }

    fn iter_retained_ranks(&self, num_strata_deposited: u64) -> Option<RankIter<'_>> {
        let stride = provided_stride(self.resolution, num_strata_deposited);
        let on_grid = (0..num_strata_deposited).step_by(stride as usize);
        let tail = num_strata_deposited
            .checked_sub(1)
            .filter(|last| last % stride != 0);
        Some(Box::new(on_grid.chain(tail)))
    }

    fn calc_num_strata_retained_exact(&self, num_strata_deposited: u64) -> Option<u64> {
        let stride = provided_stride(self.resolution, num_strata_deposited);
        let tail = match num_strata_deposited.checked_sub(1) {
            Some(last) if last % stride != 0 => 1,
            _ => 0,
        };
        Some(num_strata_deposited.div_ceil(stride) + tail)
    }

    fn calc_num_strata_retained_upper_bound(&self, num_strata_deposited: u64) -> u64 {
        (2 * self.resolution + 1).min(num_strata_deposited)
    }

    fn calc_mrca_uncertainty_abs_upper_bound(&self, first: u64, second: u64, _actual_mrca_rank: Rank) -> u64 {
        let deepest = first.max(second);
        (deepest / self.resolution).min(deepest)
    }

    fn calc_mrca_uncertainty_abs_upper_bound_pessimal_rank(&self, _first: u64, _second: u64) -> Rank {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride_doubles() {
        assert_eq!(provided_stride(4, 3), 1);
        assert_eq!(provided_stride(4, 8), 2);
        assert_eq!(provided_stride(4, 15), 2);
        assert_eq!(provided_stride(4, 16), 4);
    }

    #[test]
    fn test_retained_ranks() {
        let policy = DepthProportionalPolicy::new(2).unwrap();
        // stride 4 at 9 depositions
        let ranks: Vec<Rank> = policy.iter_retained_ranks(9).unwrap().collect();
        assert_eq!(ranks, vec![0, 4, 8]);
        let ranks: Vec<Rank> = policy.iter_retained_ranks(10).unwrap().collect();
        assert_eq!(ranks, vec![0, 4, 8, 9]);
    }

    #[test]
    fn test_memory_stays_bounded() {
        let policy = DepthProportionalPolicy::new(3).unwrap();
        for n in 1..5_000 {
            let exact = policy.calc_num_strata_retained_exact(n).unwrap();
            assert!(exact <= 7, "{} strata at depth {}", exact, n);
        }
    }

    #[test]
    fn test_drop_ranks_on_stride_change() {
        let policy = DepthProportionalPolicy::new(1).unwrap();
        // depositions 0..=3 done; stride becomes 4 at 4 depositions
        let dropped = policy.gen_drop_ranks(3, &[0, 2, 3]);
        assert_eq!(dropped, vec![2]);
    }
}
