//! Depth-proportional resolution, tapered
//!
//! Same stride as the plain depth-proportional policy, but instead of
//! discarding half the column at once when the stride doubles, the finer
//! half-stride ranks are coalesced from the oldest end first. The column
//! never exceeds `2 * resolution + 1` strata.

use serde::{Deserialize, Serialize};

use super::depth_proportional::provided_stride;
use super::{detail, RankIter, RetentionPolicy};
use crate::error::{Result, StrataError};
use crate::Rank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "DepthProportionalTaperedParams")]
pub struct DepthProportionalTaperedPolicy {
    /// Target number of uncertainty intervals spanning the column
    resolution: u64,
}

#[derive(Deserialize)]
struct DepthProportionalTaperedParams {
    resolution: u64,
}

impl TryFrom<DepthProportionalTaperedParams> for DepthProportionalTaperedPolicy {
    type Error = StrataError;

    fn try_from(params: DepthProportionalTaperedParams) -> Result<Self> {
        Self::new(params.resolution)
    }
}

/// Retained ranks: multiples of `stride` below `threshold`, multiples of
/// `half_stride` from `threshold` up to `last`, then `last`
struct Layout {
    stride: u64,
    half_stride: u64,
    threshold: Rank,
    last: Rank,
}

impl Layout {
    fn num_coarse(&self) -> u64 {
        self.threshold.div_ceil(self.stride)
    }

    fn len(&self) -> u64 {
        self.num_coarse() + (self.last - self.threshold).div_ceil(self.half_stride) + 1
    }
}

impl DepthProportionalTaperedPolicy {
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
                "tapered depth-proportional resolution must be at least 1".into(),
            ));
        }
        Ok(())
    }

    fn capacity(&self) -> u64 {
        2 * self.resolution + 1
    }

    /// `None` for an empty column
    fn layout(&self, num_strata_deposited: u64) -> Option<Layout> {
        let last = num_strata_deposited.checked_sub(1)?;
        let stride = provided_stride(self.resolution, num_strata_deposited);
        let half_stride = (stride / 2).max(1);
        if stride == 1 || last == 0 {
            return Some(Layout { stride, half_stride, threshold: last, last });
        }

        // strata the plain depth-proportional layout would keep
        let base = num_strata_deposited.div_ceil(stride) + u64::from(last % stride != 0);
        // odd multiples of the half stride strictly between 0 and last
        let top_multiple = (last - 1) / half_stride;
        let num_odd = (top_multiple + 1) / 2;
        let kept = self.capacity().saturating_sub(base).min(num_odd);

        let threshold = if kept == 0 {
            last
        } else {
            let top_odd = if top_multiple % 2 == 1 { top_multiple } else { top_multiple - 1 };
            (top_odd - 2 * (kept - 1)) * half_stride
        };
        Some(Layout { stride, half_stride, threshold, last })
    }
}

impl RetentionPolicy for DepthProportionalTaperedPolicy {
    fn gen_drop_ranks(&self, num_depositions_completed: u64, retained_ranks: &[Rank]) -> Vec<Rank> {
        let keep = self.iter_retained_ranks(num_depositions_completed + 1);
        keep.map_or_else(Vec::new, |keep| detail::drop_ranks_outside(retained_ranks, keep))
    }

    fn calc_rank_at_column_index(&self, index: u64, num_strata_deposited: u64) -> Option<Rank> {
        let Some(layout) = self.layout(num_strata_deposited) else {
            return Some(0);
        };
        let num_coarse = layout.num_coarse();
        let rank = if index < num_coarse {
            index * layout.stride
        } else {
            (index - num_coarse)
                .saturating_mul(layout.half_stride)
                .saturating_add(layout.threshold)
                .min(layout.last)
        };
        Some(rank)
    }

    fn iter_retained_ranks(&self, num_strata_deposited: u64) -> Option<RankIter<'_>> {
        let Some(layout) = self.layout(num_strata_deposited) else {
            return Some(Box::new(std::iter::empty()));
        };
        let coarse = (0..layout.threshold).step_by(layout.stride as usize);
        let fine = (layout.threshold..layout.last).step_by(layout.half_stride as usize);
        Some(Box::new(coarse.chain(fine).chain(std::iter::once(layout.last))))
    }

    fn calc_num_strata_retained_exact(&self, num_strata_deposited: u64) -> Option<u64> {
        Some(self.layout(num_strata_deposited).map_or(0, |layout| layout.len()))
    }

    fn calc_num_strata_retained_upper_bound(&self, num_strata_deposited: u64) -> u64 {
        self.capacity().min(num_strata_deposited)
    }

    fn calc_mrca_uncertainty_abs_upper_bound(&self, first: u64, second: u64, _actual_mrca_rank: Rank) -> u64 {
        let deepest = first.max(second);
        (deepest / self.resolution).min(deepest)
    }

    fn calc_mrca_uncertainty_abs_upper_bound_pessimal_rank(&self, _first: u64, _second: u64) -> Rank {
        0
    }
}
