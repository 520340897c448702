//! Recency-proportional resolution
//!
//! Dense retention near the present, exponentially sparser further back.
//! Uncertainty scales with how long ago the MRCA lived rather than with the
//! column's total depth: a divergence `k` generations back is resolved to
//! within about `k / resolution` ranks.

use serde::{Deserialize, Serialize};

use super::{detail, RankIter, RetentionPolicy};
use crate::Rank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecencyProportionalPolicy {
    /// Guaranteed resolution relative to MRCA recency; 0 keeps only a
    /// logarithmic skeleton with no guarantee
    resolution: u64,
}

/// Walks retained ranks from rank 0 toward the newest
struct RetainedRanks {
    resolution: u64,
    cur: Rank,
    last: Rank,
    num_strata_deposited: u64,
}

impl Iterator for RetainedRanks {
    type Item = Rank;

    fn next(&mut self) -> Option<Rank> {
        if self.cur >= self.num_strata_deposited {
            return None;
        }
        let rank = self.cur;
        let distance = self.last - rank;
        self.cur = if distance > self.resolution {
            let step = provided_uncertainty(self.resolution, distance);
            // stepping may land inside the dense tail; never go backward
            (rank + step).min(self.last.saturating_sub(self.resolution)).max(rank + 1)
        } else {
            rank + 1
        };
        Some(rank)
    }
}

/// Spacing allowed `distance` ranks back from the newest stratum
fn provided_uncertainty(resolution: u64, distance: u64) -> u64 {
    detail::bit_floor(distance / (resolution + 1)).max(1)
}

impl RecencyProportionalPolicy {
    pub fn new(resolution: u64) -> Self {
        Self { resolution }
    }

    pub fn resolution(&self) -> u64 {
        self.resolution
    }

    fn retained(&self, num_strata_deposited: u64) -> RetainedRanks {
        RetainedRanks {
            resolution: self.resolution,
            cur: 0,
            last: num_strata_deposited.saturating_sub(1),
            num_strata_deposited,
        }
    }
}

impl RetentionPolicy for RecencyProportionalPolicy {
    fn gen_drop_ranks(&self, num_depositions_completed: u64, retained_ranks: &[Rank]) -> Vec<Rank> {
        detail::drop_ranks_outside(retained_ranks, self.retained(num_depositions_completed + 1))
    }

    fn calc_rank_at_column_index(&self, index: u64, num_strata_deposited: u64) -> Option<Rank> {
        let index = usize::try_from(index).ok()?;
        let mut ranks = self.retained(num_strata_deposited);
        Some(ranks.nth(index).unwrap_or(num_strata_deposited.saturating_sub(1)))
    }

    fn iter_retained_ranks(&self, num_strata_deposited: u64) -> Option<RankIter<'_>> {
        Some(Box::new(self.retained(num_strata_deposited)))
    }

    fn calc_num_strata_retained_upper_bound(&self, num_strata_deposited: u64) -> u64 {
        let bound = (self.resolution + 1) * (detail::bit_length(num_strata_deposited) + 1);
        bound.min(num_strata_deposited)
    }

    fn calc_mrca_uncertainty_abs_upper_bound(&self, first: u64, second: u64, actual_mrca_rank: Rank) -> u64 {
        let worst = detail::worst_case_mrca_uncertainty(first, second);
        if self.resolution == 0 {
            return worst;
        }
        let since_mrca = first.max(second).saturating_sub(actual_mrca_rank);
        (since_mrca / self.resolution).min(worst)
    }

    fn calc_mrca_uncertainty_abs_upper_bound_pessimal_rank(&self, _first: u64, _second: u64) -> Rank {
        0
    }
}
