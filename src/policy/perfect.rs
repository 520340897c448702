//! Perfect resolution — keep every stratum
//!
//! Zero MRCA uncertainty at the cost of unbounded column growth.

use serde::{Deserialize, Serialize};

use super::{RankIter, RetentionPolicy};
use crate::Rank;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerfectPolicy;

impl RetentionPolicy for PerfectPolicy {
    fn gen_drop_ranks(&self, _num_depositions_completed: u64, _retained_ranks: &[Rank]) -> Vec<Rank> {
        Vec::new()
    }

    fn reads_retained_ranks(&self) -> bool {
        false
    }

    fn calc_rank_at_column_index(&self, index: u64, _num_strata_deposited: u64) -> Option<Rank> {
        Some(index)
    }

    fn iter_retained_ranks(&self, num_strata_deposited: u64) -> Option<RankIter<'_>> {
        Some(Box::new(0..num_strata_deposited))
    }

    fn calc_num_strata_retained_exact(&self, num_strata_deposited: u64) -> Option<u64> {
        Some(num_strata_deposited)
    }

    fn calc_mrca_uncertainty_abs_upper_bound(&self, _first: u64, _second: u64, _actual_mrca_rank: Rank) -> u64 {
        0
    }

    fn calc_mrca_uncertainty_abs_upper_bound_pessimal_rank(&self, _first: u64, _second: u64) -> Rank {
        0
    }
}
