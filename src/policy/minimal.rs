//! Minimal resolution — keep only the anchors
//!
//! Retains rank 0 and the newest rank. Constant memory; the MRCA estimate
//! carries essentially no guarantee.

use serde::{Deserialize, Serialize};

use super::{RankIter, RetentionPolicy};
use crate::Rank;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimalPolicy;

impl RetentionPolicy for MinimalPolicy {
    fn gen_drop_ranks(&self, num_depositions_completed: u64, _retained_ranks: &[Rank]) -> Vec<Rank> {
        // the previous newest rank is superseded unless it is rank 0
        if num_depositions_completed >= 2 {
            vec![num_depositions_completed - 1]
        } else {
            Vec::new()
        }
    }

    fn reads_retained_ranks(&self) -> bool {
        false
    }

    fn calc_rank_at_column_index(&self, index: u64, num_strata_deposited: u64) -> Option<Rank> {
        Some(if index == 0 { 0 } else { num_strata_deposited.saturating_sub(1) })
    }

    fn iter_retained_ranks(&self, num_strata_deposited: u64) -> Option<RankIter<'_>> {
        let ranks: Vec<Rank> = match num_strata_deposited {
            0 => vec![],
            1 => vec![0],
            n => vec![0, n - 1],
        };
        Some(Box::new(ranks.into_iter()))
    }

    fn calc_num_strata_retained_exact(&self, num_strata_deposited: u64) -> Option<u64> {
        Some(num_strata_deposited.min(2))
    }

    fn calc_num_strata_retained_upper_bound(&self, _num_strata_deposited: u64) -> u64 {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retains_anchors_only() {
        let policy = MinimalPolicy;
        let ranks: Vec<Rank> = policy.iter_retained_ranks(5).unwrap().collect();
        assert_eq!(ranks, vec![0, 4]);
        assert_eq!(policy.calc_num_strata_retained_exact(1), Some(1));
        for n in 1..50 {
            assert_eq!(policy.calc_num_strata_retained_upper_bound(n), 2);
        }
    }

    #[test]
    fn test_drops_superseded_newest() {
        let policy = MinimalPolicy;
        assert!(policy.gen_drop_ranks(0, &[0]).is_empty());
        assert!(policy.gen_drop_ranks(1, &[0, 1]).is_empty());
        assert_eq!(policy.gen_drop_ranks(2, &[0, 1, 2]), vec![1]);
    }

    #[test]
    fn test_rank_at_column_index() {
        let policy = MinimalPolicy;
        assert_eq!(policy.calc_rank_at_column_index(0, 10), Some(0));
        assert_eq!(policy.calc_rank_at_column_index(1, 10), Some(9));
        assert!(policy.can_calc_rank_at_column_index());
    }

    #[test]
    fn test_uncertainty_is_unbounded() {
        let policy = MinimalPolicy;
        assert_eq!(policy.calc_mrca_uncertainty_abs_upper_bound(10, 20, 3), 20);
        assert_eq!(policy.calc_mrca_uncertainty_abs_exact(10, 20, 3), Some(9));
    }
}
