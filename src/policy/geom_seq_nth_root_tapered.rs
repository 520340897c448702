//! Geometric-sequence nth root, tapered
//!
//! Overlays the same `degree` windows as the plain geometric-sequence policy,
//! but each window keeps its full separation only across the most recent
//! `interspersal` separations and twice that separation further back.
//! Resolution coarsens toward the far end of every window instead of holding
//! steady, and the column never exceeds
//! `degree * (interspersal + 2 + ceil(interspersal / 2)) + 2` strata.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::geom_seq_nth_root::{multiples_in, validate_geom_seq, window_layout, GeomSeqParams};
use super::{detail, RankIter, RetentionPolicy};
use crate::error::{Result, StrataError};
use crate::Rank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "GeomSeqParams")]
pub struct GeomSeqNthRootTaperedPolicy {
    /// Number of overlaid windows
    degree: u64,
    /// Retained ranks per window length, before tapering
    interspersal: u64,
}

impl TryFrom<GeomSeqParams> for GeomSeqNthRootTaperedPolicy {
    type Error = StrataError;

    fn try_from(params: GeomSeqParams) -> Result<Self> {
        Self::new(params.degree, params.interspersal)
    }
}

impl GeomSeqNthRootTaperedPolicy {
    pub fn new(degree: u64, interspersal: u64) -> Result<Self> {
        validate_geom_seq(degree, interspersal)?;
        Ok(Self { degree, interspersal })
    }

    pub fn degree(&self) -> u64 {
        self.degree
    }

    pub fn interspersal(&self) -> u64 {
        self.interspersal
    }

    pub fn validate(&self) -> Result<()> {
        validate_geom_seq(self.degree, self.interspersal)
    }

    fn retained(&self, num_strata_deposited: u64) -> BTreeSet<Rank> {
        let mut ranks = BTreeSet::new();
        let Some(last) = num_strata_deposited.checked_sub(1) else {
            return ranks;
        };
        ranks.insert(0);
        ranks.insert(last);

        for k in 1..=self.degree {
            let (separation, cutoff) = window_layout(self.degree, self.interspersal, k, num_strata_deposited);
            ranks.extend(multiples_in(separation.saturating_mul(2), cutoff, num_strata_deposited));
            let fine_span = self.interspersal.saturating_mul(separation);
            let fine_start = cutoff.max(num_strata_deposited.saturating_sub(fine_span));
            ranks.extend(multiples_in(separation, fine_start, num_strata_deposited));
        }
        ranks
    }
}

impl RetentionPolicy for GeomSeqNthRootTaperedPolicy {
    fn gen_drop_ranks(&self, num_depositions_completed: u64, retained_ranks: &[Rank]) -> Vec<Rank> {
        let keep = self.retained(num_depositions_completed + 1);
        detail::drop_ranks_outside(retained_ranks, keep.into_iter())
    }

    fn calc_rank_at_column_index(&self, index: u64, num_strata_deposited: u64) -> Option<Rank> {
        let index = usize::try_from(index).ok()?;
        let ranks = self.retained(num_strata_deposited);
        Some(ranks.iter().nth(index).copied().unwrap_or(num_strata_deposited.saturating_sub(1)))
    }

    fn iter_retained_ranks(&self, num_strata_deposited: u64) -> Option<RankIter<'_>> {
        Some(Box::new(self.retained(num_strata_deposited).into_iter()))
    }

    fn calc_num_strata_retained_exact(&self, num_strata_deposited: u64) -> Option<u64> {
        Some(self.retained(num_strata_deposited).len() as u64)
    }

    fn calc_num_strata_retained_upper_bound(&self, num_strata_deposited: u64) -> u64 {
        let per_window = self.interspersal + 2 + self.interspersal.div_ceil(2);
        (self.degree * per_window + 2).min(num_strata_deposited)
    }

    fn calc_mrca_uncertainty_abs_upper_bound(&self, first: u64, second: u64, actual_mrca_rank: Rank) -> u64 {
        detail::mrca_uncertainty_from_retained(
            self.retained(first).into_iter(),
            self.retained(second).into_iter(),
            first,
            second,
            actual_mrca_rank,
        )
    }
}
