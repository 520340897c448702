//! Geometric-sequence nth root
//!
//! Overlays `degree` windows reaching back n^(k/degree) ranks for k in
//! 1..=degree. Each window keeps about `interspersal` ranks per
//! window-length, spaced by a power of two, so the column holds O(degree *
//! interspersal) strata while resolution degrades smoothly with MRCA age.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{detail, RankIter, RetentionPolicy};
use crate::error::{Result, StrataError};
use crate::Rank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "GeomSeqParams")]
pub struct GeomSeqNthRootPolicy {
    /// Number of overlaid windows
    degree: u64,
    /// Retained ranks per window length
    interspersal: u64,
}

/// Parameters shared by the plain and tapered geometric-sequence policies,
/// before validation
#[derive(Deserialize)]
pub(super) struct GeomSeqParams {
    pub(super) degree: u64,
    pub(super) interspersal: u64,
}

impl TryFrom<GeomSeqParams> for GeomSeqNthRootPolicy {
    type Error = StrataError;

    fn try_from(params: GeomSeqParams) -> Result<Self> {
        Self::new(params.degree, params.interspersal)
    }
}

/// Check parameters common to both geometric-sequence policies
pub(super) fn validate_geom_seq(degree: u64, interspersal: u64) -> Result<()> {
    if degree == 0 {
        return Err(StrataError::InvalidPolicy("degree must be at least 1".into()));
    }
    if interspersal == 0 {
        return Err(StrataError::InvalidPolicy("interspersal must be at least 1".into()));
    }
    Ok(())
}

/// Separation and earliest reachable rank of window `k` once
/// `num_strata_deposited` strata exist
pub(super) fn window_layout(degree: u64, interspersal: u64, k: u64, num_strata_deposited: u64) -> (u64, Rank) {
    let interspersal = interspersal as f64;
    let window = (num_strata_deposited as f64).powf(k as f64 / degree as f64);
    let separation = detail::bit_floor(((window / interspersal) as u64).max(1));
    let reach = (window * (interspersal + 1.0) / interspersal).ceil() as u64;
    (separation, num_strata_deposited.saturating_sub(reach))
}

/// Multiples of `step` in `from..until`
pub(super) fn multiples_in(step: u64, from: Rank, until: Rank) -> impl Iterator<Item = Rank> {
    let first = from.div_ceil(step).checked_mul(step).unwrap_or(until);
    (first..until).step_by(step as usize)
}

impl GeomSeqNthRootPolicy {
    pub fn new(degree: u64, interspersal: u64) -> Result<Self> {
        let policy = Self { degree, interspersal };
        policy.validate()?;
        Ok(policy)
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
            ranks.extend(multiples_in(separation, cutoff, num_strata_deposited));
        }
        ranks
    }
}

impl RetentionPolicy for GeomSeqNthRootPolicy {
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
        let bound = self.degree * (2 * self.interspersal + 3) + 2;
        bound.min(num_strata_deposited)
    }

    /// Exact uncertainty computed from both retained sets, which is a sound
    /// bound absent differentia collisions
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
