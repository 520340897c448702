//! Juxtaposition — pairwise comparison of two columns
//!
//! Columns are aligned over the ranks both still retain. Strata before the
//! MRCA match, strata after it differ (up to a 2^-bit_width chance of
//! coincidental collision), so the first mismatch brackets the MRCA.
//!
//! Every rank-valued comparison is commutative. The "ranks since" variants are
//! measured back from the first column's newest stratum and are not.

mod diff;
mod mrca;

pub use diff::{diff_retained_ranks, does_definitively_have_no_common_ancestor, does_have_any_common_ancestor};
pub use mrca::{
    calc_rank_of_first_retained_disparity_between, calc_rank_of_first_retained_disparity_with_confidence,
    calc_rank_of_last_retained_commonality_between, calc_rank_of_last_retained_commonality_with_confidence,
    calc_rank_of_mrca_bounds_between, calc_rank_of_mrca_bounds_with_confidence,
    calc_rank_of_mrca_uncertainty_between, calc_rank_of_mrca_uncertainty_with_confidence,
    calc_ranks_since_first_retained_disparity_between, calc_ranks_since_last_retained_commonality_between,
    calc_ranks_since_mrca_bounds_between, calc_ranks_since_mrca_uncertainty_between,
};

use crate::column::Column;
use crate::policy::detail::SharedRanks;
use crate::Rank;

/// Both columns must draw differentia of the same width
fn assert_comparable<A, B>(first: &Column<A>, second: &Column<B>) {
    assert_eq!(
        first.differentia_bit_width(),
        second.differentia_bit_width(),
        "cannot compare columns with differing differentia bit widths"
    );
}

/// (rank, differentia equal?) for every rank retained by both columns
fn shared_rank_matches<A, B>(first: &Column<A>, second: &Column<B>) -> Vec<(Rank, bool)> {
    SharedRanks::new(first.iter_rank_differentia(), second.iter_rank_differentia())
        .map(|(rank, a, b)| (rank, a == b))
        .collect()
}
