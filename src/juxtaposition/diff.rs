//! Rank-set differences and ancestry checks

use std::collections::BTreeSet;

use super::assert_comparable;
use crate::column::Column;
use crate::Rank;

/// Ranks retained by `first` but not `second`, and vice versa
pub fn diff_retained_ranks<A, B>(first: &Column<A>, second: &Column<B>) -> (BTreeSet<Rank>, BTreeSet<Rank>) {
    let first_ranks: BTreeSet<Rank> = first.iter_retained_ranks().collect();
    let second_ranks: BTreeSet<Rank> = second.iter_retained_ranks().collect();
    (
        first_ranks.difference(&second_ranks).copied().collect(),
        second_ranks.difference(&first_ranks).copied().collect(),
    )
}

/// True when at least one shared stratum precedes the first disparity
pub fn does_have_any_common_ancestor<A, B>(first: &Column<A>, second: &Column<B>) -> bool {
    super::calc_rank_of_last_retained_commonality_between(first, second).is_some()
}

/// True when the anchoring rank-0 strata differ, which rules out common
/// ancestry regardless of collisions later in the columns
pub fn does_definitively_have_no_common_ancestor<A, B>(first: &Column<A>, second: &Column<B>) -> bool {
    assert_comparable(first, second);
    match (first.stratum_at_rank(0), second.stratum_at_rank(0)) {
        (Some(a), Some(b)) => !a.has_same_differentia(b),
        _ => false,
    }
}
