//! MRCA bounds from the first observed disparity
//!
//! The plain functions are definitive: a single matching differentia counts
//! as commonality. The `_with_confidence` variants treat runs of matches
//! shorter than the collision-implausibility threshold as possibly spurious
//! and widen the bracket accordingly.

use super::{assert_comparable, shared_rank_matches};
use crate::column::Column;
use crate::error::{Result, StrataError};
use crate::Rank;

/// Consecutive matches required before commonality is accepted
fn collision_threshold<A>(column: &Column<A>, confidence_level: f64) -> Result<usize> {
    if !(0.0..1.0).contains(&confidence_level) {
        return Err(StrataError::InvalidConfidenceLevel(confidence_level));
    }
    let threshold = column.calc_min_implausible_spurious_consecutive_differentia_collisions(1.0 - confidence_level)?;
    Ok(threshold.max(1) as usize)
}

fn last_commonality<A, B>(first: &Column<A>, second: &Column<B>, threshold: usize) -> Option<Rank> {
    assert_comparable(first, second);
    let matches = shared_rank_matches(first, second);
    let run_end = matches.iter().position(|&(_, equal)| !equal).unwrap_or(matches.len());
    run_end.checked_sub(threshold).map(|index| matches[index].0)
}

fn first_disparity<A, B>(first: &Column<A>, second: &Column<B>, threshold: usize) -> Option<Rank> {
    assert_comparable(first, second);
    let matches = shared_rank_matches(first, second);
    match matches.iter().position(|&(_, equal)| !equal) {
        // the matches just before a mismatch may themselves be collisions
        Some(index) => Some(matches[index.saturating_sub(threshold - 1)].0),
        None if first.num_strata_deposited() == second.num_strata_deposited() => None,
        None => Some(first.num_strata_deposited().min(second.num_strata_deposited())),
    }
}

fn mrca_bounds<A, B>(first: &Column<A>, second: &Column<B>, threshold: usize) -> Option<(Rank, Rank)> {
    let lower = last_commonality(first, second, threshold)?;
    // no disparity implies equal deposition counts
    let upper = first_disparity(first, second, threshold).unwrap_or(first.num_strata_deposited());
    Some((lower, upper))
}

fn uncertainty(bounds: Option<(Rank, Rank)>) -> u64 {
    bounds.map_or(0, |(lower, upper)| upper - lower - 1)
}

/// Greatest shared rank with matching differentia before the first observed
/// disparity; `None` when even rank 0 differs
pub fn calc_rank_of_last_retained_commonality_between<A, B>(first: &Column<A>, second: &Column<B>) -> Option<Rank> {
    last_commonality(first, second, 1)
}

/// Least shared rank with differing differentia. Without an observed
/// disparity: `None` when deposition counts are equal, otherwise the lesser
/// deposition count.
pub fn calc_rank_of_first_retained_disparity_between<A, B>(first: &Column<A>, second: &Column<B>) -> Option<Rank> {
    first_disparity(first, second, 1)
}

/// Inclusive lower, exclusive upper bound on the MRCA rank; `None` when no
/// common ancestry is detectable
pub fn calc_rank_of_mrca_bounds_between<A, B>(first: &Column<A>, second: &Column<B>) -> Option<(Rank, Rank)> {
    mrca_bounds(first, second, 1)
}

/// Width of the MRCA bracket, excluding its endpoints; 0 without common ancestry
pub fn calc_rank_of_mrca_uncertainty_between<A, B>(first: &Column<A>, second: &Column<B>) -> u64 {
    uncertainty(mrca_bounds(first, second, 1))
}

pub fn calc_ranks_since_last_retained_commonality_between<A, B>(
    first: &Column<A>,
    second: &Column<B>,
) -> Option<u64> {
    let rank = calc_rank_of_last_retained_commonality_between(first, second)?;
    Some(first.num_strata_deposited() - 1 - rank)
}

/// May be -1 when the first column is the shorter and no disparity was seen
pub fn calc_ranks_since_first_retained_disparity_between<A, B>(
    first: &Column<A>,
    second: &Column<B>,
) -> Option<i64> {
    let rank = calc_rank_of_first_retained_disparity_between(first, second)?;
    Some(first.num_strata_deposited() as i64 - 1 - rank as i64)
}

/// (ranks since last commonality, ranks since first disparity), both
/// counted back from the first column's newest stratum. The second element
/// is -1 when no disparity was observed; `None` without common ancestry.
pub fn calc_ranks_since_mrca_bounds_between<A, B>(first: &Column<A>, second: &Column<B>) -> Option<(u64, i64)> {
    let since_commonality = calc_ranks_since_last_retained_commonality_between(first, second)?;
    let since_disparity = calc_ranks_since_first_retained_disparity_between(first, second).unwrap_or(-1);
    Some((since_commonality, since_disparity))
}

pub fn calc_ranks_since_mrca_uncertainty_between<A, B>(first: &Column<A>, second: &Column<B>) -> u64 {
    calc_rank_of_mrca_uncertainty_between(first, second)
}

pub fn calc_rank_of_last_retained_commonality_with_confidence<A, B>(
    first: &Column<A>,
    second: &Column<B>,
    confidence_level: f64,
) -> Result<Option<Rank>> {
    let threshold = collision_threshold(first, confidence_level)?;
    Ok(last_commonality(first, second, threshold))
}

pub fn calc_rank_of_first_retained_disparity_with_confidence<A, B>(
    first: &Column<A>,
    second: &Column<B>,
    confidence_level: f64,
) -> Result<Option<Rank>> {
    let threshold = collision_threshold(first, confidence_level)?;
    Ok(first_disparity(first, second, threshold))
}

pub fn calc_rank_of_mrca_bounds_with_confidence<A, B>(
    first: &Column<A>,
    second: &Column<B>,
    confidence_level: f64,
) -> Result<Option<(Rank, Rank)>> {
    let threshold = collision_threshold(first, confidence_level)?;
    Ok(mrca_bounds(first, second, threshold))
}

pub fn calc_rank_of_mrca_uncertainty_with_confidence<A, B>(
    first: &Column<A>,
    second: &Column<B>,
    confidence_level: f64,
) -> Result<u64> {
    let threshold = collision_threshold(first, confidence_level)?;
    Ok(uncertainty(mrca_bounds(first, second, threshold)))
}
