//! Shared policy arithmetic and fallback bounds

use crate::Rank;

/// Largest power of two not exceeding `x`, or 0 for 0
pub fn bit_floor(x: u64) -> u64 {
    if x == 0 {
        0
    } else {
        1 << (63 - x.leading_zeros())
    }
}

/// Number of bits needed to represent `x`
pub fn bit_length(x: u64) -> u64 {
    (64 - x.leading_zeros()) as u64
}

/// Bound with no guarantee at all
pub fn worst_case_mrca_uncertainty(first_num_strata_deposited: u64, second_num_strata_deposited: u64) -> u64 {
    first_num_strata_deposited.max(second_num_strata_deposited)
}

/// Ranks in `retained` absent from the ascending `keep` sequence
pub fn drop_ranks_outside(retained: &[Rank], keep: impl Iterator<Item = Rank>) -> Vec<Rank> {
    let mut keep = keep.peekable();
    retained
        .iter()
        .copied()
        .filter(|&rank| {
            while keep.next_if(|&k| k < rank).is_some() {}
            keep.peek() != Some(&rank)
        })
        .collect()
}

/// The rank in `0..min(first, second)` maximizing `bound`, taking the first
/// on ties; 0 when either column is empty
pub fn scan_pessimal_rank<T: PartialOrd>(
    first_num_strata_deposited: u64,
    second_num_strata_deposited: u64,
    mut bound: impl FnMut(Rank) -> T,
) -> Rank {
    let least = first_num_strata_deposited.min(second_num_strata_deposited);
    let mut best: Option<(Rank, T)> = None;
    for rank in 0..least {
        let value = bound(rank);
        if best.as_ref().map_or(true, |(_, top)| value > *top) {
            best = Some((rank, value));
        }
    }
    best.map_or(0, |(rank, _)| rank)
}

/// Uncertainty two columns would report if they truly diverged just after
/// `actual_mrca_rank`, given their retained-rank sequences
pub fn mrca_uncertainty_from_retained(
    first: impl Iterator<Item = Rank>,
    second: impl Iterator<Item = Rank>,
    first_num_strata_deposited: u64,
    second_num_strata_deposited: u64,
    actual_mrca_rank: Rank,
) -> u64 {
    let mut last_commonality = 0;
    let mut first_disparity = first_num_strata_deposited.min(second_num_strata_deposited);
    let shared = SharedRanks::new(first.map(|r| (r, ())), second.map(|r| (r, ())));
    for (rank, (), ()) in shared {
        if rank <= actual_mrca_rank {
            last_commonality = rank;
        } else {
            first_disparity = first_disparity.min(rank);
            break;
        }
    }
    first_disparity.saturating_sub(last_commonality + 1)
}

/// Merge-walk join of two rank-ordered sequences of `(rank, value)` pairs,
/// yielding `(rank, first value, second value)` for every rank present in both
pub struct SharedRanks<I: Iterator, J: Iterator> {
    first: std::iter::Peekable<I>,
    second: std::iter::Peekable<J>,
}

impl<I: Iterator, J: Iterator> SharedRanks<I, J> {
    pub fn new(first: I, second: J) -> Self {
        Self {
            first: first.peekable(),
            second: second.peekable(),
        }
    }
}

impl<X, Y, I, J> Iterator for SharedRanks<I, J>
where
    I: Iterator<Item = (Rank, X)>,
    J: Iterator<Item = (Rank, Y)>,
{
    type Item = (Rank, X, Y);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (a, b) = (self.first.peek()?.0, self.second.peek()?.0);
            if a < b {
                self.first.next();
            } else if b < a {
                self.second.next();
            } else {
                let (_, x) = self.first.next()?;
                let (_, y) = self.second.next()?;
                return Some((a, x, y));
            }
        }
    }
}
