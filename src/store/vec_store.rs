//! VecStore — contiguous stratum storage
//!
//! Ranks live on the strata themselves, so a column that omits ranks must
//! resolve positions through its retention policy.

use serde::{Deserialize, Serialize};

use super::StratumOrderedStore;
use crate::column::Stratum;
use crate::Rank;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VecStore<A = ()> {
    strata: Vec<Stratum<A>>,
    last_rank: Option<Rank>,
}

impl<A> Default for VecStore<A> {
    fn default() -> Self {
        Self {
            strata: Vec::new(),
            last_rank: None,
        }
    }
}

impl<A> VecStore<A> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<A> StratumOrderedStore<A> for VecStore<A> {
    fn deposit_stratum(&mut self, rank: Rank, stratum: Stratum<A>) {
        if let Some(last) = self.last_rank {
            assert!(rank > last, "deposit at rank {rank} does not follow rank {last}");
        }
        self.strata.push(stratum);
        self.last_rank = Some(rank);
    }

    fn del_ranks(&mut self, ranks: &[Rank], column_index_of_rank: &dyn Fn(Rank) -> Option<usize>) {
        let mut doomed: Vec<usize> = ranks
            .iter()
            .filter_map(|&r| self.column_index_of_rank(r).or_else(|| column_index_of_rank(r)))
            .collect();
        doomed.sort_unstable();
        doomed.dedup();

        if let [index] = doomed[..] {
            if index < self.strata.len() {
                self.strata.remove(index);
            }
            return;
        }
        let mut doomed = doomed.into_iter().peekable();
        let mut index = 0;
        self.strata.retain(|_| {
            let keep = doomed.next_if_eq(&index).is_none();
            index += 1;
            keep
        });
    }

    fn num_strata_retained(&self) -> usize {
        self.strata.len()
    }

    fn stratum_at_column_index(&self, index: usize) -> Option<&Stratum<A>> {
        self.strata.get(index)
    }

    fn rank_at_column_index(&self, index: usize) -> Option<Rank> {
        self.strata.get(index)?.deposition_rank()
    }

    fn column_index_of_rank(&self, rank: Rank) -> Option<usize> {
        self.strata
            .binary_search_by_key(&Some(rank), |s| s.deposition_rank())
            .ok()
    }

    fn retained_ranks(&self) -> Option<Vec<Rank>> {
        self.strata.iter().map(|s| s.deposition_rank()).collect()
    }

    fn iter_strata(&self) -> Box<dyn Iterator<Item = &Stratum<A>> + '_> {
        Box::new(self.strata.iter())
    }
}
