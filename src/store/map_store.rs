//! MapStore — hash-map stratum storage keyed by rank
//!
//! Deletion is O(1) per rank. No key order is kept, so positional queries and
//! ordered iteration sort the keys on every call (O(n log n)). Columns that
//! are compared often are better served by the vec or btree store.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::StratumOrderedStore;
use crate::column::Stratum;
use crate::Rank;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapStore<A = ()> {
    strata: HashMap<Rank, Stratum<A>>,
    last_rank: Option<Rank>,
}

impl<A> Default for MapStore<A> {
    fn default() -> Self {
        Self {
            strata: HashMap::new(),
            last_rank: None,
        }
    }
}

impl<A> MapStore<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilt per call; caching it would cost an O(n) shift per deletion
    fn sorted_ranks(&self) -> Vec<Rank> {
        let mut ranks: Vec<Rank> = self.strata.keys().copied().collect();
        ranks.sort_unstable();
        ranks
    }
}

impl<A> StratumOrderedStore<A> for MapStore<A> {
    fn deposit_stratum(&mut self, rank: Rank, stratum: Stratum<A>) {
        if let Some(last) = self.last_rank {
            assert!(rank > last, "deposit at rank {rank} does not follow rank {last}");
        }
        self.strata.insert(rank, stratum);
        self.last_rank = Some(rank);
    }

    fn del_ranks(&mut self, ranks: &[Rank], _column_index_of_rank: &dyn Fn(Rank) -> Option<usize>) {
        for rank in ranks {
            self.strata.remove(rank);
        }
    }

    fn num_strata_retained(&self) -> usize {
        self.strata.len()
    }

    fn stratum_at_column_index(&self, index: usize) -> Option<&Stratum<A>> {
        let rank = self.rank_at_column_index(index)?;
        self.strata.get(&rank)
    }

    fn rank_at_column_index(&self, index: usize) -> Option<Rank> {
        self.sorted_ranks().get(index).copied()
    }

    fn column_index_of_rank(&self, rank: Rank) -> Option<usize> {
        if !self.strata.contains_key(&rank) {
            return None;
        }
        Some(self.strata.keys().filter(|&&r| r < rank).count())
    }

    fn retained_ranks(&self) -> Option<Vec<Rank>> {
        Some(self.sorted_ranks())
    }

    fn iter_strata(&self) -> Box<dyn Iterator<Item = &Stratum<A>> + '_> {
        Box::new(self.sorted_ranks().into_iter().filter_map(move |r| self.strata.get(&r)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_deletion_ignores_lookup() {
        let mut store: MapStore = MapStore::new();
        for rank in [0, 10, 20, 30] {
            store.deposit_stratum(rank, Stratum::new(rank, None, None));
        }
        store.del_ranks(&[10, 30], &|_| None);
        assert_eq!(store.retained_ranks(), Some(vec![0, 20]));
        assert_eq!(store.column_index_of_rank(20), Some(1));
        assert_eq!(store.rank_at_column_index(5), None);
    }
}
