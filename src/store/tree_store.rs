//! TreeStore — B-tree stratum storage keyed by rank

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::StratumOrderedStore;
use crate::column::Stratum;
use crate::Rank;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeStore<A = ()> {
    strata: BTreeMap<Rank, Stratum<A>>,
}

impl<A> Default for TreeStore<A> {
    fn default() -> Self {
        Self {
            strata: BTreeMap::new(),
        }
    }
}

impl<A> TreeStore<A> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<A> StratumOrderedStore<A> for TreeStore<A> {
    fn deposit_stratum(&mut self, rank: Rank, stratum: Stratum<A>) {
        if let Some((&last, _)) = self.strata.last_key_value() {
            assert!(rank > last, "deposit at rank {rank} does not follow rank {last}");
        }
        self.strata.insert(rank, stratum);
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
        self.strata.values().nth(index)
    }

    fn rank_at_column_index(&self, index: usize) -> Option<Rank> {
        self.strata.keys().nth(index).copied()
    }

    fn column_index_of_rank(&self, rank: Rank) -> Option<usize> {
        if !self.strata.contains_key(&rank) {
            return None;
        }
        Some(self.strata.range(..rank).count())
    }

    fn retained_ranks(&self) -> Option<Vec<Rank>> {
        Some(self.strata.keys().copied().collect())
    }

    fn iter_strata(&self) -> Box<dyn Iterator<Item = &Stratum<A>> + '_> {
        Box::new(self.strata.values())
    }
}
