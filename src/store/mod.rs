//! Ordered Stores — retained strata keyed by deposition rank
//!
//! Three interchangeable backends share one contract:
//! - `VecStore`: contiguous, sequential-scan friendly (the default)
//! - `MapStore`: hash map, cheap scattered deletion
//! - `TreeStore`: B-tree, balanced insert/delete
//!
//! Keys are strictly increasing in iteration order. A column owns an
//! `OrderedStore`, which dispatches to the configured backend.

mod map_store;
mod tree_store;
mod vec_store;

pub use map_store::MapStore;
pub use tree_store::TreeStore;
pub use vec_store::VecStore;

use serde::{Deserialize, Serialize};

use crate::column::Stratum;
use crate::Rank;

/// Behavior shared by every store backend
pub trait StratumOrderedStore<A> {
    /// Append a stratum. Panics if `rank` does not exceed every rank present.
    fn deposit_stratum(&mut self, rank: Rank, stratum: Stratum<A>);

    /// Delete the given ranks. `column_index_of_rank` maps a currently
    /// retained rank to its position so positional backends need no scan.
    fn del_ranks(&mut self, ranks: &[Rank], column_index_of_rank: &dyn Fn(Rank) -> Option<usize>);

    fn num_strata_retained(&self) -> usize;

    fn stratum_at_column_index(&self, index: usize) -> Option<&Stratum<A>>;

    /// Rank at a position, or `None` when the position is out of range or the
    /// backend keeps no rank for it
    fn rank_at_column_index(&self, index: usize) -> Option<Rank>;

    fn column_index_of_rank(&self, rank: Rank) -> Option<usize>;

    /// Snapshot of retained ranks in ascending order, if the backend knows them
    fn retained_ranks(&self) -> Option<Vec<Rank>>;

    /// Strata in rank order
    fn iter_strata(&self) -> Box<dyn Iterator<Item = &Stratum<A>> + '_>;
}

/// Which backend a column stores its strata in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StoreBackend {
    #[default]
    #[serde(rename = "vec")]
    Vec,
    #[serde(rename = "hash_map")]
    HashMap,
    #[serde(rename = "btree_map")]
    BTreeMap,
}

impl StoreBackend {
    pub fn name(&self) -> &str {
        match self {
            StoreBackend::Vec => "vec",
            StoreBackend::HashMap => "hash map",
            StoreBackend::BTreeMap => "btree map",
        }
    }
}

/// Backend-dispatching store owned by a column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderedStore<A = ()> {
    Vec(VecStore<A>),
    HashMap(MapStore<A>),
    BTreeMap(TreeStore<A>),
}

impl<A> OrderedStore<A> {
    pub fn new(backend: StoreBackend) -> Self {
        match backend {
            StoreBackend::Vec => OrderedStore::Vec(VecStore::new()),
            StoreBackend::HashMap => OrderedStore::HashMap(MapStore::new()),
            StoreBackend::BTreeMap => OrderedStore::BTreeMap(TreeStore::new()),
        }
    }

    pub fn backend(&self) -> StoreBackend {
        match self {
            OrderedStore::Vec(_) => StoreBackend::Vec,
            OrderedStore::HashMap(_) => StoreBackend::HashMap,
            OrderedStore::BTreeMap(_) => StoreBackend::BTreeMap,
        }
    }

    fn inner(&self) -> &dyn StratumOrderedStore<A> {
        match self {
            OrderedStore::Vec(store) => store,
            OrderedStore::HashMap(store) => store,
            OrderedStore::BTreeMap(store) => store,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn StratumOrderedStore<A> {
        match self {
            OrderedStore::Vec(store) => store,
            OrderedStore::HashMap(store) => store,
            OrderedStore::BTreeMap(store) => store,
        }
    }
}

impl<A> StratumOrderedStore<A> for OrderedStore<A> {
    fn deposit_stratum(&mut self, rank: Rank, stratum: Stratum<A>) {
        self.inner_mut().deposit_stratum(rank, stratum)
    }

    fn del_ranks(&mut self, ranks: &[Rank], column_index_of_rank: &dyn Fn(Rank) -> Option<usize>) {
        if ranks.is_empty() {
            return;
        }
        self.inner_mut().del_ranks(ranks, column_index_of_rank)
    }

    fn num_strata_retained(&self) -> usize {
        self.inner().num_strata_retained()
    }

    fn stratum_at_column_index(&self, index: usize) -> Option<&Stratum<A>> {
        self.inner().stratum_at_column_index(index)
    }

    fn rank_at_column_index(&self, index: usize) -> Option<Rank> {
        self.inner().rank_at_column_index(index)
    }

    fn column_index_of_rank(&self, rank: Rank) -> Option<usize> {
        self.inner().column_index_of_rank(rank)
    }

    fn retained_ranks(&self) -> Option<Vec<Rank>> {
        self.inner().retained_ranks()
    }

    fn iter_strata(&self) -> Box<dyn Iterator<Item = &Stratum<A>> + '_> {
        self.inner().iter_strata()
    }
}
