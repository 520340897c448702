//! Column — deposition, purging and lookup over retained strata

use std::collections::BTreeSet;
use std::sync::Arc;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::Stratum;
use crate::config::ColumnConfig;
use crate::error::{Result, StrataError};
use crate::juxtaposition;
use crate::policy::{Policy, RetentionPolicy};
use crate::search;
use crate::store::{OrderedStore, StoreBackend, StratumOrderedStore};
use crate::Rank;

/// Retained strata of one line of descent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ColumnCheckpoint<A>", bound(deserialize = "A: Deserialize<'de>"))]
pub struct Column<A = ()> {
    /// Shared, immutable retention policy
    policy: Arc<Policy>,
    /// Retained strata in rank order
    store: OrderedStore<A>,
    /// Incremented after each deposition and its purge complete
    num_strata_deposited: u64,
    differentia_bit_width: u8,
    /// False when ranks are recomputed from the policy instead of stored
    stores_rank: bool,
}

/// Serialized column fields, checked before a column is rebuilt from them
#[derive(Deserialize)]
struct ColumnCheckpoint<A> {
    policy: Arc<Policy>,
    store: OrderedStore<A>,
    num_strata_deposited: u64,
    differentia_bit_width: u8,
    stores_rank: bool,
}

impl<A> TryFrom<ColumnCheckpoint<A>> for Column<A> {
    type Error = StrataError;

    fn try_from(checkpoint: ColumnCheckpoint<A>) -> Result<Self> {
        ColumnConfig::default()
            .with_bit_width(checkpoint.differentia_bit_width)
            .validate()?;
        checkpoint.policy.validate()?;
        if !checkpoint.stores_rank && !checkpoint.policy.can_calc_rank_at_column_index() {
            return Err(StrataError::InvalidCheckpoint(format!(
                "policy {} cannot recompute omitted ranks",
                checkpoint.policy
            )));
        }
        let retained = checkpoint.store.num_strata_retained() as u64;
        if retained > checkpoint.num_strata_deposited || (retained == 0) != (checkpoint.num_strata_deposited == 0) {
            return Err(StrataError::InvalidCheckpoint(format!(
                "{} strata retained out of {} deposited",
                retained, checkpoint.num_strata_deposited
            )));
        }
        Ok(Self {
            policy: checkpoint.policy,
            store: checkpoint.store,
            num_strata_deposited: checkpoint.num_strata_deposited,
            differentia_bit_width: checkpoint.differentia_bit_width,
            stores_rank: checkpoint.stores_rank,
        })
    }
}

impl Column<()> {
    /// Unannotated column with 64-bit differentia and the vec store
    pub fn new(policy: impl Into<Policy>) -> Self {
        Self::build(Arc::new(policy.into()), &ColumnConfig::default(), None)
    }
}

impl<A> Column<A> {
    pub fn with_config(policy: impl Into<Policy>, config: ColumnConfig, initial_annotation: Option<A>) -> Result<Self> {
        Self::with_shared_policy(Arc::new(policy.into()), config, initial_annotation)
    }

    /// Build a column around a policy already shared with other columns
    pub fn with_shared_policy(
        policy: Arc<Policy>,
        config: ColumnConfig,
        initial_annotation: Option<A>,
    ) -> Result<Self> {
        config.validate()?;
        policy.validate()?;
        Ok(Self::build(policy, &config, initial_annotation))
    }

    fn build(policy: Arc<Policy>, config: &ColumnConfig, initial_annotation: Option<A>) -> Self {
        let stores_rank = config.always_store_rank_in_stratum || !policy.can_calc_rank_at_column_index();
        debug!(
            "New column: policy {}, {}-bit differentia, {} store, ranks {}",
            policy,
            config.differentia_bit_width,
            config.store_backend.name(),
            if stores_rank { "stored" } else { "computed" },
        );
        let mut column = Self {
            policy,
            store: OrderedStore::new(config.store_backend),
            num_strata_deposited: 0,
            differentia_bit_width: config.differentia_bit_width,
            stores_rank,
        };
        column.deposit_stratum(initial_annotation);
        column
    }

    /// Deposit the stratum for a newly elapsed generation, then purge the
    /// ranks the policy no longer retains
    pub fn deposit_stratum(&mut self, annotation: Option<A>) {
        let rank = self.num_strata_deposited;
        let num_retained_before = self.num_strata_retained();
        // only materialized for policies that look at it
        let retained = if self.policy.reads_retained_ranks() {
            let mut ranks = self.retained_ranks();
            ranks.push(rank);
            ranks
        } else {
            Vec::new()
        };

        let stratum = Stratum::random(
            self.differentia_bit_width,
            self.stores_rank.then_some(rank),
            annotation,
        );
        self.store.deposit_stratum(rank, stratum);

        let condemned = self.policy.gen_drop_ranks(rank, &retained);
        if !condemned.is_empty() {
            trace!("Deposit {}: purging ranks {:?}", rank, condemned);
            // condemned ranks predate the new stratum, so the pre-deposit
            // layout still locates them
            let policy = &self.policy;
            let index_of = |r: Rank| {
                if let Ok(index) = retained.binary_search(&r) {
                    return Some(index);
                }
                let index = search::invert_monotone(num_retained_before, r, |index| {
                    policy.calc_rank_at_column_index(index, rank).unwrap_or(Rank::MAX)
                })?;
                usize::try_from(index).ok()
            };
            self.store.del_ranks(&condemned, &index_of);
        }
        self.num_strata_deposited += 1;
    }

    pub fn deposit_strata(&mut self, num_strata: u64) {
        for _ in 0..num_strata {
            self.deposit_stratum(None);
        }
    }

    pub fn num_strata_deposited(&self) -> u64 {
        self.num_strata_deposited
    }

    pub fn num_strata_retained(&self) -> u64 {
        self.store.num_strata_retained() as u64
    }

    pub fn num_discarded_strata(&self) -> u64 {
        self.num_strata_deposited - self.num_strata_retained()
    }

    pub fn has_discarded_strata(&self) -> bool {
        self.num_discarded_strata() > 0
    }

    pub fn differentia_bit_width(&self) -> u8 {
        self.differentia_bit_width
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn shared_policy(&self) -> Arc<Policy> {
        Arc::clone(&self.policy)
    }

    pub fn store_backend(&self) -> StoreBackend {
        self.store.backend()
    }

    pub fn stratum_at_column_index(&self, index: usize) -> Option<&Stratum<A>> {
        self.store.stratum_at_column_index(index)
    }

    pub fn rank_at_column_index(&self, index: usize) -> Option<Rank> {
        if self.stores_rank {
            return self.store.rank_at_column_index(index);
        }
        if index >= self.store.num_strata_retained() {
            return None;
        }
        self.policy
            .calc_rank_at_column_index(index as u64, self.num_strata_deposited)
    }

    /// Position of `rank` in the column, or `None` if it was discarded
    pub fn column_index_of_rank(&self, rank: Rank) -> Option<usize> {
        if self.stores_rank {
            return self.store.column_index_of_rank(rank);
        }
        // index -> rank strictly increases, so invert it by bisection
        let n = self.num_strata_deposited;
        let index = search::invert_monotone(self.num_strata_retained(), rank, |index| {
            self.policy
                .calc_rank_at_column_index(index, n)
                .unwrap_or(Rank::MAX)
        })?;
        usize::try_from(index).ok()
    }

    pub fn stratum_at_rank(&self, rank: Rank) -> Option<&Stratum<A>> {
        self.stratum_at_column_index(self.column_index_of_rank(rank)?)
    }

    /// Retained ranks in ascending order. The iterator owns a snapshot, so
    /// later depositions do not affect it.
    pub fn iter_retained_ranks(&self) -> std::vec::IntoIter<Rank> {
        self.retained_ranks().into_iter()
    }

    /// (rank, differentia) for every retained stratum, in rank order
    pub fn iter_rank_differentia(&self) -> Box<dyn Iterator<Item = (Rank, u64)> + '_> {
        if self.stores_rank {
            return Box::new(
                self.store
                    .iter_strata()
                    .filter_map(|stratum| Some((stratum.deposition_rank()?, stratum.differentia()))),
            );
        }
        Box::new(
            self.retained_ranks()
                .into_iter()
                .zip(self.store.iter_strata().map(|stratum| stratum.differentia())),
        )
    }

    fn retained_ranks(&self) -> Vec<Rank> {
        if let Some(ranks) = self.store.retained_ranks() {
            return ranks;
        }
        let n = self.num_strata_deposited;
        if let Some(ranks) = self.policy.iter_retained_ranks(n) {
            return ranks.collect();
        }
        (0..self.num_strata_retained())
            .filter_map(|index| self.policy.calc_rank_at_column_index(index, n))
            .collect()
    }

    /// Chance two independently drawn differentia coincide
    pub fn calc_probability_differentia_collision(&self) -> f64 {
        0.5f64.powi(i32::from(self.differentia_bit_width))
    }

    /// Consecutive matching differentia needed before coincidence can be
    /// rejected at `significance_level`
    pub fn calc_min_implausible_spurious_consecutive_differentia_collisions(
        &self,
        significance_level: f64,
    ) -> Result<u32> {
        if !(significance_level > 0.0 && significance_level <= 1.0) {
            return Err(StrataError::InvalidSignificanceLevel(significance_level));
        }
        let log_base = self.calc_probability_differentia_collision();
        Ok((significance_level.ln() / log_base.ln()).ceil() as u32)
    }

    pub fn rank_of_last_commonality_with<B>(&self, other: &Column<B>) -> Option<Rank> {
        juxtaposition::calc_rank_of_last_retained_commonality_between(self, other)
    }

    pub fn rank_of_first_disparity_with<B>(&self, other: &Column<B>) -> Option<Rank> {
        juxtaposition::calc_rank_of_first_retained_disparity_between(self, other)
    }

    pub fn rank_of_mrca_bounds_with<B>(&self, other: &Column<B>) -> Option<(Rank, Rank)> {
        juxtaposition::calc_rank_of_mrca_bounds_between(self, other)
    }

    pub fn rank_of_mrca_uncertainty_with<B>(&self, other: &Column<B>) -> u64 {
        juxtaposition::calc_rank_of_mrca_uncertainty_between(self, other)
    }

    pub fn ranks_since_last_commonality_with<B>(&self, other: &Column<B>) -> Option<u64> {
        juxtaposition::calc_ranks_since_last_retained_commonality_between(self, other)
    }

    pub fn ranks_since_first_disparity_with<B>(&self, other: &Column<B>) -> Option<i64> {
        juxtaposition::calc_ranks_since_first_retained_disparity_between(self, other)
    }

    pub fn ranks_since_mrca_bounds_with<B>(&self, other: &Column<B>) -> Option<(u64, i64)> {
        juxtaposition::calc_ranks_since_mrca_bounds_between(self, other)
    }

    pub fn ranks_since_mrca_uncertainty_with<B>(&self, other: &Column<B>) -> u64 {
        juxtaposition::calc_ranks_since_mrca_uncertainty_between(self, other)
    }

    pub fn has_any_common_ancestor_with<B>(&self, other: &Column<B>) -> bool {
        juxtaposition::does_have_any_common_ancestor(self, other)
    }

    /// Ranks retained here but not by `other`, and vice versa
    pub fn diff_retained_ranks<B>(&self, other: &Column<B>) -> (BTreeSet<Rank>, BTreeSet<Rank>) {
        juxtaposition::diff_retained_ranks(self, other)
    }
}

impl<A: Clone> Column<A> {
    /// Independent copy that has gone through one more generation
    pub fn clone_descendant(&self, annotation: Option<A>) -> Self {
        let mut child = self.clone();
        child.deposit_stratum(annotation);
        child
    }

    pub fn clone_nth_descendant(&self, num_generations: u64) -> Self {
        let mut child = self.clone();
        child.deposit_strata(num_generations);
        child
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_backends() -> [StoreBackend; 3] {
        [StoreBackend::Vec, StoreBackend::HashMap, StoreBackend::BTreeMap]
    }

    #[test]
    fn test_first_stratum_deposited_at_init() {
        let column = Column::new(Policy::perfect());
        assert_eq!(column.num_strata_deposited(), 1);
        assert_eq!(column.num_strata_retained(), 1);
        assert!(!column.has_discarded_strata());
        assert_eq!(column.iter_retained_ranks().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_fixed_resolution_scenario() {
        let mut column = Column::new(Policy::fixed_resolution(3).unwrap());
        column.deposit_strata(9);
        assert_eq!(column.num_strata_deposited(), 10);
        assert_eq!(column.iter_retained_ranks().collect::<Vec<_>>(), vec![0, 3, 6, 9]);
        column.deposit_stratum(None);
        assert_eq!(column.iter_retained_ranks().collect::<Vec<_>>(), vec![0, 3, 6, 9, 10]);
        assert_eq!(column.num_discarded_strata(), 6);
    }

    #[test]
    fn test_minimal_scenario() {
        let mut column = Column::new(Policy::minimal());
        column.deposit_strata(4);
        assert_eq!(column.iter_retained_ranks().collect::<Vec<_>>(), vec![0, 4]);
        assert_eq!(column.policy().calc_num_strata_retained_upper_bound(5), 2);
    }

    #[test]
    fn test_computed_ranks_match_stored_ranks() {
        let policies = [
            Policy::minimal(),
            Policy::perfect(),
            Policy::fixed_resolution(4).unwrap(),
            Policy::depth_proportional(2).unwrap(),
            Policy::depth_proportional_tapered(2).unwrap(),
            Policy::recency_proportional(3),
            Policy::geom_seq_nth_root(2, 2).unwrap(),
            Policy::geom_seq_nth_root_tapered(2, 2).unwrap(),
        ];
        for policy in policies {
            for backend in all_backends() {
                let config = ColumnConfig::default()
                    .with_store_backend(backend)
                    .with_always_store_rank(false);
                let mut computed: Column = Column::with_config(policy.clone(), config, None).unwrap();
                let mut stored = Column::new(policy.clone());
                for _ in 0..150 {
                    computed.deposit_stratum(None);
                    stored.deposit_stratum(None);
                    let expected: Vec<Rank> = stored.iter_retained_ranks().collect();
                    assert_eq!(computed.iter_retained_ranks().collect::<Vec<_>>(), expected, "{policy}");
                }
                for (index, &rank) in stored.retained_ranks().iter().enumerate() {
                    assert_eq!(computed.rank_at_column_index(index), Some(rank));
                    assert_eq!(computed.column_index_of_rank(rank), Some(index));
                }
            }
        }
    }

    #[test]
    fn test_vec_store_omits_ranks() {
        let config = ColumnConfig::compact();
        let mut column: Column = Column::with_config(Policy::fixed_resolution(2).unwrap(), config, None).unwrap();
        column.deposit_strata(10);
        let stratum = column.stratum_at_column_index(0).unwrap();
        assert_eq!(stratum.deposition_rank(), None);
        assert_eq!(column.rank_at_column_index(5), Some(10));
        assert_eq!(column.column_index_of_rank(3), None); // discarded
        assert_eq!(column.rank_at_column_index(6), None); // out of range
    }

    #[test]
    fn test_dropped_rank_lookup_is_none() {
        for backend in all_backends() {
            let config = ColumnConfig::default().with_store_backend(backend);
            let mut column: Column = Column::with_config(Policy::minimal(), config, None).unwrap();
            column.deposit_strata(10);
            assert_eq!(column.column_index_of_rank(5), None);
            assert_eq!(column.column_index_of_rank(10), Some(1));
            assert!(column.stratum_at_rank(5).is_none());
        }
    }

    #[test]
    fn test_iteration_is_a_snapshot() {
        let mut column = Column::new(Policy::minimal());
        column.deposit_strata(3);
        let snapshot = column.iter_retained_ranks();
        column.deposit_strata(3);
        assert_eq!(snapshot.collect::<Vec<_>>(), vec![0, 3]);
        assert_eq!(column.iter_retained_ranks().collect::<Vec<_>>(), vec![0, 6]);
    }

    #[test]
    fn test_clones_are_independent() {
        let mut parent = Column::new(Policy::perfect());
        parent.deposit_strata(5);
        let child = parent.clone_descendant(None);
        parent.deposit_strata(3);

        assert_eq!(child.num_strata_deposited(), 7);
        assert_eq!(parent.num_strata_deposited(), 9);
        assert!(Arc::ptr_eq(&parent.shared_policy(), &child.shared_policy()));
        for rank in 0..6 {
            let a = parent.stratum_at_rank(rank).unwrap();
            let b = child.stratum_at_rank(rank).unwrap();
            assert_eq!(a.differentia(), b.differentia());
        }
    }

    #[test]
    fn test_annotations_travel_with_strata() {
        let mut column =
            Column::with_config(Policy::perfect(), ColumnConfig::default(), Some("genesis".to_string())).unwrap();
        column.deposit_stratum(Some("second".to_string()));
        let child = column.clone_descendant(Some("third".to_string()));
        let annotations: Vec<&str> = (0..3)
            .map(|i| child.stratum_at_column_index(i).unwrap().annotation().unwrap().as_str())
            .collect();
        assert_eq!(annotations, vec!["genesis", "second", "third"]);
    }

    #[test]
    fn test_bit_width_masks_differentia() {
        let config = ColumnConfig::default().with_bit_width(1);
        let mut column: Column = Column::with_config(Policy::perfect(), config, None).unwrap();
        column.deposit_strata(50);
        assert!(column.iter_rank_differentia().all(|(_, d)| d <= 1));
        assert_eq!(column.calc_probability_differentia_collision(), 0.5);
    }

    #[test]
    fn test_min_implausible_collisions() {
        let narrow: Column = Column::with_config(Policy::minimal(), ColumnConfig::default().with_bit_width(1), None).unwrap();
        assert_eq!(narrow.calc_min_implausible_spurious_consecutive_differentia_collisions(0.05).unwrap(), 5);
        assert_eq!(narrow.calc_min_implausible_spurious_consecutive_differentia_collisions(0.51).unwrap(), 1);

        let wide = Column::new(Policy::minimal());
        assert_eq!(wide.calc_min_implausible_spurious_consecutive_differentia_collisions(0.01).unwrap(), 1);
        assert!(wide.calc_min_implausible_spurious_consecutive_differentia_collisions(0.0).is_err());
        assert!(wide.calc_min_implausible_spurious_consecutive_differentia_collisions(1.5).is_err());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = ColumnConfig::default().with_bit_width(0);
        let result: Result<Column> = Column::with_config(Policy::perfect(), config, None);
        assert!(matches!(result, Err(StrataError::InvalidBitWidth(0))));
    }

    #[test]
    fn test_stochastic_column_stays_anchored() {
        let mut column = Column::new(Policy::stochastic(0.3).unwrap());
        for generation in 1..300u64 {
            column.deposit_stratum(None);
            let ranks: Vec<Rank> = column.iter_retained_ranks().collect();
            assert_eq!(ranks.first(), Some(&0));
            assert_eq!(ranks.last(), Some(&generation));
        }
        assert!(column.has_discarded_strata());
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut column = Column::with_config(
            Policy::recency_proportional(2),
            ColumnConfig::default().with_store_backend(StoreBackend::BTreeMap),
            Some(7u32),
        )
        .unwrap();
        column.deposit_strata(40);
        let json = serde_json::to_string(&column).unwrap();
        let restored: Column<u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, column);
        assert_eq!(restored.rank_of_mrca_uncertainty_with(&column), 0);
    }

    #[test]
    fn test_checkpoint_rejects_invalid_policy() {
        let mut column = Column::new(Policy::fixed_resolution(3).unwrap());
        column.deposit_strata(10);
        let json = serde_json::to_string(&column).unwrap();
        let tampered = json.replace(r#""resolution":3"#, r#""resolution":0"#);
        assert_ne!(json, tampered);
        assert!(serde_json::from_str::<Column>(&tampered).is_err());
    }

    #[test]
    fn test_checkpoint_rejects_inconsistent_fields() {
        let column = Column::new(Policy::pseudostochastic(5)).clone_nth_descendant(20);
        let json = serde_json::to_string(&column).unwrap();

        let rankless = json.replace(r#""stores_rank":true"#, r#""stores_rank":false"#);
        assert!(serde_json::from_str::<Column>(&rankless).is_err());

        let zero_width = json.replace(r#""differentia_bit_width":64"#, r#""differentia_bit_width":0"#);
        assert!(serde_json::from_str::<Column>(&zero_width).is_err());

        let shrunk = json.replace(r#""num_strata_deposited":21"#, r#""num_strata_deposited":1"#);
        assert!(serde_json::from_str::<Column>(&shrunk).is_err());

        assert!(serde_json::from_str::<Column>(&json).is_ok());
    }

    #[test]
    fn test_long_runs_under_slice_free_policies() {
        for policy in [Policy::perfect(), Policy::fixed_resolution(2).unwrap(), Policy::minimal()] {
            for config in [ColumnConfig::default(), ColumnConfig::compact()] {
                let mut column: Column = Column::with_config(policy.clone(), config, None).unwrap();
                column.deposit_strata(20_000);
                let n = column.num_strata_deposited();
                assert_eq!(Some(column.num_strata_retained()), policy.calc_num_strata_retained_exact(n));
                assert_eq!(column.rank_at_column_index(0), Some(0));
                assert_eq!(column.rank_at_column_index(column.num_strata_retained() as usize - 1), Some(n - 1));
            }
        }
    }
}
