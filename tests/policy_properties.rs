//! Property-based tests for retention policies driving real columns.
//!
//! Verifies, across policy parameters and deposition counts:
//! - dropped ranks never reappear except as the newest rank
//! - retained ranks are ascending and anchored at 0 and the newest rank
//! - closed-form counts, rank lookups and bounds agree with observed columns

use proptest::prelude::*;

use hstrat_core::{Column, ColumnConfig, Policy, Rank, RetentionPolicy, StoreBackend};

// =============================================================================
// Proptest strategies
// =============================================================================

/// Generate a deterministic policy with small parameters.
fn arb_deterministic_policy() -> impl Strategy<Value = Policy> {
    prop_oneof![
        Just(Policy::minimal()),
        Just(Policy::perfect()),
        (1u64..=12).prop_map(|r| Policy::fixed_resolution(r).unwrap()),
        (1u64..=12).prop_map(|r| Policy::depth_proportional(r).unwrap()),
        (1u64..=12).prop_map(|r| Policy::depth_proportional_tapered(r).unwrap()),
        (0u64..=8).prop_map(Policy::recency_proportional),
        (1u64..=4, 1u64..=4).prop_map(|(d, i)| Policy::geom_seq_nth_root(d, i).unwrap()),
        (1u64..=4, 1u64..=4).prop_map(|(d, i)| Policy::geom_seq_nth_root_tapered(d, i).unwrap()),
        any::<u64>().prop_map(Policy::pseudostochastic),
    ]
}

fn arb_backend() -> impl Strategy<Value = StoreBackend> {
    prop_oneof![
        Just(StoreBackend::Vec),
        Just(StoreBackend::HashMap),
        Just(StoreBackend::BTreeMap),
    ]
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn dropped_ranks_are_never_resurrected(policy in arb_deterministic_policy(), depositions in 1u64..300) {
        let mut column = Column::new(policy);
        let mut previous: Vec<Rank> = column.iter_retained_ranks().collect();
        for _ in 0..depositions {
            column.deposit_stratum(None);
            let newest = column.num_strata_deposited() - 1;
            for rank in column.iter_retained_ranks().filter(|&r| r != newest) {
                prop_assert!(previous.binary_search(&rank).is_ok(), "rank {} resurrected", rank);
            }
            previous = column.iter_retained_ranks().collect();
        }
    }

    #[test]
    fn column_matches_policy_iteration(
        policy in arb_deterministic_policy(),
        backend in arb_backend(),
        depositions in 0u64..300,
    ) {
        let config = ColumnConfig::default().with_store_backend(backend);
        let mut column: Column = Column::with_config(policy.clone(), config, None).unwrap();
        column.deposit_strata(depositions);
        let n = column.num_strata_deposited();
        let observed: Vec<Rank> = column.iter_retained_ranks().collect();
        let expected: Vec<Rank> = policy.iter_retained_ranks(n).unwrap().collect();
        prop_assert_eq!(&observed, &expected);
        prop_assert_eq!(observed.first(), Some(&0));
        prop_assert_eq!(observed.last(), Some(&(n - 1)));
        prop_assert!(observed.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(policy.calc_num_strata_retained_exact(n), Some(column.num_strata_retained()));
        prop_assert!(policy.calc_num_strata_retained_upper_bound(n) >= column.num_strata_retained());
        prop_assert_eq!(column.num_discarded_strata(), n - column.num_strata_retained());
    }

    #[test]
    fn rank_lookup_is_monotone(policy in arb_deterministic_policy(), n in 1u64..400) {
        prop_assume!(policy.can_calc_rank_at_column_index());
        let count = policy.calc_num_strata_retained_exact(n).unwrap();
        let ranks: Vec<Rank> = (0..count)
            .map(|index| policy.calc_rank_at_column_index(index, n).unwrap())
            .collect();
        prop_assert!(ranks.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(ranks, policy.iter_retained_ranks(n).unwrap().collect::<Vec<_>>());
    }

    #[test]
    fn abs_bound_covers_observed_uncertainty(
        policy in arb_deterministic_policy(),
        common in 0u64..120,
        first_apart in 1u64..120,
        second_apart in 1u64..120,
    ) {
        let mut ancestor = Column::new(policy.clone());
        ancestor.deposit_strata(common);
        let first = ancestor.clone_nth_descendant(first_apart);
        let second = ancestor.clone_nth_descendant(second_apart);

        let observed = first.rank_of_mrca_uncertainty_with(&second);
        let (n1, n2) = (first.num_strata_deposited(), second.num_strata_deposited());
        let bound = policy.calc_mrca_uncertainty_abs_upper_bound(n1, n2, common);
        prop_assert!(observed <= bound, "{} observed {} > bound {}", policy, observed, bound);
        prop_assert_eq!(policy.calc_mrca_uncertainty_abs_exact(n1, n2, common), Some(observed));

        let (lower, upper) = first.rank_of_mrca_bounds_with(&second).unwrap();
        prop_assert!(lower <= common && common < upper);
    }
}
