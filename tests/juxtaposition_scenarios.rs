//! Scenario tests comparing populations of columns generation by generation.

use std::sync::Arc;

use hstrat_core::juxtaposition::{
    calc_rank_of_first_retained_disparity_between, calc_rank_of_last_retained_commonality_between,
    calc_rank_of_mrca_bounds_between, calc_rank_of_mrca_uncertainty_between,
    calc_ranks_since_first_retained_disparity_between, calc_ranks_since_last_retained_commonality_between,
    calc_ranks_since_mrca_bounds_between, does_have_any_common_ancestor,
};
use hstrat_core::{Column, ColumnConfig, Policy, RetentionPolicy, StoreBackend};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn policies() -> Vec<Policy> {
    vec![
        Policy::minimal(),
        Policy::perfect(),
        Policy::fixed_resolution(7).unwrap(),
        Policy::depth_proportional(5).unwrap(),
        Policy::depth_proportional_tapered(5).unwrap(),
        Policy::recency_proportional(2),
        Policy::geom_seq_nth_root(3, 2).unwrap(),
        Policy::geom_seq_nth_root_tapered(2, 3).unwrap(),
        Policy::pseudostochastic(99),
        Policy::stochastic(0.5).unwrap(),
    ]
}

fn assert_consistent(a: &Column, b: &Column) {
    let lower = calc_rank_of_last_retained_commonality_between(a, b);
    let upper = calc_rank_of_first_retained_disparity_between(a, b);
    assert_eq!(lower, calc_rank_of_last_retained_commonality_between(b, a));
    assert_eq!(upper, calc_rank_of_first_retained_disparity_between(b, a));
    assert_eq!(calc_rank_of_mrca_bounds_between(a, b), calc_rank_of_mrca_bounds_between(b, a));
    assert_eq!(calc_rank_of_mrca_uncertainty_between(a, b), calc_rank_of_mrca_uncertainty_between(b, a));

    if let (Some(lower), Some(upper)) = (lower, upper) {
        assert!(lower < upper);
    }
    let expected = lower.map(|l| (l, upper.unwrap_or(a.num_strata_deposited())));
    assert_eq!(calc_rank_of_mrca_bounds_between(a, b), expected);

    let since_commonality = calc_ranks_since_last_retained_commonality_between(a, b);
    let since_disparity = calc_ranks_since_first_retained_disparity_between(a, b);
    assert_eq!(
        calc_ranks_since_mrca_bounds_between(a, b),
        since_commonality.map(|since| (since, since_disparity.unwrap_or(-1)))
    );
    if let (Some(since_commonality), Some(since_disparity)) = (since_commonality, since_disparity) {
        assert!(since_commonality as i64 > since_disparity);
        assert!(since_disparity >= -1);
    }
}

#[test]
fn test_synchronous_population() {
    init_logging();
    for policy in policies() {
        let policy = Arc::new(policy);
        let founder: Column = Column::with_shared_policy(Arc::clone(&policy), ColumnConfig::default(), None).unwrap();
        let mut population = vec![founder.clone(), founder.clone(), founder];
        for generation in 0..120 {
            for column in population.iter_mut() {
                column.deposit_stratum(None);
            }
            // periodically one lineage replaces another
            if generation % 17 == 0 {
                population[2] = population[0].clone();
            }
            for a in &population {
                for b in &population {
                    assert_consistent(a, b);
                }
            }
        }
    }
}

#[test]
fn test_asynchronous_depths() {
    init_logging();
    for policy in policies() {
        let mut ancestor = Column::new(policy.clone());
        ancestor.deposit_strata(25);
        let mut fast = ancestor.clone();
        let mut slow = ancestor.clone();
        for generation in 0..90 {
            fast.deposit_stratum(None);
            if generation % 3 == 0 {
                slow.deposit_stratum(None);
            }
            assert_consistent(&fast, &slow);
            assert!(does_have_any_common_ancestor(&fast, &slow), "{policy}");
            let (lower, upper) = calc_rank_of_mrca_bounds_between(&fast, &slow).unwrap();
            assert!(lower <= 25 && 25 < upper, "{policy}: ({lower}, {upper})");
            let (since_commonality, since_disparity) = calc_ranks_since_mrca_bounds_between(&fast, &slow).unwrap();
            assert!(since_commonality as i64 > since_disparity, "{policy}");
        }
    }
}

#[test]
fn test_self_comparison() {
    for policy in policies() {
        let mut column = Column::new(policy);
        for generation in 0..60u64 {
            assert_eq!(calc_rank_of_last_retained_commonality_between(&column, &column), Some(generation));
            assert_eq!(calc_rank_of_first_retained_disparity_between(&column, &column), None);
            assert_eq!(calc_rank_of_mrca_uncertainty_between(&column, &column), 0);
            column.deposit_stratum(None);
        }
    }
}

#[test]
fn test_mixed_backends_compare_equal() {
    let policy = Policy::depth_proportional(3).unwrap();
    let founder = Column::new(policy.clone());
    let vec_child = founder.clone_nth_descendant(40);
    let mut tree_child: Column = Column::with_config(
        policy.clone(),
        ColumnConfig::default()
            .with_store_backend(StoreBackend::BTreeMap)
            .with_always_store_rank(false),
        None,
    )
    .unwrap();
    tree_child.deposit_strata(40);

    // same ranks, unrelated differentia
    assert_eq!(
        vec_child.iter_retained_ranks().collect::<Vec<_>>(),
        tree_child.iter_retained_ranks().collect::<Vec<_>>()
    );
    assert_eq!(calc_rank_of_last_retained_commonality_between(&vec_child, &tree_child), None);
    assert_eq!(calc_rank_of_first_retained_disparity_between(&vec_child, &tree_child), Some(0));
}

#[test]
fn test_uncertainty_within_pessimal_bound() {
    for policy in policies().into_iter().filter(|p| p.is_deterministic()) {
        let ancestor = Column::new(policy.clone());
        for common in [0u64, 10, 60] {
            let mut root = ancestor.clone();
            root.deposit_strata(common);
            let a = root.clone_nth_descendant(80);
            let b = root.clone_nth_descendant(35);
            let (n1, n2) = (a.num_strata_deposited(), b.num_strata_deposited());
            let worst = policy.calc_mrca_uncertainty_abs_upper_bound_at_pessimal_rank(n1, n2);
            assert!(calc_rank_of_mrca_uncertainty_between(&a, &b) <= worst, "{policy}");
        }
    }
}
