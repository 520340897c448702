//! Retention Policies — which strata a column keeps as it grows
//!
//! Each policy trades column size against the precision of later MRCA
//! estimates. All policies anchor rank 0 and the newest rank so that any two
//! columns always share a comparable stratum.
//!
//! Optional capabilities (closed-form rank lookup, rank iteration, exact
//! counts) are trait methods returning `Option`; callers test for presence
//! rather than matching on the policy kind.

mod depth_proportional;
mod depth_proportional_tapered;
pub mod detail;
mod fixed_resolution;
mod geom_seq_nth_root;
mod geom_seq_nth_root_tapered;
mod minimal;
mod perfect;
mod pseudostochastic;
mod recency_proportional;
mod stochastic;

pub use depth_proportional::DepthProportionalPolicy;
pub use depth_proportional_tapered::DepthProportionalTaperedPolicy;
pub use fixed_resolution::FixedResolutionPolicy;
pub use geom_seq_nth_root::GeomSeqNthRootPolicy;
pub use geom_seq_nth_root_tapered::GeomSeqNthRootTaperedPolicy;
pub use minimal::MinimalPolicy;
pub use perfect::PerfectPolicy;
pub use pseudostochastic::PseudostochasticPolicy;
pub use recency_proportional::RecencyProportionalPolicy;
pub use stochastic::StochasticPolicy;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::Rank;

/// Iterator over retained ranks in ascending order
pub type RankIter<'a> = Box<dyn Iterator<Item = Rank> + 'a>;

/// Behavior shared by every retention policy
pub trait RetentionPolicy {
    /// Ranks to delete right after the stratum at rank
    /// `num_depositions_completed` was inserted. `retained_ranks` is ascending
    /// and already holds the new rank. Never proposes rank 0 or the new rank.
    fn gen_drop_ranks(&self, num_depositions_completed: u64, retained_ranks: &[Rank]) -> Vec<Rank>;

    /// False when `gen_drop_ranks` decides from the rank alone, in which case
    /// callers may pass an empty `retained_ranks`
    fn reads_retained_ranks(&self) -> bool {
        true
    }

    /// Rank stored at `index` once `num_strata_deposited` strata have been
    /// deposited. Policies returning `Some` guarantee the mapping strictly
    /// increases with `index`.
    fn calc_rank_at_column_index(&self, _index: u64, _num_strata_deposited: u64) -> Option<Rank> {
        None
    }

    /// Retained ranks after `num_strata_deposited` depositions
    fn iter_retained_ranks(&self, _num_strata_deposited: u64) -> Option<RankIter<'_>> {
        None
    }

    fn calc_num_strata_retained_exact(&self, num_strata_deposited: u64) -> Option<u64> {
        self.iter_retained_ranks(num_strata_deposited)
            .map(|ranks| ranks.count() as u64)
    }

    fn calc_num_strata_retained_upper_bound(&self, num_strata_deposited: u64) -> u64 {
        num_strata_deposited
    }

    /// Most ranks by which the MRCA estimate can miss when the true MRCA is
    /// `actual_mrca_rank`
    fn calc_mrca_uncertainty_abs_upper_bound(
        &self,
        first_num_strata_deposited: u64,
        second_num_strata_deposited: u64,
        _actual_mrca_rank: Rank,
    ) -> u64 {
        detail::worst_case_mrca_uncertainty(first_num_strata_deposited, second_num_strata_deposited)
    }

    /// Uncertainty that comparing two columns diverged after
    /// `actual_mrca_rank` would report, barring differentia collisions
    fn calc_mrca_uncertainty_abs_exact(
        &self,
        first_num_strata_deposited: u64,
        second_num_strata_deposited: u64,
        actual_mrca_rank: Rank,
    ) -> Option<u64> {
        Some(detail::mrca_uncertainty_from_retained(
            self.iter_retained_ranks(first_num_strata_deposited)?,
            self.iter_retained_ranks(second_num_strata_deposited)?,
            first_num_strata_deposited,
            second_num_strata_deposited,
            actual_mrca_rank,
        ))
    }

    fn calc_mrca_uncertainty_abs_upper_bound_pessimal_rank(
        &self,
        first_num_strata_deposited: u64,
        second_num_strata_deposited: u64,
    ) -> Rank {
        detail::scan_pessimal_rank(first_num_strata_deposited, second_num_strata_deposited, |rank| {
            self.calc_mrca_uncertainty_abs_upper_bound(
                first_num_strata_deposited,
                second_num_strata_deposited,
                rank,
            )
        })
    }

    fn calc_mrca_uncertainty_abs_upper_bound_at_pessimal_rank(
        &self,
        first_num_strata_deposited: u64,
        second_num_strata_deposited: u64,
    ) -> u64 {
        let rank = self.calc_mrca_uncertainty_abs_upper_bound_pessimal_rank(
            first_num_strata_deposited,
            second_num_strata_deposited,
        );
        self.calc_mrca_uncertainty_abs_upper_bound(
            first_num_strata_deposited,
            second_num_strata_deposited,
            rank,
        )
    }

    /// Absolute bound as a fraction of the generations elapsed since the MRCA
    fn calc_mrca_uncertainty_rel_upper_bound(
        &self,
        first_num_strata_deposited: u64,
        second_num_strata_deposited: u64,
        actual_mrca_rank: Rank,
    ) -> f64 {
        let abs = self.calc_mrca_uncertainty_abs_upper_bound(
            first_num_strata_deposited,
            second_num_strata_deposited,
            actual_mrca_rank,
        );
        let elapsed = first_num_strata_deposited
            .max(second_num_strata_deposited)
            .saturating_sub(actual_mrca_rank)
            .max(1);
        abs as f64 / elapsed as f64
    }

    fn calc_mrca_uncertainty_rel_upper_bound_pessimal_rank(
        &self,
        first_num_strata_deposited: u64,
        second_num_strata_deposited: u64,
    ) -> Rank {
        detail::scan_pessimal_rank(first_num_strata_deposited, second_num_strata_deposited, |rank| {
            self.calc_mrca_uncertainty_rel_upper_bound(
                first_num_strata_deposited,
                second_num_strata_deposited,
                rank,
            )
        })
    }

    fn calc_mrca_uncertainty_rel_upper_bound_at_pessimal_rank(
        &self,
        first_num_strata_deposited: u64,
        second_num_strata_deposited: u64,
    ) -> f64 {
        let rank = self.calc_mrca_uncertainty_rel_upper_bound_pessimal_rank(
            first_num_strata_deposited,
            second_num_strata_deposited,
        );
        self.calc_mrca_uncertainty_rel_upper_bound(
            first_num_strata_deposited,
            second_num_strata_deposited,
            rank,
        )
    }

    fn can_calc_rank_at_column_index(&self) -> bool {
        self.calc_rank_at_column_index(0, 1).is_some()
    }
}

/// The closed set of retention policies a column can be built with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    Minimal(MinimalPolicy),
    Perfect(PerfectPolicy),
    FixedResolution(FixedResolutionPolicy),
    DepthProportional(DepthProportionalPolicy),
    DepthProportionalTapered(DepthProportionalTaperedPolicy),
    RecencyProportional(RecencyProportionalPolicy),
    GeomSeqNthRoot(GeomSeqNthRootPolicy),
    GeomSeqNthRootTapered(GeomSeqNthRootTaperedPolicy),
    Pseudostochastic(PseudostochasticPolicy),
    Stochastic(StochasticPolicy),
}

impl Policy {
    pub fn minimal() -> Self {
        Policy::Minimal(MinimalPolicy)
    }

    pub fn perfect() -> Self {
        Policy::Perfect(PerfectPolicy)
    }

    pub fn fixed_resolution(resolution: u64) -> Result<Self> {
        Ok(FixedResolutionPolicy::new(resolution)?.into())
    }

    pub fn depth_proportional(resolution: u64) -> Result<Self> {
        Ok(DepthProportionalPolicy::new(resolution)?.into())
    }

    pub fn depth_proportional_tapered(resolution: u64) -> Result<Self> {
        Ok(DepthProportionalTaperedPolicy::new(resolution)?.into())
    }

    pub fn recency_proportional(resolution: u64) -> Self {
        RecencyProportionalPolicy::new(resolution).into()
    }

    pub fn geom_seq_nth_root(degree: u64, interspersal: u64) -> Result<Self> {
        Ok(GeomSeqNthRootPolicy::new(degree, interspersal)?.into())
    }

    pub fn geom_seq_nth_root_tapered(degree: u64, interspersal: u64) -> Result<Self> {
        Ok(GeomSeqNthRootTaperedPolicy::new(degree, interspersal)?.into())
    }

    pub fn pseudostochastic(hash_salt: u64) -> Self {
        PseudostochasticPolicy::new(hash_salt).into()
    }

    pub fn stochastic(retention_probability: f64) -> Result<Self> {
        Ok(StochasticPolicy::new(retention_probability)?.into())
    }

    /// Machine-friendly name of the policy kind
    pub fn identifier(&self) -> &'static str {
        match self {
            Policy::Minimal(_) => "minimal",
            Policy::Perfect(_) => "perfect",
            Policy::FixedResolution(_) => "fixed_resolution",
            Policy::DepthProportional(_) => "depth_proportional",
            Policy::DepthProportionalTapered(_) => "depth_proportional_tapered",
            Policy::RecencyProportional(_) => "recency_proportional",
            Policy::GeomSeqNthRoot(_) => "geom_seq_nth_root",
            Policy::GeomSeqNthRootTapered(_) => "geom_seq_nth_root_tapered",
            Policy::Pseudostochastic(_) => "pseudostochastic",
            Policy::Stochastic(_) => "stochastic",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Policy::Minimal(_) => "Minimal Resolution Stratum Retention Policy",
            Policy::Perfect(_) => "Perfect Resolution Stratum Retention Policy",
            Policy::FixedResolution(_) => "Fixed Resolution Stratum Retention Policy",
            Policy::DepthProportional(_) => "Depth Proportional Resolution Stratum Retention Policy",
            Policy::DepthProportionalTapered(_) => {
                "Depth Proportional Resolution Tapered Stratum Retention Policy"
            }
            Policy::RecencyProportional(_) => "Recency Proportional Resolution Stratum Retention Policy",
            Policy::GeomSeqNthRoot(_) => "Geometric Sequence Nth Root Stratum Retention Policy",
            Policy::GeomSeqNthRootTapered(_) => {
                "Geometric Sequence Nth Root Tapered Stratum Retention Policy"
            }
            Policy::Pseudostochastic(_) => "Pseudostochastic Stratum Retention Policy",
            Policy::Stochastic(_) => "Stochastic Stratum Retention Policy",
        }
    }

    /// Re-check parameters. Constructors and deserialization already
    /// validate, so this only fails for values built some other way.
    pub fn validate(&self) -> Result<()> {
        match self {
            Policy::Minimal(_) | Policy::Perfect(_) => Ok(()),
            Policy::FixedResolution(p) => p.validate(),
            Policy::DepthProportional(p) => p.validate(),
            Policy::DepthProportionalTapered(p) => p.validate(),
            Policy::RecencyProportional(_) | Policy::Pseudostochastic(_) => Ok(()),
            Policy::GeomSeqNthRoot(p) => p.validate(),
            Policy::GeomSeqNthRootTapered(p) => p.validate(),
            Policy::Stochastic(p) => p.validate(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let policy: Self = serde_json::from_str(json)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// True when every call is a pure function of the parameters
    pub fn is_deterministic(&self) -> bool {
        !matches!(self, Policy::Stochastic(_))
    }

    fn inner(&self) -> &dyn RetentionPolicy {
        match self {
            Policy::Minimal(p) => p,
            Policy::Perfect(p) => p,
            Policy::FixedResolution(p) => p,
            Policy::DepthProportional(p) => p,
            Policy::DepthProportionalTapered(p) => p,
            Policy::RecencyProportional(p) => p,
            Policy::GeomSeqNthRoot(p) => p,
            Policy::GeomSeqNthRootTapered(p) => p,
            Policy::Pseudostochastic(p) => p,
            Policy::Stochastic(p) => p,
        }
    }
}

impl RetentionPolicy for Policy {
    fn gen_drop_ranks(&self, num_depositions_completed: u64, retained_ranks: &[Rank]) -> Vec<Rank> {
        self.inner().gen_drop_ranks(num_depositions_completed, retained_ranks)
    }

    fn reads_retained_ranks(&self) -> bool {
        self.inner().reads_retained_ranks()
    }

    fn calc_rank_at_column_index(&self, index: u64, num_strata_deposited: u64) -> Option<Rank> {
        self.inner().calc_rank_at_column_index(index, num_strata_deposited)
    }

    fn iter_retained_ranks(&self, num_strata_deposited: u64) -> Option<RankIter<'_>> {
        self.inner().iter_retained_ranks(num_strata_deposited)
    }

    fn calc_num_strata_retained_exact(&self, num_strata_deposited: u64) -> Option<u64> {
        self.inner().calc_num_strata_retained_exact(num_strata_deposited)
    }

    fn calc_num_strata_retained_upper_bound(&self, num_strata_deposited: u64) -> u64 {
        self.inner().calc_num_strata_retained_upper_bound(num_strata_deposited)
    }

    fn calc_mrca_uncertainty_abs_upper_bound(&self, first: u64, second: u64, actual_mrca_rank: Rank) -> u64 {
        self.inner()
            .calc_mrca_uncertainty_abs_upper_bound(first, second, actual_mrca_rank)
    }

    fn calc_mrca_uncertainty_abs_exact(&self, first: u64, second: u64, actual_mrca_rank: Rank) -> Option<u64> {
        self.inner()
            .calc_mrca_uncertainty_abs_exact(first, second, actual_mrca_rank)
    }

    fn calc_mrca_uncertainty_abs_upper_bound_pessimal_rank(&self, first: u64, second: u64) -> Rank {
        self.inner()
            .calc_mrca_uncertainty_abs_upper_bound_pessimal_rank(first, second)
    }

    fn calc_mrca_uncertainty_abs_upper_bound_at_pessimal_rank(&self, first: u64, second: u64) -> u64 {
        self.inner()
            .calc_mrca_uncertainty_abs_upper_bound_at_pessimal_rank(first, second)
    }

    fn calc_mrca_uncertainty_rel_upper_bound(&self, first: u64, second: u64, actual_mrca_rank: Rank) -> f64 {
        self.inner()
            .calc_mrca_uncertainty_rel_upper_bound(first, second, actual_mrca_rank)
    }

    fn calc_mrca_uncertainty_rel_upper_bound_pessimal_rank(&self, first: u64, second: u64) -> Rank {
        self.inner()
            .calc_mrca_uncertainty_rel_upper_bound_pessimal_rank(first, second)
    }

    fn calc_mrca_uncertainty_rel_upper_bound_at_pessimal_rank(&self, first: u64, second: u64) -> f64 {
        self.inner()
            .calc_mrca_uncertainty_rel_upper_bound_at_pessimal_rank(first, second)
    }

    fn can_calc_rank_at_column_index(&self) -> bool {
        self.inner().can_calc_rank_at_column_index()
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Minimal(_) | Policy::Perfect(_) => write!(f, "{}", self.identifier()),
            Policy::FixedResolution(p) => write!(f, "fixed_resolution(resolution={})", p.resolution()),
            Policy::DepthProportional(p) => {
                write!(f, "depth_proportional(resolution={})", p.resolution())
            }
            Policy::DepthProportionalTapered(p) => {
                write!(f, "depth_proportional_tapered(resolution={})", p.resolution())
            }
            Policy::RecencyProportional(p) => {
                write!(f, "recency_proportional(resolution={})", p.resolution())
            }
            Policy::GeomSeqNthRoot(p) => write!(
                f,
                "geom_seq_nth_root(degree={}, interspersal={})",
                p.degree(),
                p.interspersal()
            ),
            Policy::GeomSeqNthRootTapered(p) => write!(
                f,
                "geom_seq_nth_root_tapered(degree={}, interspersal={})",
                p.degree(),
                p.interspersal()
            ),
            Policy::Pseudostochastic(p) => write!(f, "pseudostochastic(hash_salt={:#x})", p.hash_salt()),
            Policy::Stochastic(p) => write!(
                f,
                "stochastic(retention_probability={})",
                p.retention_probability()
            ),
        }
    }
}

macro_rules! impl_from_policy {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Policy {
                fn from(policy: $ty) -> Self {
                    Policy::$variant(policy)
                }
            }
        )*
    };
}

impl_from_policy!(
    Minimal(MinimalPolicy),
    Perfect(PerfectPolicy),
    FixedResolution(FixedResolutionPolicy),
    DepthProportional(DepthProportionalPolicy),
    DepthProportionalTapered(DepthProportionalTaperedPolicy),
    RecencyProportional(RecencyProportionalPolicy),
    GeomSeqNthRoot(GeomSeqNthRootPolicy),
    GeomSeqNthRootTapered(GeomSeqNthRootTaperedPolicy),
    Pseudostochastic(PseudostochasticPolicy),
    Stochastic(StochasticPolicy),
);
