//! hstrat-core — Hereditary Stratigraphy
//!
//! Lineages carry a compact, append-only column of random "strata", one per
//! generation, thinned by a pluggable retention policy. Comparing two columns
//! bounds the generation of their most recent common ancestor without any
//! central record of ancestry.

pub mod column;
pub mod config;
pub mod error;
pub mod juxtaposition;
pub mod policy;
pub mod search;
pub mod store;

/// Generation index of a stratum; rank 0 is the first deposition
pub type Rank = u64;

pub use column::{Column, Stratum};
pub use config::ColumnConfig;
pub use error::{Result, StrataError};
pub use policy::{Policy, RetentionPolicy};
pub use store::{OrderedStore, StoreBackend, StratumOrderedStore};
