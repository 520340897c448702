//! Hereditary Stratigraphic Column — the per-lineage annotation
//!
//! A column gains one stratum per generation and thins itself according to a
//! retention policy. Comparing two columns bounds the generation of their
//! most recent common ancestor.

mod stratigraphic;
mod stratum;

pub use stratigraphic::Column;
pub use stratum::{differentia_mask, Stratum};
