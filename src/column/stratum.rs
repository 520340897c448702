//! Stratum — the immutable per-generation record deposited on a column
//!
//! Each stratum carries a randomly drawn differentia. Two columns holding equal
//! differentia at the same rank most likely share that stratum by descent; the
//! chance of a coincidental match is 2^-bit_width.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::Rank;

/// A single retained stratum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stratum<A = ()> {
    /// Random fingerprint, masked to the owning column's bit width
    differentia: u64,
    /// Generation at which the stratum was deposited; omitted when the
    /// column recomputes ranks from the retention policy
    deposition_rank: Option<Rank>,
    /// Opaque user payload
    annotation: Option<A>,
}

/// Mask keeping the low `bit_width` bits of a differentia
pub fn differentia_mask(bit_width: u8) -> u64 {
    debug_assert!((1..=64).contains(&bit_width));
    if bit_width >= 64 {
        u64::MAX
    } else {
        (1u64 << bit_width) - 1
    }
}

impl<A> Stratum<A> {
    /// Build a stratum with an explicit differentia
    pub fn new(differentia: u64, deposition_rank: Option<Rank>, annotation: Option<A>) -> Self {
        Self {
            differentia,
            deposition_rank,
            annotation,
        }
    }

    /// Draw a fresh random differentia of the given width
    pub fn random(bit_width: u8, deposition_rank: Option<Rank>, annotation: Option<A>) -> Self {
        let differentia = rand::thread_rng().gen::<u64>() & differentia_mask(bit_width);
        Self::new(differentia, deposition_rank, annotation)
    }

    pub fn differentia(&self) -> u64 {
        self.differentia
    }

    pub fn deposition_rank(&self) -> Option<Rank> {
        self.deposition_rank
    }

    pub fn annotation(&self) -> Option<&A> {
        self.annotation.as_ref()
    }

    /// True when both strata were drawn with the same differentia. Ranks and
    /// annotations are not considered.
    pub fn has_same_differentia<B>(&self, other: &Stratum<B>) -> bool {
        self.differentia == other.differentia
    }
}
