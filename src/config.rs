//! ColumnConfig — construction-time knobs for a hereditary stratigraphic column
//!
//! Loaded from JSON or built in code; validated before a column is created.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StrataError};
use crate::store::StoreBackend;

/// Configuration for a column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    /// Number of low bits kept from each randomly drawn differentia (1..=64)
    pub differentia_bit_width: u8,
    /// Ordered store backend holding retained strata
    pub store_backend: StoreBackend,
    /// Keep the deposition rank on each stratum even when the retention
    /// policy can recompute it from the column index
    pub always_store_rank_in_stratum: bool,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            differentia_bit_width: 64,
            store_backend: StoreBackend::Vec,
            always_store_rank_in_stratum: true,
        }
    }
}

impl ColumnConfig {
    /// Small-footprint preset: single-byte differentia, ranks recomputed
    /// from the policy where possible
    pub fn compact() -> Self {
        Self {
            differentia_bit_width: 8,
            store_backend: StoreBackend::Vec,
            always_store_rank_in_stratum: false,
        }
    }

    /// Preset suited to policies that drop ranks scattered through the column
    pub fn sparse_deletion() -> Self {
        Self {
            store_backend: StoreBackend::HashMap,
            ..Self::default()
        }
    }

    pub fn with_bit_width(mut self, differentia_bit_width: u8) -> Self {
        self.differentia_bit_width = differentia_bit_width;
        self
    }

    pub fn with_store_backend(mut self, store_backend: StoreBackend) -> Self {
        self.store_backend = store_backend;
        self
    }

    pub fn with_always_store_rank(mut self, always_store_rank_in_stratum: bool) -> Self {
        self.always_store_rank_in_stratum = always_store_rank_in_stratum;
        self
    }

    /// Check that every field is within range
    pub fn validate(&self) -> Result<()> {
        if self.differentia_bit_width == 0 || self.differentia_bit_width > 64 {
            warn!(
                "Rejecting column config with differentia bit width {}",
                self.differentia_bit_width
            );
            return Err(StrataError::InvalidBitWidth(self.differentia_bit_width));
        }
        Ok(())
    }

    /// Parse and validate a JSON config; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
