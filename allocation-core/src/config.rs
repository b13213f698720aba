//! Configuration for the allocator

use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Allocator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    /// Accepted deviation from 100% when a UI asks whether a percentage
    /// split is complete (percentage points). Allocation itself is exact.
    pub percentage_tolerance: Decimal,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            percentage_tolerance: Decimal::ONE,
        }
    }
}

impl AllocationConfig {
    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;
        let config: AllocationConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.percentage_tolerance < Decimal::ZERO
            || self.percentage_tolerance > Decimal::ONE_HUNDRED
        {
            return Err(Error::Config(format!(
                "percentage_tolerance {} outside 0..=100",
                self.percentage_tolerance
            )));
        }
        Ok(())
    }
}
