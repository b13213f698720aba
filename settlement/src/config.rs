//! Configuration for settlement engine

use allocation_core::AllocationConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Settlement engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Allocator configuration
    pub allocation: AllocationConfig,

    /// Netting configuration
    pub netting: NettingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "settlement-engine".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            allocation: AllocationConfig::default(),
            netting: NettingConfig::default(),
        }
    }
}

/// Order among creditors (or debtors) holding the same net amount
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Participant input order
    #[default]
    InputOrder,
    /// Participant id, lexicographic
    ParticipantId,
}

impl FromStr for TieBreak {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "input_order" => Ok(TieBreak::InputOrder),
            "participant_id" => Ok(TieBreak::ParticipantId),
            other => Err(crate::Error::Config(format!("Unknown tie break: {}", other))),
        }
    }
}

/// Netting configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NettingConfig {
    /// Tie-break among equal nets
    pub tie_break: TieBreak,
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(tie_break) = std::env::var("SETTLEMENT_TIE_BREAK") {
            config.netting.tie_break = tie_break.parse()?;
        }

        if let Ok(tolerance) = std::env::var("SETTLEMENT_PERCENT_TOLERANCE") {
            config.allocation.percentage_tolerance = Decimal::from_str(&tolerance).map_err(|e| {
                crate::Error::Config(format!("Invalid SETTLEMENT_PERCENT_TOLERANCE: {}", e))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> crate::Result<()> {
        if self.service_name.is_empty() {
            return Err(crate::Error::Config("service_name is empty".to_string()));
        }
        self.allocation.validate()?;
        Ok(())
    }
}
