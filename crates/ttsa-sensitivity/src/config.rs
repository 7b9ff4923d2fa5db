//! Engine configuration
//!
//! One [`EngineConfig`] value is threaded through every engine call. It can
//! be deserialized from JSON; missing fields take their defaults.

use crate::error::{Result, SensitivityError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use ttsa_tensorci::CrossOptions;
use ttsa_tensortrain::{CompressionOptions, OptimizeOptions};

/// Most decimal digits a report can keep before rounding stops being exact
pub const MAX_DIGITS: u32 = 15;

/// Numeric settings shared by the surrogate builder and the index engines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Cross-approximation and rounding tolerance
    pub eps: f64,
    /// Half-sweep cap of every cross approximation
    pub max_iter: usize,
    /// Bond dimension cap of every cross approximation
    pub max_bond_dim: usize,
    /// Grid points per interval domain
    pub ticks: usize,
    /// Largest subset size listed in reports
    pub max_order: usize,
    /// Decimal digits kept in reports
    pub digits: u32,
    /// Seed of the random pivot and extremum searches
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            eps: 1e-6,
            max_iter: 10,
            max_bond_dim: 64,
            ticks: 64,
            max_order: 4,
            digits: 4,
            seed: 0,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON configuration document
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Set the tolerance
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    /// Set the half-sweep cap
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the grid resolution
    pub fn with_ticks(mut self, ticks: usize) -> Self {
        self.ticks = ticks;
        self
    }

    /// Set the largest reported order
    pub fn with_max_order(mut self, max_order: usize) -> Self {
        self.max_order = max_order;
        self
    }

    /// Reject settings no engine can work with
    pub fn validate(&self) -> Result<()> {
        if !(self.eps.is_finite() && self.eps >= 0.0) {
            return Err(SensitivityError::InvalidArgument {
                message: format!("eps must be finite and non-negative, got {}", self.eps),
            });
        }
        if self.ticks < 2 {
            return Err(SensitivityError::InvalidArgument {
                message: format!("ticks must be at least 2, got {}", self.ticks),
            });
        }
        if self.digits > MAX_DIGITS {
            return Err(SensitivityError::InvalidArgument {
                message: format!("digits must be at most {MAX_DIGITS}, got {}", self.digits),
            });
        }
        if self.max_bond_dim == 0 {
            return Err(SensitivityError::InvalidArgument {
                message: "max_bond_dim must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Options for the cross approximations
    pub fn cross_options(&self) -> CrossOptions {
        CrossOptions::default()
            .with_tolerance(self.eps)
            .with_max_iter(self.max_iter)
            .with_max_bond_dim(self.max_bond_dim)
            .with_seed(self.seed)
    }

    /// Options for rounding derived tensors
    pub fn compression_options(&self) -> CompressionOptions {
        CompressionOptions::default().with_tolerance(self.eps)
    }

    /// Options for the extremum searches
    pub fn optimize_options(&self) -> OptimizeOptions {
        OptimizeOptions::default().with_seed(self.seed)
    }
}
