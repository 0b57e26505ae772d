//! Engine Configuration Module
//!
//! Provides configuration loading for the liquidity engines.
//! Supports built-in defaults, an optional TOML file and `DEXDEPTH_` environment
//! overrides, layered in that order.

use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};
use types::{BpsRange, PriceMeasure};

/// Prefix for environment overrides, e.g. `DEXDEPTH_SEARCH__MAX_ITERATIONS=512`
pub const ENV_PREFIX: &str = "DEXDEPTH";

/// Main engine configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Slippage grid and price measurement
    pub slippage: SlippageSettings,

    /// Bisection limits
    pub search: SearchSettings,

    /// Tick walk range for concentrated pools
    pub concentrated: ConcentratedSettings,

    pub logging: LoggingConfig,
}

/// Slippage grid settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SlippageSettings {
    pub min_bps: u32,
    pub max_bps: u32,
    pub step_bps: u32,
    pub measure: PriceMeasure,
    /// Probe trade size in whole tokens of the sold asset
    pub probe_tokens: Decimal,
}

/// Bracket search limits
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SearchSettings {
    pub max_iterations: usize,
    /// Relative bracket width at which the search stops (10 = 0.1%)
    pub bracket_tolerance_bps: u32,
}

/// Concentrated-liquidity walk settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ConcentratedSettings {
    pub max_percent: u32,
    pub ticks_per_percent: i32,
}

/// Tracing subscriber settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,
    pub json: bool,
}

impl Default for SlippageSettings {
    fn default() -> Self {
        Self {
            min_bps: 50,
            max_bps: 2000,
            step_bps: 50,
            measure: PriceMeasure::Marginal,
            probe_tokens: Decimal::ONE,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_iterations: 256,
            bracket_tolerance_bps: 10,
        }
    }
}

impl Default for ConcentratedSettings {
    fn default() -> Self {
        Self {
            max_percent: 50,
            ticks_per_percent: 100,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl SlippageSettings {
    pub fn bps_range(&self) -> BpsRange {
        BpsRange {
            min: self.min_bps,
            max: self.max_bps,
            step: self.step_bps,
        }
    }
}

impl EngineConfig {
    /// Load configuration from an optional TOML file with environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    fn load_with_prefix(path: Option<&Path>, prefix: &str) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!("Loading engine config: {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        // Sections are separated by a double underscore so field names keep theirs
        builder = builder.add_source(
            Environment::with_prefix(prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        debug!(?config, "Engine configuration loaded");
        Ok(config)
    }

    /// Reject settings the engines cannot honour
    pub fn validate(&self) -> Result<()> {
        let slippage = &self.slippage;
        slippage
            .bps_range()
            .validate()
            .context("Invalid slippage grid")?;
        if slippage.min_bps % slippage.step_bps != 0 || slippage.max_bps % slippage.step_bps != 0 {
            bail!(
                "Slippage grid {}..={} is not aligned to step {}",
                slippage.min_bps,
                slippage.max_bps,
                slippage.step_bps
            );
        }
        if slippage.probe_tokens <= Decimal::ZERO {
            bail!("probe_tokens must be positive, got {}", slippage.probe_tokens);
        }

        if self.search.max_iterations == 0 {
            bail!("search.max_iterations must be positive");
        }
        if !(1..10_000).contains(&self.search.bracket_tolerance_bps) {
            bail!(
                "search.bracket_tolerance_bps must be in 1..10000, got {}",
                self.search.bracket_tolerance_bps
            );
        }

        if !(1..=50).contains(&self.concentrated.max_percent) {
            bail!(
                "concentrated.max_percent must be in 1..=50, got {}",
                self.concentrated.max_percent
            );
        }
        if self.concentrated.ticks_per_percent <= 0 {
            bail!(
                "concentrated.ticks_per_percent must be positive, got {}",
                self.concentrated.ticks_per_percent
            );
        }

        Ok(())
    }
}
