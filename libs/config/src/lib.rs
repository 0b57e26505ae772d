//! # DexDepth Engine Configuration
//!
//! Configuration and logging setup shared by the liquidity engines.
//!
//! ## Features
//!
//! - **Slippage Grid**: threshold range, price measure and probe size
//! - **Search Limits**: bisection cap and bracket tolerance
//! - **Tick Walk Range**: percent range for concentrated pools
//! - **Logging**: `tracing-subscriber` installation with env-filter and JSON output
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dexdepth_config::{init_tracing, EngineConfig};
//!
//! let config = EngineConfig::load(None).unwrap();
//! init_tracing(&config.logging).unwrap();
//! ```

pub mod engine_config;
pub mod logging;

// Re-export commonly used types
pub use engine_config::{
    ConcentratedSettings, EngineConfig, LoggingConfig, SearchSettings, SlippageSettings,
    ENV_PREFIX,
};
pub use logging::init_tracing;
