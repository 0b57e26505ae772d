//! # DexDepth Shared Types
//!
//! Data model shared by the DexDepth liquidity engines.
//!
//! ## Design Philosophy
//!
//! - **No Precision Loss**: reserves stay big integers until they leave the engine
//! - **Closed Pool Set**: every snapshot resolves to one [`PoolKind`] at construction
//! - **Explicit Boundaries**: native units, wad and human-scale `Decimal` never mix implicitly
//!
//! ## Quick Start
//!
//! ```rust
//! use num_bigint::BigUint;
//! use types::{
//!     ConstantProductParams, PoolKind, PoolSnapshot, TokenDecimals, TokenInfo,
//! };
//!
//! let snapshot = PoolSnapshot::new(
//!     vec![
//!         TokenInfo::new("WETH", TokenDecimals::WAD),
//!         TokenInfo::new("USDC", TokenDecimals::new(6).unwrap()),
//!     ],
//!     PoolKind::ConstantProduct(ConstantProductParams {
//!         reserves: [BigUint::from(1_000u32), BigUint::from(2_000_000u32)],
//!     }),
//! )
//! .unwrap();
//! assert_eq!(snapshot.kind().name(), "constant_product");
//! ```

pub mod common;
pub mod precision;
pub mod slippage;
pub mod snapshot;

pub use common::{AmmError, AmmResult};
pub use precision::TokenDecimals;
pub use slippage::{BpsRange, PriceMeasure, PriceQuote, SlippageEntry, SlippageMap};
pub use snapshot::{
    ConcentratedParams, ConstantProductParams, CryptoSwapParams, PairId, PoolKind, PoolSnapshot,
    StableSwapParams, TokenInfo,
};
