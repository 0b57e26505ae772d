//! # DexDepth AMM Library - Liquidity Depth Engine
//!
//! ## Purpose
//!
//! Mathematical library answering two questions for any pool and trading pair:
//! what is the spot price, and how much can be sold before the price moves by a
//! given number of basis points. Invariant math runs on exact big integers;
//! results leave the crate as human-scale `Decimal` values.
//!
//! ## Pool Coverage
//!
//! - **Constant product** (Uniswap V2 style): closed-form price and depth
//! - **StableSwap** (Curve): Newton solvers for `D` and `y`, depth by bisection
//! - **CryptoSwap** (Curve v2): gamma-adjusted Newton solver, depth by bisection
//! - **Concentrated liquidity** (Uniswap V3 style): exact tick walks, depth
//!   tables straight from cumulative sums
//! - **Pivot routes**: two slippage maps combined through a shared asset
//!
//! ## Architecture Role
//!
//! Upstream collaborators build [`types::PoolSnapshot`]s; [`LiquidityEngine`]
//! dispatches each one to its [`LiquidityPool`] adapter and returns
//! [`types::PriceQuote`]s and [`types::SlippageMap`]s. Every call is pure, so
//! callers may fan snapshots out over threads without locking.
//!
//! ## Example
//!
//! ```rust
//! use amm::LiquidityEngine;
//! use num_bigint::BigUint;
//! use types::{BpsRange, PairId, PoolKind, PoolSnapshot, StableSwapParams, TokenDecimals, TokenInfo};
//!
//! let wad = BigUint::from(10u32).pow(18);
//! let snapshot = PoolSnapshot::new(
//!     vec![
//!         TokenInfo::new("DAI", TokenDecimals::WAD),
//!         TokenInfo::new("USDC", TokenDecimals::new(6).unwrap()),
//!     ],
//!     PoolKind::StableSwap(StableSwapParams {
//!         reserves: vec![&wad * 1_000_000u32, BigUint::from(1_000_000_000_000u64)],
//!         amplification: 200,
//!         lp_supply: None,
//!     }),
//! )
//! .unwrap();
//!
//! let engine = LiquidityEngine::default();
//! let map = engine
//!     .slippage_map(PairId::new(0, 1), &snapshot, BpsRange::new(50, 200, 50).unwrap())
//!     .unwrap();
//! assert_eq!(map.len(), 4);
//! ```

pub mod crypto_math;
pub mod engine;
pub mod pivot;
pub mod pool_traits;
pub mod pools;
pub mod slippage_search;
pub mod stable_math;
pub mod tick_math;
pub mod v2_math;
pub mod v3_math;

pub use crypto_math::CryptoCurve;
pub use engine::LiquidityEngine;
pub use pivot::PivotAggregator;
pub use pool_traits::{ConstantProductPricer, LiquidityPool, ReservePricer, StablePricer};
pub use pools::{ConcentratedPool, ConstantProductPool, CryptoSwapPool, StableSwapPool};
pub use slippage_search::{SearchLimits, SearchOutcome, SlippageSearch};
pub use stable_math::StableMath;
pub use v2_math::V2Math;
pub use v3_math::{SwapOutcome, TickSlippageRow, V3Math, V3PoolState};

/// Common types for AMM calculations
pub use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;
