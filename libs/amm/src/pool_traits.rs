//! Pool trait definitions for unified AMM interface

use crate::crypto_math::CryptoCurve;
use crate::stable_math::StableMath;
use num_bigint::BigUint;
use num_traits::Zero;
use rust_decimal::Decimal;
use types::{AmmError, AmmResult, BpsRange, PairId, SlippageMap};

/// Output of a swap against explicit reserves.
///
/// Reserves are passed on every call so a search can price hypothetical
/// post-trade states without touching the pool.
pub trait ReservePricer {
    /// Amount of asset `j` received for selling `dx` of asset `i`
    fn amount_out(&self, i: usize, j: usize, dx: &BigUint, reserves: &[BigUint])
        -> AmmResult<BigUint>;
}

/// Unified pool interface for price and depth queries
pub trait LiquidityPool {
    /// Pool kind name for logging
    fn kind(&self) -> &'static str;

    /// Human-scale units of `pair.to` per unit of `pair.from`, no trade applied
    fn spot_price(&self, pair: PairId) -> AmmResult<Decimal>;

    /// Trade sizes per slippage threshold for selling `pair.from`
    fn slippage_map(&self, pair: PairId, range: &BpsRange) -> AmmResult<SlippageMap>;
}

/// x*y=k over two integer reserves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConstantProductPricer {
    pub fee_bps: u32,
}

impl ConstantProductPricer {
    pub fn new(fee_bps: u32) -> AmmResult<Self> {
        if fee_bps >= 10_000 {
            return Err(AmmError::invalid_parameter(
                "fee_bps",
                format!("must be below 10000, got {fee_bps}"),
            ));
        }
        Ok(Self { fee_bps })
    }
}

impl ReservePricer for ConstantProductPricer {
    fn amount_out(
        &self,
        i: usize,
        j: usize,
        dx: &BigUint,
        reserves: &[BigUint],
    ) -> AmmResult<BigUint> {
        AmmError::check_pair(i, j, reserves.len())?;
        let dx_after_fee = dx * 10_000u32.saturating_sub(self.fee_bps);
        let numerator = &dx_after_fee * &reserves[j];
        let denominator = &reserves[i] * 10_000u32 + dx_after_fee;
        if denominator.is_zero() {
            return Err(AmmError::ZeroReserve { index: i });
        }
        Ok(numerator / denominator)
    }
}

/// StableSwap `get_return` over wad reserves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StablePricer {
    pub amplification: u64,
}

impl StablePricer {
    pub const fn new(amplification: u64) -> Self {
        Self { amplification }
    }
}

impl ReservePricer for StablePricer {
    fn amount_out(
        &self,
        i: usize,
        j: usize,
        dx: &BigUint,
        reserves: &[BigUint],
    ) -> AmmResult<BigUint> {
        StableMath::get_return(i, j, dx, reserves, self.amplification)
    }
}

impl ReservePricer for CryptoCurve<'_> {
    fn amount_out(
        &self,
        i: usize,
        j: usize,
        dx: &BigUint,
        reserves: &[BigUint],
    ) -> AmmResult<BigUint> {
        self.get_dy(i, j, dx, reserves)
    }
}
