//! [`LiquidityPool`] adapters, one per [`types::PoolKind`] variant
//!
//! Each adapter borrows its snapshot parameters and picks the working domain
//! of its math: human-scale decimals for constant product, wad for StableSwap,
//! native units for CryptoSwap and Q64.96 for concentrated pools. Amounts are
//! converted back to human-scale decimals before they leave.

use crate::crypto_math::CryptoCurve;
use crate::pool_traits::{LiquidityPool, StablePricer};
use crate::slippage_search::{SearchLimits, SearchOutcome, SlippageSearch, PRICE_SCALE_DECIMALS};
use crate::stable_math::StableMath;
use crate::v2_math::V2Math;
use crate::v3_math::{V3Math, V3PoolState};
use config::EngineConfig;
use num_bigint::BigUint;
use num_traits::Zero;
use rust_decimal::Decimal;
use types::precision::{
    decimal_to_raw, decimal_to_wad, pow10, raw_to_decimal, scaled_to_decimal, to_wad,
    wad_to_decimal,
};
use types::{
    AmmError, AmmResult, BpsRange, ConcentratedParams, ConstantProductParams, CryptoSwapParams,
    PairId, SlippageEntry, SlippageMap, StableSwapParams, TokenDecimals,
};

fn check_reserves(reserves: &[BigUint], pair: PairId) -> AmmResult<()> {
    for index in [pair.from, pair.to] {
        if reserves[index].is_zero() {
            return Err(AmmError::ZeroReserve { index });
        }
    }
    Ok(())
}

fn limits(config: &EngineConfig) -> SearchLimits {
    SearchLimits::from(&config.search)
}

/// Uniswap-V2-style pool, solved in closed form
pub struct ConstantProductPool<'a> {
    params: &'a ConstantProductParams,
    decimals: &'a [TokenDecimals],
    config: &'a EngineConfig,
}

impl<'a> ConstantProductPool<'a> {
    pub fn new(
        params: &'a ConstantProductParams,
        decimals: &'a [TokenDecimals],
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            params,
            decimals,
            config,
        }
    }

    fn human_reserves(&self, pair: PairId) -> AmmResult<(Decimal, Decimal)> {
        AmmError::check_pair(pair.from, pair.to, self.params.reserves.len())?;
        check_reserves(&self.params.reserves, pair)?;
        Ok((
            raw_to_decimal(&self.params.reserves[pair.from], self.decimals[pair.from])?,
            raw_to_decimal(&self.params.reserves[pair.to], self.decimals[pair.to])?,
        ))
    }
}

impl LiquidityPool for ConstantProductPool<'_> {
    fn kind(&self) -> &'static str {
        "constant_product"
    }

    fn spot_price(&self, pair: PairId) -> AmmResult<Decimal> {
        let (from, to) = self.human_reserves(pair)?;
        V2Math::price(from, to)
    }

    fn slippage_map(&self, pair: PairId, range: &BpsRange) -> AmmResult<SlippageMap> {
        let (from, to) = self.human_reserves(pair)?;
        V2Math::slippage_map(from, to, range, self.config.slippage.measure)
    }
}

/// Curve StableSwap pool, searched over wad reserves
pub struct StableSwapPool<'a> {
    params: &'a StableSwapParams,
    decimals: &'a [TokenDecimals],
    config: &'a EngineConfig,
}

impl<'a> StableSwapPool<'a> {
    pub fn new(
        params: &'a StableSwapParams,
        decimals: &'a [TokenDecimals],
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            params,
            decimals,
            config,
        }
    }

    fn wad_reserves(&self) -> Vec<BigUint> {
        self.params
            .reserves
            .iter()
            .zip(self.decimals)
            .map(|(reserve, decimals)| to_wad(reserve, *decimals))
            .collect()
    }

    /// LP token value in the pool's normalized unit, when the supply is known
    pub fn virtual_price(&self) -> AmmResult<Option<Decimal>> {
        let Some(lp_supply) = &self.params.lp_supply else {
            return Ok(None);
        };
        let price =
            StableMath::virtual_price(&self.wad_reserves(), self.params.amplification, lp_supply)?;
        wad_to_decimal(&price).map(Some)
    }

    fn with_search<T>(
        &self,
        pair: PairId,
        f: impl FnOnce(&SlippageSearch<'_, StablePricer>) -> AmmResult<T>,
    ) -> AmmResult<T> {
        let reserves = self.wad_reserves();
        AmmError::check_pair(pair.from, pair.to, reserves.len())?;
        check_reserves(&reserves, pair)?;
        let pricer = StablePricer::new(self.params.amplification);
        let probe = decimal_to_wad(self.config.slippage.probe_tokens)?;
        let search = SlippageSearch::new(
            &pricer,
            &reserves,
            pair,
            probe,
            self.config.slippage.measure,
            limits(self.config),
        )?;
        f(&search)
    }
}

impl LiquidityPool for StableSwapPool<'_> {
    fn kind(&self) -> &'static str {
        "stable_swap"
    }

    fn spot_price(&self, pair: PairId) -> AmmResult<Decimal> {
        let spot = self.with_search(pair, |search| search.spot_price())?;
        wad_to_decimal(&spot)
    }

    fn slippage_map(&self, pair: PairId, range: &BpsRange) -> AmmResult<SlippageMap> {
        let outcomes = self.with_search(pair, |search| search.run(range))?;
        outcomes
            .into_iter()
            .map(|(bps, SearchOutcome { base, quote, .. })| {
                Ok((
                    bps,
                    SlippageEntry::new(wad_to_decimal(&base)?, wad_to_decimal(&quote)?),
                ))
            })
            .collect()
    }
}

/// CryptoSwap pool, searched over native-unit reserves
pub struct CryptoSwapPool<'a> {
    params: &'a CryptoSwapParams,
    decimals: &'a [TokenDecimals],
    config: &'a EngineConfig,
}

impl<'a> CryptoSwapPool<'a> {
    pub fn new(
        params: &'a CryptoSwapParams,
        decimals: &'a [TokenDecimals],
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            params,
            decimals,
            config,
        }
    }

    fn with_search<T>(
        &self,
        pair: PairId,
        f: impl FnOnce(&SlippageSearch<'_, CryptoCurve<'_>>) -> AmmResult<T>,
    ) -> AmmResult<T> {
        let reserves = &self.params.reserves;
        AmmError::check_pair(pair.from, pair.to, reserves.len())?;
        check_reserves(reserves, pair)?;
        let curve = CryptoCurve::from_params(self.params);
        let probe = decimal_to_raw(self.config.slippage.probe_tokens, self.decimals[pair.from])?;
        let search = SlippageSearch::new(
            &curve,
            reserves,
            pair,
            probe,
            self.config.slippage.measure,
            limits(self.config),
        )?;
        f(&search)
    }
}

impl LiquidityPool for CryptoSwapPool<'_> {
    fn kind(&self) -> &'static str {
        "crypto_swap"
    }

    fn spot_price(&self, pair: PairId) -> AmmResult<Decimal> {
        let spot = self.with_search(pair, |search| search.spot_price())?;
        // out/in in native units, lifted to human scale
        let from = self.decimals[pair.from].get() as u32;
        let to = self.decimals[pair.to].get() as u32;
        scaled_to_decimal(&(spot * pow10(from)), PRICE_SCALE_DECIMALS + to)
    }

    fn slippage_map(&self, pair: PairId, range: &BpsRange) -> AmmResult<SlippageMap> {
        let outcomes = self.with_search(pair, |search| search.run(range))?;
        let (from, to) = (self.decimals[pair.from], self.decimals[pair.to]);
        outcomes
            .into_iter()
            .map(|(bps, SearchOutcome { base, quote, .. })| {
                Ok((
                    bps,
                    SlippageEntry::new(raw_to_decimal(&base, from)?, raw_to_decimal(&quote, to)?),
                ))
            })
            .collect()
    }
}

/// Uniswap-V3-style pool, walked tick by tick
pub struct ConcentratedPool<'a> {
    params: &'a ConcentratedParams,
    decimals: &'a [TokenDecimals],
    config: &'a EngineConfig,
}

impl<'a> ConcentratedPool<'a> {
    pub fn new(
        params: &'a ConcentratedParams,
        decimals: &'a [TokenDecimals],
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            params,
            decimals,
            config,
        }
    }
}

impl LiquidityPool for ConcentratedPool<'_> {
    fn kind(&self) -> &'static str {
        "concentrated"
    }

    fn spot_price(&self, pair: PairId) -> AmmResult<Decimal> {
        AmmError::check_pair(pair.from, pair.to, 2)?;
        V3Math::spot_price(
            &self.params.sqrt_price_x96,
            self.decimals[0],
            self.decimals[1],
            pair.from == 0,
        )
    }

    /// Whole-percent rows only: threshold `100 * k` carries row `k`
    fn slippage_map(&self, pair: PairId, range: &BpsRange) -> AmmResult<SlippageMap> {
        AmmError::check_pair(pair.from, pair.to, 2)?;
        range.validate()?;

        let settings = &self.config.concentrated;
        let wanted: Vec<u32> = range
            .iter()
            .filter(|bps| bps % 100 == 0 && bps / 100 <= settings.max_percent)
            .collect();
        let Some(deepest) = wanted.last().map(|bps| bps / 100) else {
            return Ok(SlippageMap::new());
        };

        let pool = V3PoolState::from_params(self.params)?;
        let rows = pool.tick_slippage_table(pair.from == 0, deepest, settings.ticks_per_percent)?;

        let (from, to) = (self.decimals[pair.from], self.decimals[pair.to]);
        rows.into_iter()
            .filter(|row| wanted.contains(&(row.percent * 100)))
            .map(|row| {
                Ok((
                    row.percent * 100,
                    SlippageEntry::new(
                        raw_to_decimal(&row.amount_in, from)?,
                        raw_to_decimal(&row.amount_out, to)?,
                    ),
                ))
            })
            .collect()
    }
}
