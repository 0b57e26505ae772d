//! Liquidity engine façade
//!
//! Resolves a [`PoolSnapshot`] to its [`LiquidityPool`] adapter once per call
//! and enforces the slippage map contract on the way out. Holds only
//! configuration, so one engine can be shared across threads.

use crate::pivot::PivotAggregator;
use crate::pool_traits::LiquidityPool;
use crate::pools::{ConcentratedPool, ConstantProductPool, CryptoSwapPool, StableSwapPool};
use config::EngineConfig;
use rust_decimal::Decimal;
use tracing::{debug, warn};
use types::{
    AmmError, AmmResult, BpsRange, PairId, PoolKind, PoolSnapshot, PriceQuote, SlippageMap,
    TokenDecimals,
};

/// Build a pool's slippage map, rejecting it if depth ever shrinks as the
/// threshold loosens
fn monotonic_slippage_map<P: LiquidityPool + ?Sized>(
    pool: &P,
    pair: PairId,
    range: &BpsRange,
) -> AmmResult<SlippageMap> {
    let map = pool.slippage_map(pair, range)?;
    if let Err(err) = map.check_monotonic() {
        warn!(pool = pool.kind(), ?pair, %err, "Slippage map is not monotonic");
        return Err(err);
    }
    debug!(
        pool = pool.kind(),
        ?pair,
        entries = map.len(),
        "Slippage map built"
    );
    Ok(map)
}

/// Price and depth queries over pool snapshots
#[derive(Debug, Clone, Default)]
pub struct LiquidityEngine {
    config: EngineConfig,
}

impl LiquidityEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn with_pool<T>(
        &self,
        snapshot: &PoolSnapshot,
        f: impl FnOnce(&dyn LiquidityPool) -> AmmResult<T>,
    ) -> AmmResult<T> {
        let decimals: Vec<TokenDecimals> = snapshot.decimals();
        match snapshot.kind() {
            PoolKind::ConstantProduct(params) => {
                f(&ConstantProductPool::new(params, &decimals, &self.config))
            }
            PoolKind::StableSwap(params) => {
                f(&StableSwapPool::new(params, &decimals, &self.config))
            }
            PoolKind::CryptoSwap(params) => {
                f(&CryptoSwapPool::new(params, &decimals, &self.config))
            }
            PoolKind::Concentrated(params) => {
                f(&ConcentratedPool::new(params, &decimals, &self.config))
            }
        }
    }

    /// Spot price of one `pair.from` token in `pair.to` tokens
    pub fn price(&self, pair: PairId, snapshot: &PoolSnapshot) -> AmmResult<PriceQuote> {
        snapshot.check_pair(pair)?;
        let price = self.with_pool(snapshot, |pool| {
            let price = pool.spot_price(pair)?;
            debug!(pool = pool.kind(), ?pair, %price, "Spot price computed");
            Ok(price)
        })?;

        let tokens = snapshot.tokens();
        Ok(PriceQuote {
            from: tokens[pair.from].symbol.clone(),
            to: tokens[pair.to].symbol.clone(),
            price,
        })
    }

    /// Trade sizes per slippage threshold in `range` for selling `pair.from`.
    ///
    /// Fails with `NonMonotonicSlippage` if a looser threshold yields a smaller
    /// trade than a tighter one.
    pub fn slippage_map(
        &self,
        pair: PairId,
        snapshot: &PoolSnapshot,
        range: BpsRange,
    ) -> AmmResult<SlippageMap> {
        snapshot.check_pair(pair)?;
        range.validate()?;

        self.with_pool(snapshot, |pool| monotonic_slippage_map(pool, pair, &range))
    }

    /// [`Self::slippage_map`] over the configured threshold grid
    pub fn configured_slippage_map(
        &self,
        pair: PairId,
        snapshot: &PoolSnapshot,
    ) -> AmmResult<SlippageMap> {
        self.slippage_map(pair, snapshot, self.config.slippage.bps_range())
    }

    /// Slippage maps for independent snapshots over the configured grid.
    /// Each result stands alone; one failing pool does not abort the rest.
    pub fn slippage_maps(
        &self,
        requests: &[(PairId, &PoolSnapshot)],
    ) -> Vec<AmmResult<SlippageMap>> {
        requests
            .iter()
            .map(|(pair, snapshot)| self.configured_slippage_map(*pair, snapshot))
            .collect()
    }

    /// Base amount reachable through a pivot asset within `target_bps`
    pub fn combine_pivot(
        &self,
        segment1: &SlippageMap,
        segment1_price: Decimal,
        segment2: &SlippageMap,
        target_bps: u32,
    ) -> Decimal {
        PivotAggregator::combine(segment1, segment1_price, segment2, target_bps)
    }

    /// StableSwap LP token value; `None` when the snapshot has no LP supply
    pub fn virtual_price(&self, snapshot: &PoolSnapshot) -> AmmResult<Option<Decimal>> {
        let PoolKind::StableSwap(params) = snapshot.kind() else {
            return Err(AmmError::invalid_parameter(
                "kind",
                format!("virtual price needs a stable_swap pool, got {}", snapshot.kind().name()),
            ));
        };
        let decimals = snapshot.decimals();
        StableSwapPool::new(params, &decimals, &self.config).virtual_price()
    }
}
