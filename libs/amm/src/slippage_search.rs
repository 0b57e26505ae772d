//! Bounded bisection over trade size
//!
//! Inverts any reserve pricing function: for a target price, find the largest
//! input whose measured price has not yet fallen below it. Prices are exact
//! integers scaled by 10^18 (`out * 10^18 / in`), so the search never touches
//! floating point.

use crate::pool_traits::ReservePricer;
use config::SearchSettings;
use num_bigint::BigUint;
use num_traits::{CheckedSub, Zero};
use tracing::{debug, trace};
use types::precision::pow10;
use types::{AmmError, AmmResult, BpsRange, PairId, PriceMeasure};

/// Fixed-point scale of search prices
pub const PRICE_SCALE_DECIMALS: u32 = 18;

/// Iteration cap and closing tolerance for one bracket search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub max_iterations: usize,
    /// Bracket closes once `high - low < low * tolerance_bps / 10000`
    pub tolerance_bps: u32,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_iterations: 256,
            tolerance_bps: 10,
        }
    }
}

impl From<&SearchSettings> for SearchLimits {
    fn from(settings: &SearchSettings) -> Self {
        Self {
            max_iterations: settings.max_iterations,
            tolerance_bps: settings.bracket_tolerance_bps,
        }
    }
}

/// Converged trade size, in the pricer's units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub base: BigUint,
    pub quote: BigUint,
    /// Pricing evaluations spent
    pub iterations: usize,
}

/// One bracketed endpoint: input tried and the output it produced
#[derive(Debug, Clone)]
struct Bracket {
    qty: BigUint,
    out: BigUint,
}

/// Bisection driver bound to one pool, one direction and one price measure
pub struct SlippageSearch<'a, P: ReservePricer + ?Sized> {
    pricer: &'a P,
    reserves: &'a [BigUint],
    pair: PairId,
    probe: BigUint,
    measure: PriceMeasure,
    limits: SearchLimits,
}

impl<'a, P: ReservePricer + ?Sized> SlippageSearch<'a, P> {
    pub fn new(
        pricer: &'a P,
        reserves: &'a [BigUint],
        pair: PairId,
        probe: BigUint,
        measure: PriceMeasure,
        limits: SearchLimits,
    ) -> AmmResult<Self> {
        AmmError::check_pair(pair.from, pair.to, reserves.len())?;
        if probe.is_zero() {
            return Err(AmmError::invalid_parameter("probe", "must be positive"));
        }
        if limits.max_iterations == 0 {
            return Err(AmmError::invalid_parameter(
                "max_iterations",
                "must be positive",
            ));
        }
        if !(1..10_000).contains(&limits.tolerance_bps) {
            return Err(AmmError::invalid_parameter(
                "tolerance_bps",
                format!("must be in 1..10000, got {}", limits.tolerance_bps),
            ));
        }
        Ok(Self {
            pricer,
            reserves,
            pair,
            probe,
            measure,
            limits,
        })
    }

    fn quote(&self, qty: &BigUint, reserves: &[BigUint]) -> AmmResult<BigUint> {
        self.pricer
            .amount_out(self.pair.from, self.pair.to, qty, reserves)
    }

    /// Pre-trade price of the probe, scaled by 10^18
    pub fn spot_price(&self) -> AmmResult<BigUint> {
        let out = self.quote(&self.probe, self.reserves)?;
        Ok(out * pow10(PRICE_SCALE_DECIMALS) / &self.probe)
    }

    /// Price for the trade `qty -> out` under the configured measure.
    /// `None` when the price is undefined (a zero-size average trade).
    fn measured_price(&self, qty: &BigUint, out: &BigUint) -> AmmResult<Option<BigUint>> {
        match self.measure {
            PriceMeasure::Average => {
                if qty.is_zero() {
                    return Ok(None);
                }
                Ok(Some(out * pow10(PRICE_SCALE_DECIMALS) / qty))
            }
            PriceMeasure::Marginal => {
                let (i, j) = (self.pair.from, self.pair.to);
                let mut post_trade = self.reserves.to_vec();
                post_trade[i] += qty;
                match post_trade[j].checked_sub(out) {
                    Some(remaining) if !remaining.is_zero() => post_trade[j] = remaining,
                    _ => return Ok(Some(BigUint::zero())),
                }
                let probe_out = self.quote(&self.probe, &post_trade)?;
                Ok(Some(probe_out * pow10(PRICE_SCALE_DECIMALS) / &self.probe))
            }
        }
    }

    fn is_closed(&self, low: &Bracket, high: &Bracket) -> bool {
        if low.qty.is_zero() || high.qty < low.qty {
            return false;
        }
        (&high.qty - &low.qty) * 10_000u32 < &low.qty * self.limits.tolerance_bps
    }

    /// Largest input whose measured price stays above `target`, starting the
    /// bracket at `2 * seed`
    pub fn liquidity_for_target_price(
        &self,
        seed: &BigUint,
        target: &BigUint,
    ) -> AmmResult<SearchOutcome> {
        let mut low: Option<Bracket> = None;
        let mut high: Option<Bracket> = None;
        let mut qty = seed * 2u32;

        for iteration in 1..=self.limits.max_iterations {
            let out = self.quote(&qty, self.reserves)?;
            let price = self.measured_price(&qty, &out)?;
            let above = price.as_ref().map_or(true, |p| p > target);
            trace!(
                iteration,
                qty = %qty,
                price = ?price.as_ref().map(ToString::to_string),
                above,
                "Bisection step"
            );

            let tried = Bracket {
                qty: qty.clone(),
                out,
            };
            if above {
                qty = match &high {
                    None => &qty * 2u32,
                    Some(h) => (&qty + &h.qty) / 2u32,
                };
                low = Some(tried);
            } else {
                qty = match &low {
                    None => &qty / 2u32,
                    Some(l) => (&l.qty + &qty) / 2u32,
                };
                high = Some(tried);
            }

            if let (Some(l), Some(h)) = (&low, &high) {
                if self.is_closed(l, h) {
                    return Ok(SearchOutcome {
                        base: (&l.qty + &h.qty) / 2u32,
                        quote: (&l.out + &h.out) / 2u32,
                        iterations: iteration,
                    });
                }
            }
        }

        Err(AmmError::NoConvergence {
            iterations: self.limits.max_iterations,
            low: low.map_or_else(|| "unset".to_string(), |b| b.qty.to_string()),
            high: high.map_or_else(|| "unset".to_string(), |b| b.qty.to_string()),
        })
    }

    /// One search per threshold, tightest first. The first step seeds with the
    /// probe, later steps with the previous step's base.
    pub fn run(&self, range: &BpsRange) -> AmmResult<Vec<(u32, SearchOutcome)>> {
        range.validate()?;
        let spot = self.spot_price()?;
        debug!(spot = %spot, pair = ?self.pair, measure = ?self.measure, "Searching slippage thresholds");

        let mut seed = self.probe.clone();
        let mut outcomes = Vec::with_capacity(range.len());
        for bps in range.iter() {
            let target = &spot * (10_000 - bps) / 10_000u32;
            let outcome = self.liquidity_for_target_price(&seed, &target)?;
            trace!(bps, base = %outcome.base, iterations = outcome.iterations, "Threshold solved");
            seed = outcome.base.clone();
            outcomes.push((bps, outcome));
        }
        Ok(outcomes)
    }
}
