//! Uniswap V2 AMM math with exact calculations
//!
//! Preserves full precision using Decimal type. The constant-product curve
//! inverts analytically, so slippage sizes come from closed forms and need no
//! search.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;
use types::{AmmError, AmmResult, BpsRange, PriceMeasure, SlippageEntry, SlippageMap};

/// Newton steps allowed before `decimal_sqrt` reports non-convergence
const SQRT_MAX_ITERATIONS: usize = 100;

/// Step size, relative to the iterate, at which the root is accepted (1e-24)
const SQRT_RELATIVE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 24);

/// V2 AMM math functions with zero precision loss
pub struct V2Math;

fn overflow(context: &str) -> AmmError {
    AmmError::Overflow {
        context: context.to_string(),
    }
}

fn check_fraction(slippage: Decimal) -> AmmResult<()> {
    if slippage < Decimal::ZERO || slippage >= Decimal::ONE {
        return Err(AmmError::invalid_parameter(
            "slippage",
            format!("fraction must be in [0, 1), got {slippage}"),
        ));
    }
    Ok(())
}

impl V2Math {
    /// Spot price of one `from` token in `to` tokens
    pub fn price(from_reserve: Decimal, to_reserve: Decimal) -> AmmResult<Decimal> {
        if from_reserve <= Decimal::ZERO {
            return Err(AmmError::ZeroReserve { index: 0 });
        }
        to_reserve
            .checked_div(from_reserve)
            .ok_or_else(|| overflow("price"))
    }

    /// Largest input whose average execution price stays within `slippage` of
    /// spot: `to / ((1 - s) * price) - from`
    pub fn liquidity_for_slippage(
        from_reserve: Decimal,
        to_reserve: Decimal,
        slippage: Decimal,
    ) -> AmmResult<Decimal> {
        check_fraction(slippage)?;
        let price = Self::price(from_reserve, to_reserve)?;
        if price.is_zero() {
            return Err(AmmError::ZeroReserve { index: 1 });
        }

        let degraded = (Decimal::ONE - slippage) * price;
        let amount_in = to_reserve
            .checked_div(degraded)
            .ok_or_else(|| overflow("liquidity for slippage"))?
            - from_reserve;
        Ok(amount_in.max(Decimal::ZERO))
    }

    /// Largest input after which the marginal price stays within `slippage`
    /// of spot: `from * (1 / sqrt(1 - s) - 1)`
    pub fn liquidity_for_marginal_slippage(
        from_reserve: Decimal,
        to_reserve: Decimal,
        slippage: Decimal,
    ) -> AmmResult<Decimal> {
        check_fraction(slippage)?;
        Self::price(from_reserve, to_reserve)?;

        let root = Self::decimal_sqrt(Decimal::ONE - slippage)?;
        let growth = Decimal::ONE
            .checked_div(root)
            .ok_or_else(|| overflow("marginal slippage"))?
            - Decimal::ONE;
        from_reserve
            .checked_mul(growth)
            .map(|amount| amount.max(Decimal::ZERO))
            .ok_or_else(|| overflow("marginal slippage"))
    }

    /// Calculate exact output amount for Uniswap V2 using x*y=k formula
    ///
    /// # Arguments
    /// * `amount_in` - Input token amount (in token decimals)
    /// * `reserve_in` - Input token reserve (in token decimals)
    /// * `reserve_out` - Output token reserve (in token decimals)
    /// * `fee_bps` - Fee in basis points (30 = 0.3%)
    ///
    /// # Returns
    /// Exact output amount after fees and slippage
    pub fn calculate_output_amount(
        amount_in: Decimal,
        reserve_in: Decimal,
        reserve_out: Decimal,
        fee_bps: u32,
    ) -> AmmResult<Decimal> {
        // Validate inputs
        if amount_in < dec!(0) {
            return Err(AmmError::InvalidAmount {
                value: amount_in.to_string(),
            });
        }
        if reserve_in <= dec!(0) {
            return Err(AmmError::ZeroReserve { index: 0 });
        }
        if reserve_out <= dec!(0) {
            return Err(AmmError::ZeroReserve { index: 1 });
        }
        if fee_bps >= 10_000 {
            return Err(AmmError::invalid_parameter(
                "fee_bps",
                format!("must be below 10000, got {fee_bps}"),
            ));
        }

        // Apply fee: amount_in_after_fee = amount_in * (10000 - fee_bps) / 10000
        let fee_multiplier = Decimal::from(10_000 - fee_bps) / dec!(10000);
        let amount_in_after_fee = amount_in * fee_multiplier;

        // x*y=k formula: output = (amount_in_after_fee * reserve_out) / (reserve_in + amount_in_after_fee)
        let numerator = amount_in_after_fee
            .checked_mul(reserve_out)
            .ok_or_else(|| overflow("output amount"))?;
        let denominator = reserve_in + amount_in_after_fee;

        numerator
            .checked_div(denominator)
            .ok_or_else(|| overflow("output amount"))
    }

    /// Closed-form slippage map, no fee applied
    pub fn slippage_map(
        from_reserve: Decimal,
        to_reserve: Decimal,
        range: &BpsRange,
        measure: PriceMeasure,
    ) -> AmmResult<SlippageMap> {
        range.validate()?;
        let mut map = SlippageMap::new();
        for bps in range.iter() {
            let slippage = Decimal::new(bps as i64, 4);
            let base = match measure {
                PriceMeasure::Average => {
                    Self::liquidity_for_slippage(from_reserve, to_reserve, slippage)?
                }
                PriceMeasure::Marginal => {
                    Self::liquidity_for_marginal_slippage(from_reserve, to_reserve, slippage)?
                }
            };
            let quote = Self::calculate_output_amount(base, from_reserve, to_reserve, 0)?;
            map.insert(bps, SlippageEntry::new(base, quote));
        }
        debug!(entries = map.len(), ?measure, "Constant-product slippage map built");
        Ok(map)
    }

    /// Calculate square root of a Decimal using Newton's method
    /// Maintains precision for large numbers
    pub fn decimal_sqrt(value: Decimal) -> AmmResult<Decimal> {
        Self::newton_sqrt(value, SQRT_MAX_ITERATIONS)
    }

    fn newton_sqrt(value: Decimal, max_iterations: usize) -> AmmResult<Decimal> {
        if value < dec!(0) {
            return Err(AmmError::invalid_parameter(
                "value",
                "cannot take the square root of a negative number",
            ));
        }
        if value == dec!(0) {
            return Ok(dec!(0));
        }

        // Initial guess
        let mut x = if value > dec!(1) { value } else { dec!(1) };

        // x_new = x/2 + (value/x)/2, halved term by term so the sum stays in range
        for _ in 0..max_iterations {
            let quotient = value.checked_div(x).ok_or_else(|| overflow("square root"))?;
            let next_x = (x / dec!(2))
                .checked_add(quotient / dec!(2))
                .ok_or_else(|| overflow("square root"))?;

            // relative step, floored at one unit of the last representable digit
            let tolerance = next_x * SQRT_RELATIVE_TOLERANCE + Decimal::new(1, 28);
            if (next_x - x).abs() <= tolerance {
                return Ok(next_x);
            }
            x = next_x;
        }

        Err(AmmError::ConvergenceError {
            solver: "decimal_sqrt",
            iterations: max_iterations,
        })
    }
}
