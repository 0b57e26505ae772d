//! Curve StableSwap invariant solvers
//!
//! All values are 18-decimal fixed-point integers. `Ann = A * n^n`, and both
//! Newton loops stop once successive iterates differ by at most one unit.

use num_bigint::BigUint;
use num_traits::{CheckedSub, One, Zero};
use tracing::debug;
use types::precision::pow10;
use types::{AmmError, AmmResult};

/// Newton iteration cap for both D and y
pub const MAX_NEWTON_ITERATIONS: usize = 255;

/// Largest pool size the solvers accept
pub const MAX_COINS: usize = 8;

fn abs_diff(a: &BigUint, b: &BigUint) -> BigUint {
    if a > b {
        a - b
    } else {
        b - a
    }
}

/// StableSwap math over normalized reserves
pub struct StableMath;

impl StableMath {
    fn ann(amplification: u64, n: usize) -> AmmResult<BigUint> {
        if amplification == 0 {
            return Err(AmmError::invalid_parameter("amplification", "must be >= 1"));
        }
        if !(2..=MAX_COINS).contains(&n) {
            return Err(AmmError::invalid_parameter(
                "reserves",
                format!("pool size {n} outside 2..={MAX_COINS}"),
            ));
        }
        Ok(BigUint::from(amplification) * BigUint::from(n).pow(n as u32))
    }

    fn check_reserves(reserves: &[BigUint]) -> AmmResult<()> {
        match reserves.iter().position(Zero::is_zero) {
            Some(index) => Err(AmmError::ZeroReserve { index }),
            None => Ok(()),
        }
    }

    /// Invariant D for `reserves` at amplification `A`
    pub fn compute_d(reserves: &[BigUint], amplification: u64) -> AmmResult<BigUint> {
        let n = reserves.len();
        let ann = Self::ann(amplification, n)?;
        Self::check_reserves(reserves)?;

        let n_big = BigUint::from(n);
        let sum: BigUint = reserves.iter().sum();
        let mut d = sum.clone();

        for iteration in 0..MAX_NEWTON_ITERATIONS {
            let mut d_p = d.clone();
            for x in reserves {
                d_p = d_p * &d / (x * &n_big);
            }
            let d_prev = d.clone();

            let numerator = (&ann * &sum + &d_p * &n_big) * &d;
            let denominator = (&ann - 1u32) * &d + (&n_big + 1u32) * &d_p;
            d = numerator / denominator;

            if abs_diff(&d, &d_prev) <= BigUint::one() {
                debug!(iterations = iteration + 1, "StableSwap D converged");
                return Ok(d);
            }
        }

        Err(AmmError::ConvergenceError {
            solver: "stable_d",
            iterations: MAX_NEWTON_ITERATIONS,
        })
    }

    /// Reserve of asset `j` after asset `i` is set to `x`, holding D fixed
    pub fn compute_y(
        i: usize,
        j: usize,
        x: &BigUint,
        reserves: &[BigUint],
        amplification: u64,
    ) -> AmmResult<BigUint> {
        let n = reserves.len();
        AmmError::check_pair(i, j, n)?;
        if x.is_zero() {
            return Err(AmmError::ZeroReserve { index: i });
        }

        let d = Self::compute_d(reserves, amplification)?;
        let ann = Self::ann(amplification, n)?;
        let n_big = BigUint::from(n);

        let mut c = d.clone();
        let mut sum = BigUint::zero();
        for (k, reserve) in reserves.iter().enumerate() {
            let value = if k == i {
                x
            } else if k != j {
                reserve
            } else {
                continue;
            };
            sum += value;
            c = c * &d / (value * &n_big);
        }
        c = c * &d / (&ann * &n_big);
        let b = sum + &d / &ann;

        let mut y = d.clone();
        for iteration in 0..MAX_NEWTON_ITERATIONS {
            let y_prev = y.clone();
            let denominator = (&y * 2u32 + &b)
                .checked_sub(&d)
                .filter(|v| !v.is_zero())
                .ok_or_else(|| AmmError::Overflow {
                    context: "StableSwap y denominator is not positive".to_string(),
                })?;
            y = (&y * &y + &c) / denominator;

            if abs_diff(&y, &y_prev) <= BigUint::one() {
                debug!(iterations = iteration + 1, "StableSwap y converged");
                return Ok(y);
            }
        }

        Err(AmmError::ConvergenceError {
            solver: "stable_y",
            iterations: MAX_NEWTON_ITERATIONS,
        })
    }

    /// Amount of asset `j` received for selling `dx` of asset `i`
    pub fn get_return(
        i: usize,
        j: usize,
        dx: &BigUint,
        reserves: &[BigUint],
        amplification: u64,
    ) -> AmmResult<BigUint> {
        AmmError::check_pair(i, j, reserves.len())?;
        let x = &reserves[i] + dx;
        let y = Self::compute_y(i, j, &x, reserves, amplification)?;
        Ok(reserves[j].checked_sub(&y).unwrap_or_default())
    }

    /// LP token value: `D * 10^18 / lp_supply`
    pub fn virtual_price(
        reserves: &[BigUint],
        amplification: u64,
        lp_supply: &BigUint,
    ) -> AmmResult<BigUint> {
        if lp_supply.is_zero() {
            return Err(AmmError::invalid_parameter("lp_supply", "is zero"));
        }
        let d = Self::compute_d(reserves, amplification)?;
        Ok(d * pow10(18) / lp_supply)
    }
}
