//! CryptoSwap (A, gamma) invariant solver
//!
//! Integer division is not associative, so every product and quotient below
//! keeps the exact ordering of the on-chain implementation. Range assertions the
//! pool contract enforces on A, gamma and y are deliberately absent: during
//! slippage bisection an extreme trade degrades to a small output rather than
//! aborting the whole map.

use num_bigint::BigUint;
use num_traits::{CheckedSub, Zero};
use tracing::debug;
use types::precision::pow10;
use types::{AmmError, AmmResult, CryptoSwapParams};

use crate::stable_math::MAX_NEWTON_ITERATIONS;

/// Scale of the pool-reported `A` on top of `A * N^N`
pub const A_MULTIPLIER: u64 = 10_000;

fn precision() -> BigUint {
    pow10(18)
}

fn abs_diff(a: &BigUint, b: &BigUint) -> BigUint {
    if a > b {
        a - b
    } else {
        b - a
    }
}

fn nonzero<'b>(value: &'b BigUint, what: &'static str) -> AmmResult<&'b BigUint> {
    if value.is_zero() {
        Err(AmmError::invalid_parameter(what, "division by zero"))
    } else {
        Ok(value)
    }
}

/// Borrowed view of the pool parameters the invariant needs
#[derive(Debug, Clone, Copy)]
pub struct CryptoCurve<'a> {
    pub ann: &'a BigUint,
    pub gamma: &'a BigUint,
    pub d: &'a BigUint,
    pub price_scale: &'a [BigUint],
    pub precisions: &'a [BigUint],
}

impl<'a> CryptoCurve<'a> {
    pub fn from_params(params: &'a CryptoSwapParams) -> Self {
        Self {
            ann: &params.ann,
            gamma: &params.gamma,
            d: &params.d,
            price_scale: &params.price_scale,
            precisions: &params.precisions,
        }
    }

    /// Post-trade balance of asset `i` given the other scaled balances in `x`
    pub fn newton_y(&self, x: &[BigUint], i: usize) -> AmmResult<BigUint> {
        let n = x.len();
        if n < 2 || i >= n {
            return Err(AmmError::InvalidIndex { i, j: i, len: n });
        }
        let ann = nonzero(self.ann, "ann")?;
        let gamma = nonzero(self.gamma, "gamma")?;
        let d = nonzero(self.d, "d")?;

        let p = precision();
        let n_big = BigUint::from(n);
        let a_multiplier = BigUint::from(A_MULTIPLIER);
        let limit = pow10(14);

        let mut y = d / &n_big;
        let mut k0_i = p.clone();
        let mut s_i = BigUint::zero();

        // Working copy: the caller's balances are never reordered
        let mut x_sorted = x.to_vec();
        x_sorted[i] = BigUint::zero();
        x_sorted.sort_unstable_by(|a, b| b.cmp(a));

        let convergence_limit = (&x_sorted[0] / &limit)
            .max(d / &limit)
            .max(BigUint::from(100u32));

        for j in 2..=n {
            let x_j = nonzero(&x_sorted[n - j], "reserves")?;
            y = y * d / (x_j * &n_big);
            s_i += x_j;
        }
        for x_j in x_sorted.iter().take(n - 1) {
            k0_i = k0_i * x_j * &n_big / d;
        }

        let gamma_plus_one = gamma + &p;
        for iteration in 0..MAX_NEWTON_ITERATIONS {
            let y_prev = y.clone();

            let k0 = &k0_i * &y * &n_big / d;
            let s = &s_i + &y;

            let g1k0 = if gamma_plus_one > k0 {
                &gamma_plus_one - &k0 + 1u32
            } else {
                &k0 - &gamma_plus_one + 1u32
            };

            let mul1 = &p * d / gamma * &g1k0 / gamma * &g1k0 * &a_multiplier / ann;
            let mul2 = &p + &p * 2u32 * &k0 / &g1k0;

            let yfprime = &p * &y + &s * &mul2 + &mul1;
            let dyfprime = d * &mul2;
            let Some(yfprime) = yfprime.checked_sub(&dyfprime) else {
                y = y_prev / 2u32;
                continue;
            };

            let fprime = &yfprime / nonzero(&y, "y")?;
            let fprime = nonzero(&fprime, "fprime")?;
            let mut y_minus = &mul1 / fprime;
            let y_plus = (&yfprime + &p * d) / fprime + &y_minus * &p / nonzero(&k0, "k0")?;
            y_minus += &p * &s / fprime;

            y = match y_plus.checked_sub(&y_minus) {
                Some(next) => next,
                None => &y_prev / 2u32,
            };

            let bound = (&y / &limit).max(convergence_limit.clone());
            if abs_diff(&y, &y_prev) < bound {
                debug!(iterations = iteration + 1, "CryptoSwap y converged");
                return Ok(y);
            }
        }

        Err(AmmError::ConvergenceError {
            solver: "crypto_newton_y",
            iterations: MAX_NEWTON_ITERATIONS,
        })
    }

    /// Native-unit output for selling `dx` native units of asset `i` for `j`
    pub fn get_dy(
        &self,
        i: usize,
        j: usize,
        dx: &BigUint,
        reserves: &[BigUint],
    ) -> AmmResult<BigUint> {
        let n = reserves.len();
        AmmError::check_pair(i, j, n)?;
        if self.price_scale.len() + 1 != n {
            return Err(AmmError::ReserveLengthMismatch {
                tokens: n,
                reserves: self.price_scale.len(),
                what: "price scales",
            });
        }
        if self.precisions.len() != n {
            return Err(AmmError::ReserveLengthMismatch {
                tokens: n,
                reserves: self.precisions.len(),
                what: "precisions",
            });
        }

        let p = precision();
        let mut xp = reserves.to_vec();
        xp[i] += dx;
        xp[0] *= &self.precisions[0];
        for k in 0..n - 1 {
            xp[k + 1] = &xp[k + 1] * &self.price_scale[k] * &self.precisions[k + 1] / &p;
        }

        let y = self.newton_y(&xp, j)?;
        let Some(mut dy) = xp[j].checked_sub(&(y + 1u32)) else {
            return Ok(BigUint::zero());
        };
        if j > 0 {
            dy = dy * &p / nonzero(&self.price_scale[j - 1], "price_scale")?;
        }
        Ok(dy / nonzero(&self.precisions[j], "precisions")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(v: u128) -> BigUint {
        BigUint::from(v)
    }

    fn tricrypto() -> CryptoSwapParams {
        CryptoSwapParams {
            reserves: vec![
                big(50_000_000 * 10u128.pow(6)),
                big(1_000 * 10u128.pow(8)),
                big(20_000 * 10u128.pow(18)),
            ],
            ann: big(5_400_000),
            gamma: big(20_000_000_000_000),
            d: big(150_000_000 * 10u128.pow(18)),
            price_scale: vec![big(50_000 * 10u128.pow(18)), big(2_500 * 10u128.pow(18))],
            precisions: vec![big(10u128.pow(12)), big(10u128.pow(10)), big(1)],
        }
    }

    #[test]
    fn test_newton_y_reference_value() {
        let params = tricrypto();
        let curve = CryptoCurve::from_params(&params);
        let xp = vec![
            big(51_000_000 * 10u128.pow(18)),
            big(50_000_000 * 10u128.pow(18)),
            big(50_000_000 * 10u128.pow(18)),
        ];
        let y = curve.newton_y(&xp, 1).unwrap();
        assert_eq!(y, "49008817013739447429073148".parse::<BigUint>().unwrap());
    }

    #[test]
    fn test_get_dy_reference_values() {
        let params = tricrypto();
        let curve = CryptoCurve::from_params(&params);
        let reserves = &params.reserves;

        let usdt_in = big(1_000_000 * 10u128.pow(6));
        assert_eq!(curve.get_dy(0, 1, &usdt_in, reserves).unwrap(), big(1_982_365_972));

        let btc_in = big(10 * 10u128.pow(8));
        assert_eq!(
            curve.get_dy(1, 2, &btc_in, reserves).unwrap(),
            big(199_728_984_815_460_373_480)
        );

        let eth_in = big(100 * 10u128.pow(18));
        assert_eq!(curve.get_dy(2, 0, &eth_in, reserves).unwrap(), big(249_966_789_306));
    }

    #[test]
    fn test_caller_reserves_untouched() {
        let params = tricrypto();
        let curve = CryptoCurve::from_params(&params);
        let before = params.reserves.clone();
        curve.get_dy(0, 2, &big(1_000_000), &params.reserves).unwrap();
        assert_eq!(params.reserves, before);
    }

    #[test]
    fn test_zero_gamma_rejected() {
        let mut params = tricrypto();
        params.gamma = BigUint::zero();
        let curve = CryptoCurve::from_params(&params);
        assert!(matches!(
            curve.get_dy(0, 1, &big(1_000_000), &params.reserves),
            Err(AmmError::InvalidParameter { name: "gamma", .. })
        ));
    }

    #[test]
    fn test_shape_mismatch() {
        let mut params = tricrypto();
        params.price_scale.pop();
        let curve = CryptoCurve::from_params(&params);
        assert!(matches!(
            curve.get_dy(0, 1, &big(1_000_000), &params.reserves),
            Err(AmmError::ReserveLengthMismatch { .. })
        ));
    }
}
