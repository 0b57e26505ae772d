//! Precision Handling for On-Chain Reserves
//!
//! Invariant math runs on 18-fractional-digit fixed-point integers ("wad").
//! Reserves arrive in each token's native integer unit and leave the engine as
//! human-scale [`Decimal`]s, so every boundary crossing goes through this module.
//!
//! ## Precision Rules
//!
//! 1. **Up-scaling is exact**: `raw * 10^(18 - decimals)` never loses digits
//! 2. **Down-scaling truncates**: matches on-chain integer division, never rounds
//! 3. **NO FLOATING POINT**: human-scale values are `Decimal`, never `f64`
//! 4. **Explicit Conversions**: raw, wad and human values never mix implicitly
//!
//! ## Example Usage
//!
//! ```rust
//! use num_bigint::BigUint;
//! use types::precision::{to_wad, wad_to_decimal, TokenDecimals};
//!
//! let usdc = TokenDecimals::new(6).unwrap();
//! let wad = to_wad(&BigUint::from(5_250_000u64), usdc); // 5.25 USDC
//! assert_eq!(wad_to_decimal(&wad).unwrap().to_string(), "5.25");
//! ```

use crate::common::{AmmError, AmmResult};
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fractional digits of the internal fixed-point domain
pub const WAD_DECIMALS: u8 = 18;

/// Largest native decimal count normalization accepts (working precision + 18)
pub const MAX_TOKEN_DECIMALS: u8 = 36;

/// Largest scale a `Decimal` can carry
const MAX_DECIMAL_SCALE: u32 = 28;

/// Largest mantissa a `Decimal` can carry (2^96 - 1)
const MAX_DECIMAL_MANTISSA: u128 = 79_228_162_514_264_337_593_543_950_335;

/// Validated native decimal count of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct TokenDecimals(u8);

impl TokenDecimals {
    /// 18-decimal tokens (WETH, DAI, most ERC-20s)
    pub const WAD: Self = Self(WAD_DECIMALS);

    pub fn new(decimals: i32) -> AmmResult<Self> {
        if !(0..=MAX_TOKEN_DECIMALS as i32).contains(&decimals) {
            return Err(AmmError::InvalidDecimals {
                decimals,
                max: MAX_TOKEN_DECIMALS,
            });
        }
        Ok(Self(decimals as u8))
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i32> for TokenDecimals {
    type Error = AmmError;

    fn try_from(value: i32) -> AmmResult<Self> {
        Self::new(value)
    }
}

impl From<TokenDecimals> for i32 {
    fn from(value: TokenDecimals) -> Self {
        value.0 as i32
    }
}

impl fmt::Display for TokenDecimals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 10^exp as a big integer
pub fn pow10(exp: u32) -> BigUint {
    BigUint::from(10u32).pow(exp)
}

/// Native units to wad. Exact for decimals <= 18, truncating above.
pub fn to_wad(raw: &BigUint, decimals: TokenDecimals) -> BigUint {
    let d = decimals.get();
    if d <= WAD_DECIMALS {
        raw * pow10((WAD_DECIMALS - d) as u32)
    } else {
        raw / pow10((d - WAD_DECIMALS) as u32)
    }
}

/// Wad to native units. Truncates for decimals < 18.
pub fn from_wad(wad: &BigUint, decimals: TokenDecimals) -> BigUint {
    let d = decimals.get();
    if d <= WAD_DECIMALS {
        wad / pow10((WAD_DECIMALS - d) as u32)
    } else {
        wad * pow10((d - WAD_DECIMALS) as u32)
    }
}

/// Integer carrying `scale` fractional digits to a `Decimal`.
///
/// Digits that do not fit the 96-bit mantissa (or scale beyond 28) are
/// truncated from the right; an integer part too large for `Decimal` is an
/// `Overflow`.
pub fn scaled_to_decimal(value: &BigUint, scale: u32) -> AmmResult<Decimal> {
    let max = BigUint::from(MAX_DECIMAL_MANTISSA);
    let mut mantissa = value.clone();
    let mut scale = scale;

    while mantissa > max || scale > MAX_DECIMAL_SCALE {
        if scale == 0 {
            return Err(AmmError::Overflow {
                context: format!("{value} does not fit a Decimal"),
            });
        }
        mantissa /= 10u32;
        scale -= 1;
    }

    let mantissa = mantissa.to_i128().ok_or_else(|| AmmError::Overflow {
        context: format!("{value} does not fit a Decimal"),
    })?;
    Decimal::try_from_i128_with_scale(mantissa, scale)
        .map(|d| d.normalize())
        .map_err(|e| AmmError::Overflow {
            context: e.to_string(),
        })
}

/// Wad to human-scale decimal
pub fn wad_to_decimal(wad: &BigUint) -> AmmResult<Decimal> {
    scaled_to_decimal(wad, WAD_DECIMALS as u32)
}

/// Native units to human-scale decimal
pub fn raw_to_decimal(raw: &BigUint, decimals: TokenDecimals) -> AmmResult<Decimal> {
    scaled_to_decimal(raw, decimals.get() as u32)
}

/// Human-scale decimal to an integer with `scale` fractional digits, truncating
/// any finer digits. Negative values are rejected.
pub fn decimal_to_scaled(value: Decimal, scale: u32) -> AmmResult<BigUint> {
    if value < Decimal::ZERO {
        return Err(AmmError::InvalidAmount {
            value: value.to_string(),
        });
    }
    if value.is_zero() {
        return Ok(BigUint::zero());
    }

    let mantissa = BigUint::from(value.mantissa().unsigned_abs());
    let current = value.scale();
    if current <= scale {
        Ok(mantissa * pow10(scale - current))
    } else {
        Ok(mantissa / pow10(current - scale))
    }
}

/// Human-scale decimal to wad
pub fn decimal_to_wad(value: Decimal) -> AmmResult<BigUint> {
    decimal_to_scaled(value, WAD_DECIMALS as u32)
}

/// Human-scale decimal to native units
pub fn decimal_to_raw(value: Decimal, decimals: TokenDecimals) -> AmmResult<BigUint> {
    decimal_to_scaled(value, decimals.get() as u32)
}

/// `numerator / denominator` as a human-scale decimal, carried through an
/// 18-digit fixed-point intermediate
pub fn ratio_to_decimal(numerator: &BigUint, denominator: &BigUint) -> AmmResult<Decimal> {
    if denominator.is_zero() {
        return Err(AmmError::invalid_parameter("denominator", "division by zero"));
    }
    wad_to_decimal(&(numerator * pow10(WAD_DECIMALS as u32) / denominator))
}
