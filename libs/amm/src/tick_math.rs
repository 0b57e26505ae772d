//! Q64.96 tick and sqrt-price arithmetic
//!
//! Exact big-integer versions of the concentrated-liquidity primitives. Input
//! amounts round up and output amounts round down, so a walk never reports
//! more output than the pool would pay.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use types::{AmmError, AmmResult};

pub const MIN_TICK: i32 = -887272;
pub const MAX_TICK: i32 = 887272;
pub const MIN_SQRT_RATIO: u128 = 4295128739;

/// Fractional bits of a Q64.96 value
pub const RESOLUTION: usize = 96;

/// `sqrt(1.0001)^(-2^k)` in Q128.128 for k = 1..=19
const TICK_MULTIPLIERS: [(u32, u128); 19] = [
    (0x2, 0xfff97272373d413259a46990580e213a),
    (0x4, 0xfff2e50f5f656932ef12357cf3c7fdcc),
    (0x8, 0xffe5caca7e10e4e61c3624eaa0941cd0),
    (0x10, 0xffcb9843d60f6159c9db58835c926644),
    (0x20, 0xff973b41fa98c081472e6896dfb254c0),
    (0x40, 0xff2ea16466c96a3843ec78b326b52861),
    (0x80, 0xfe5dee046a99a2a811c461f1969c3053),
    (0x100, 0xfcbe86c7900a88aedcffc83b479aa3a4),
    (0x200, 0xf987a7253ac413176f2b074cf7815e54),
    (0x400, 0xf3392b0822b70005940c7a398e4b70f3),
    (0x800, 0xe7159475a2c29b7443b29c7fa6e889d9),
    (0x1000, 0xd097f3bdfd2022b8845ad8f792aa5825),
    (0x2000, 0xa9f746462d870fdf8a65dc1f90e061e5),
    (0x4000, 0x70d869a156d2a1b890bb3df62baf32f7),
    (0x8000, 0x31be135f97d08fd981231505542fcfa6),
    (0x10000, 0x9aa508b5b7a84e1c677de54f3e99bc9),
    (0x20000, 0x5d6af8dedb81196699c329225ee604),
    (0x40000, 0x2216e584f5fa1ea926041bedfe98),
    (0x80000, 0x48a170391f7dc42444e8fa2),
];

const ODD_TICK_RATIO: u128 = 0xfffcb933bd6fad37aa2d162d1a594001;

/// 2^96
pub fn q96() -> BigUint {
    BigUint::one() << RESOLUTION
}

fn div_rounding_up(numerator: &BigUint, denominator: &BigUint) -> BigUint {
    (numerator + denominator - 1u32) / denominator
}

/// Sqrt price at `tick` as Q64.96, rounded up
pub fn sqrt_ratio_at_tick(tick: i32) -> AmmResult<BigUint> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(AmmError::invalid_parameter(
            "tick",
            format!("{tick} outside {MIN_TICK}..={MAX_TICK}"),
        ));
    }
    let abs_tick = tick.unsigned_abs();

    let mut ratio = if abs_tick & 1 != 0 {
        BigUint::from(ODD_TICK_RATIO)
    } else {
        BigUint::one() << 128
    };
    for (bit, multiplier) in TICK_MULTIPLIERS {
        if abs_tick & bit != 0 {
            ratio = (ratio * multiplier) >> 128;
        }
    }

    if tick > 0 {
        let max = (BigUint::one() << 256) - 1u32;
        ratio = max / ratio;
    }

    // Q128.128 -> Q64.96, rounding up
    let low_bits_set = !(&ratio % (1u64 << 32)).is_zero();
    let mut sqrt_price = ratio >> 32;
    if low_bits_set {
        sqrt_price += 1u32;
    }
    Ok(sqrt_price)
}

/// Token0 between two sqrt prices: `L * 2^96 * (b - a) / b / a`
pub fn amount0_delta(
    sqrt_a: &BigUint,
    sqrt_b: &BigUint,
    liquidity: u128,
    round_up: bool,
) -> AmmResult<BigUint> {
    let (lower, upper) = if sqrt_a > sqrt_b {
        (sqrt_b, sqrt_a)
    } else {
        (sqrt_a, sqrt_b)
    };
    if lower.is_zero() {
        return Err(AmmError::invalid_parameter("sqrt_price_x96", "is zero"));
    }

    let numerator = (BigUint::from(liquidity) << RESOLUTION) * (upper - lower);
    if round_up {
        Ok(div_rounding_up(&div_rounding_up(&numerator, upper), lower))
    } else {
        Ok(numerator / upper / lower)
    }
}

/// Token1 between two sqrt prices: `L * (b - a) / 2^96`
pub fn amount1_delta(
    sqrt_a: &BigUint,
    sqrt_b: &BigUint,
    liquidity: u128,
    round_up: bool,
) -> BigUint {
    let (lower, upper) = if sqrt_a > sqrt_b {
        (sqrt_b, sqrt_a)
    } else {
        (sqrt_a, sqrt_b)
    };
    let numerator = BigUint::from(liquidity) * (upper - lower);
    if round_up {
        div_rounding_up(&numerator, &q96())
    } else {
        numerator >> RESOLUTION
    }
}

/// Sqrt price after adding `amount_in` of the input token.
///
/// Token0 in pushes the price down and rounds up, token1 in pushes it up and
/// rounds down, so the pool is never left short.
pub fn next_sqrt_price_from_input(
    sqrt_price: &BigUint,
    liquidity: u128,
    amount_in: &BigUint,
    zero_for_one: bool,
) -> AmmResult<BigUint> {
    if sqrt_price.is_zero() {
        return Err(AmmError::invalid_parameter("sqrt_price_x96", "is zero"));
    }
    if liquidity == 0 {
        return Err(AmmError::invalid_parameter("liquidity", "is zero"));
    }
    if amount_in.is_zero() {
        return Ok(sqrt_price.clone());
    }

    if zero_for_one {
        let numerator = BigUint::from(liquidity) << RESOLUTION;
        let denominator = &numerator + amount_in * sqrt_price;
        Ok(div_rounding_up(&(numerator * sqrt_price), &denominator))
    } else {
        Ok(sqrt_price + (amount_in << RESOLUTION) / liquidity)
    }
}
