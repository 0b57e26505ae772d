//! Pool snapshots handed to the engines by upstream collaborators
//!
//! A [`PoolSnapshot`] pairs token metadata with exactly one [`PoolKind`]. The
//! kind is resolved when the snapshot is built, and each variant carries only
//! the fields its invariant needs, so engines never re-dispatch on strings.

use crate::common::{AmmError, AmmResult};
use crate::precision::TokenDecimals;
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Token metadata in pool order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub symbol: String,
    pub decimals: TokenDecimals,
}

impl TokenInfo {
    pub fn new(symbol: impl Into<String>, decimals: TokenDecimals) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
        }
    }
}

/// Direction of a trade: sell asset `from`, receive asset `to` (pool indices)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairId {
    pub from: usize,
    pub to: usize,
}

impl PairId {
    pub const fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    pub const fn reversed(self) -> Self {
        Self {
            from: self.to,
            to: self.from,
        }
    }
}

/// Uniswap-V2-style pool: two reserves in native units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantProductParams {
    pub reserves: [BigUint; 2],
}

/// Curve StableSwap pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StableSwapParams {
    /// Native-unit reserves, one per token
    pub reserves: Vec<BigUint>,
    /// Amplification factor `A`
    pub amplification: u64,
    /// LP token total supply (18 decimals); only consulted for virtual price
    pub lp_supply: Option<BigUint>,
}

/// CryptoSwap pool with the (A, gamma) invariant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoSwapParams {
    /// Native-unit reserves, one per token
    pub reserves: Vec<BigUint>,
    /// Pool-reported `A` (already A * N^N * A_MULTIPLIER)
    pub ann: BigUint,
    /// Pool-reported gamma, 18-decimal fixed point
    pub gamma: BigUint,
    /// Pool-reported invariant D; used as-is, never re-derived
    pub d: BigUint,
    /// Price scale of every asset but the first, 18-decimal fixed point
    pub price_scale: Vec<BigUint>,
    /// Per-asset multipliers lifting native units to 18 decimals
    pub precisions: Vec<BigUint>,
}

/// Uniswap-V3-style concentrated-liquidity pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcentratedParams {
    pub current_tick: i32,
    pub tick_spacing: i32,
    /// Current sqrt price, Q64.96
    pub sqrt_price_x96: BigUint,
    /// In-range liquidity as reported by the pool. When absent it is derived
    /// from `liquidity_net` as the sum of deltas at ticks <= `current_tick`.
    pub active_liquidity: Option<u128>,
    /// Net liquidity delta applied when crossing each initialized tick upward
    pub liquidity_net: BTreeMap<i32, i128>,
}

/// Closed set of supported pool shapes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolKind {
    ConstantProduct(ConstantProductParams),
    StableSwap(StableSwapParams),
    CryptoSwap(CryptoSwapParams),
    Concentrated(ConcentratedParams),
}

impl PoolKind {
    pub fn name(&self) -> &'static str {
        match self {
            PoolKind::ConstantProduct(_) => "constant_product",
            PoolKind::StableSwap(_) => "stable_swap",
            PoolKind::CryptoSwap(_) => "crypto_swap",
            PoolKind::Concentrated(_) => "concentrated",
        }
    }
}

/// Validated pool inputs for one (pool, block) observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SnapshotRepr")]
pub struct PoolSnapshot {
    tokens: Vec<TokenInfo>,
    kind: PoolKind,
}

#[derive(Deserialize)]
struct SnapshotRepr {
    tokens: Vec<TokenInfo>,
    kind: PoolKind,
}

impl TryFrom<SnapshotRepr> for PoolSnapshot {
    type Error = AmmError;

    fn try_from(repr: SnapshotRepr) -> AmmResult<Self> {
        Self::new(repr.tokens, repr.kind)
    }
}

fn check_len(tokens: usize, got: usize, what: &'static str) -> AmmResult<()> {
    if tokens != got {
        return Err(AmmError::ReserveLengthMismatch {
            tokens,
            reserves: got,
            what,
        });
    }
    Ok(())
}

impl PoolSnapshot {
    pub fn new(tokens: Vec<TokenInfo>, kind: PoolKind) -> AmmResult<Self> {
        let n = tokens.len();
        if n < 2 {
            return Err(AmmError::invalid_parameter(
                "tokens",
                format!("a pool needs at least 2 assets, got {n}"),
            ));
        }

        match &kind {
            PoolKind::ConstantProduct(params) => {
                check_len(n, params.reserves.len(), "reserves")?;
            }
            PoolKind::StableSwap(params) => {
                check_len(n, params.reserves.len(), "reserves")?;
                if params.amplification == 0 {
                    return Err(AmmError::invalid_parameter("amplification", "must be >= 1"));
                }
            }
            PoolKind::CryptoSwap(params) => {
                check_len(n, params.reserves.len(), "reserves")?;
                check_len(n - 1, params.price_scale.len(), "price scales")?;
                check_len(n, params.precisions.len(), "precisions")?;
                if params.ann.is_zero() || params.gamma.is_zero() || params.d.is_zero() {
                    return Err(AmmError::invalid_parameter(
                        "ann/gamma/d",
                        "must all be non-zero",
                    ));
                }
                if params.price_scale.iter().any(Zero::is_zero)
                    || params.precisions.iter().any(Zero::is_zero)
                {
                    return Err(AmmError::invalid_parameter(
                        "price_scale/precisions",
                        "entries must be non-zero",
                    ));
                }
            }
            PoolKind::Concentrated(params) => {
                check_len(2, n, "tokens in a concentrated pool")?;
                if params.tick_spacing <= 0 {
                    return Err(AmmError::invalid_parameter(
                        "tick_spacing",
                        format!("must be positive, got {}", params.tick_spacing),
                    ));
                }
                if params.sqrt_price_x96.is_zero() {
                    return Err(AmmError::invalid_parameter("sqrt_price_x96", "is zero"));
                }
            }
        }

        Ok(Self { tokens, kind })
    }

    pub fn tokens(&self) -> &[TokenInfo] {
        &self.tokens
    }

    pub fn kind(&self) -> &PoolKind {
        &self.kind
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn decimals(&self) -> Vec<TokenDecimals> {
        self.tokens.iter().map(|t| t.decimals).collect()
    }

    /// Validate a trade direction against this pool
    pub fn check_pair(&self, pair: PairId) -> AmmResult<()> {
        AmmError::check_pair(pair.from, pair.to, self.tokens.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(n: usize) -> Vec<TokenInfo> {
        (0..n)
            .map(|i| TokenInfo::new(format!("T{i}"), TokenDecimals::WAD))
            .collect()
    }

    fn stable(reserves: usize, amplification: u64) -> PoolKind {
        PoolKind::StableSwap(StableSwapParams {
            reserves: vec![BigUint::from(1_000u32); reserves],
            amplification,
            lp_supply: None,
        })
    }

    #[test]
    fn test_reserve_length_mismatch() {
        let err = PoolSnapshot::new(tokens(3), stable(2, 100)).unwrap_err();
        assert_eq!(
            err,
            AmmError::ReserveLengthMismatch {
                tokens: 3,
                reserves: 2,
                what: "reserves"
            }
        );
    }

    #[test]
    fn test_zero_amplification_rejected() {
        assert!(matches!(
            PoolSnapshot::new(tokens(2), stable(2, 0)),
            Err(AmmError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_crypto_swap_shapes() {
        let kind = PoolKind::CryptoSwap(CryptoSwapParams {
            reserves: vec![BigUint::from(1u32); 3],
            ann: BigUint::from(5_400_000u32),
            gamma: BigUint::from(20_000_000_000_000u64),
            d: BigUint::from(3u32),
            price_scale: vec![BigUint::from(1u32)],
            precisions: vec![BigUint::from(1u32); 3],
        });
        let err = PoolSnapshot::new(tokens(3), kind).unwrap_err();
        assert!(matches!(
            err,
            AmmError::ReserveLengthMismatch {
                what: "price scales",
                ..
            }
        ));
    }

    #[test]
    fn test_concentrated_requires_two_tokens() {
        let kind = PoolKind::Concentrated(ConcentratedParams {
            current_tick: 0,
            tick_spacing: 60,
            sqrt_price_x96: BigUint::from(1u128 << 96),
            active_liquidity: None,
            liquidity_net: BTreeMap::new(),
        });
        assert!(PoolSnapshot::new(tokens(3), kind.clone()).is_err());
        let snapshot = PoolSnapshot::new(tokens(2), kind).unwrap();
        assert_eq!(snapshot.kind().name(), "concentrated");
        assert!(snapshot.check_pair(PairId::new(0, 1)).is_ok());
        assert!(snapshot.check_pair(PairId::new(1, 1)).is_err());
    }

    #[test]
    fn test_deserialization_validates() {
        let snapshot = PoolSnapshot::new(tokens(2), stable(2, 100)).unwrap();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: PoolSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);

        let broken = json.replace("\"amplification\":100", "\"amplification\":0");
        assert!(serde_json::from_str::<PoolSnapshot>(&broken).is_err());
    }
}
