//! Façade dispatch across pool kinds

use amm::{dec, LiquidityEngine, V2Math};
use config::{ConcentratedSettings, EngineConfig};
use num_bigint::BigUint;
use std::collections::BTreeMap;
use types::{
    AmmError, BpsRange, ConcentratedParams, ConstantProductParams, PairId, PoolKind,
    PoolSnapshot, PriceMeasure, TokenDecimals, TokenInfo,
};

const L: i128 = 1_000_000_000_000_000_000;

fn pair_tokens(d0: i32, d1: i32) -> Vec<TokenInfo> {
    vec![
        TokenInfo::new("TKA", TokenDecimals::new(d0).unwrap()),
        TokenInfo::new("TKB", TokenDecimals::new(d1).unwrap()),
    ]
}

fn constant_product() -> PoolSnapshot {
    PoolSnapshot::new(
        pair_tokens(18, 6),
        PoolKind::ConstantProduct(ConstantProductParams {
            reserves: [
                BigUint::from(500u32) * BigUint::from(10u32).pow(18),
                BigUint::from(1_000_000_000u64),
            ],
        }),
    )
    .unwrap()
}

fn concentrated(liquidity_net: &[(i32, i128)]) -> PoolSnapshot {
    PoolSnapshot::new(
        pair_tokens(18, 18),
        PoolKind::Concentrated(ConcentratedParams {
            current_tick: 0,
            tick_spacing: 10,
            sqrt_price_x96: BigUint::from(1u32) << 96,
            active_liquidity: None,
            liquidity_net: liquidity_net.iter().copied().collect::<BTreeMap<_, _>>(),
        }),
    )
    .unwrap()
}

#[test]
fn test_constant_product_uses_closed_form() {
    let engine = LiquidityEngine::default();
    let map = engine
        .slippage_map(PairId::new(0, 1), &constant_product(), BpsRange::default())
        .unwrap();
    let expected = V2Math::slippage_map(
        dec!(500),
        dec!(1000),
        &BpsRange::default(),
        PriceMeasure::Marginal,
    )
    .unwrap();
    assert_eq!(map, expected);
}

#[test]
fn test_configured_measure_is_honoured() {
    let mut config = EngineConfig::default();
    config.slippage.measure = PriceMeasure::Average;
    let engine = LiquidityEngine::new(config);

    let map = engine
        .configured_slippage_map(PairId::new(0, 1), &constant_product())
        .unwrap();
    // 500 * 0.01 / 0.99
    let entry = map.get(100).unwrap();
    assert!((entry.base - dec!(5.0505050505)).abs() < dec!(0.0000001));
}

#[test]
fn test_concentrated_entries_on_whole_percents() {
    let engine = LiquidityEngine::default();
    let snapshot = concentrated(&[(-6000, L), (6000, -L)]);

    let down = engine
        .slippage_map(PairId::new(0, 1), &snapshot, BpsRange::default())
        .unwrap();
    assert_eq!(down.len(), 20);
    assert!(down.get(50).is_none());
    let ten = down.get(1000).unwrap();
    assert_eq!(ten.base, dec!(0.051268468376766596));
    assert_eq!(ten.quote, dec!(0.048768197581278886));

    let up = engine
        .slippage_map(
            PairId::new(1, 0),
            &snapshot,
            BpsRange::new(100, 5000, 100).unwrap(),
        )
        .unwrap();
    assert_eq!(up.len(), 50);
    let first = up.get(100).unwrap();
    assert_eq!(first.base, dec!(0.005012269623051204));
    assert_eq!(first.quote, dec!(0.004987272070749096));
    let last = up.get(5000).unwrap();
    assert_eq!(last.base, dec!(0.284009367540274543));
    assert_eq!(last.quote, dec!(0.221189482506922746));
}

#[test]
fn test_concentrated_walk_capped_by_config() {
    let mut config = EngineConfig::default();
    config.concentrated = ConcentratedSettings {
        max_percent: 5,
        ticks_per_percent: 100,
    };
    let engine = LiquidityEngine::new(config);
    let snapshot = concentrated(&[(-6000, L), (6000, -L)]);
    let map = engine
        .slippage_map(PairId::new(0, 1), &snapshot, BpsRange::default())
        .unwrap();
    assert_eq!(map.thresholds().collect::<Vec<_>>(), vec![100, 200, 300, 400, 500]);
}

#[test]
fn test_concentrated_spot_price() {
    let engine = LiquidityEngine::default();
    let snapshot = concentrated(&[(-6000, L), (6000, -L)]);
    assert_eq!(
        engine.price(PairId::new(0, 1), &snapshot).unwrap().price,
        dec!(1)
    );
}

#[test]
fn test_batch_keeps_going_past_failures() {
    let engine = LiquidityEngine::default();
    let shallow = concentrated(&[(-500, L), (500, -L)]);
    let deep = concentrated(&[(-6000, L), (6000, -L)]);
    let cp = constant_product();

    let results = engine.slippage_maps(&[
        (PairId::new(0, 1), &shallow),
        (PairId::new(0, 1), &deep),
        (PairId::new(1, 0), &cp),
    ]);
    assert_eq!(results.len(), 3);
    assert_eq!(
        results[0],
        Err(AmmError::TickLiquidityMissing {
            needed: -600,
            last_supplied: -500
        })
    );
    assert_eq!(results[1].as_ref().unwrap().len(), 20);
    assert_eq!(results[2].as_ref().unwrap().len(), 40);
}

#[test]
fn test_zero_reserve_reported_with_index() {
    let snapshot = PoolSnapshot::new(
        pair_tokens(18, 18),
        PoolKind::ConstantProduct(ConstantProductParams {
            reserves: [BigUint::from(1_000u32), BigUint::from(0u32)],
        }),
    )
    .unwrap();
    let engine = LiquidityEngine::default();
    assert_eq!(
        engine.price(PairId::new(1, 0), &snapshot),
        Err(AmmError::ZeroReserve { index: 1 })
    );
}

#[test]
fn test_pivot_through_engine() {
    let engine = LiquidityEngine::default();
    let outbound = PairId::new(0, 1);
    let first = engine
        .slippage_map(outbound, &constant_product(), BpsRange::default())
        .unwrap();
    let price = engine.price(outbound, &constant_product()).unwrap().price;
    let second = engine
        .slippage_map(outbound.reversed(), &constant_product(), BpsRange::default())
        .unwrap();

    let combined = engine.combine_pivot(&first, price, &second, 1000);
    assert!(combined > dec!(0));
    assert!(combined <= first.get(1000).unwrap().base);
}
