//! Bisection against the constant-product closed forms
//!
//! x*y=k inverts analytically, so it is the one pool where the search result
//! can be checked against an exact answer under both price measures.

use amm::{dec, ConstantProductPricer, Decimal, SearchLimits, SlippageSearch, V2Math};
use num_bigint::BigUint;
use types::precision::{pow10, wad_to_decimal};
use types::{BpsRange, PairId, PriceMeasure};

fn relative_error(actual: Decimal, expected: Decimal) -> Decimal {
    ((actual - expected) / expected).abs()
}

fn search_against_closed_form(measure: PriceMeasure) {
    let reserves = vec![
        BigUint::from(1_000u32) * pow10(18),
        BigUint::from(2_000u32) * pow10(18),
    ];
    let pricer = ConstantProductPricer::default();
    // a probe tiny against the reserves measures the true spot price
    let search = SlippageSearch::new(
        &pricer,
        &reserves,
        PairId::new(0, 1),
        pow10(9),
        measure,
        SearchLimits::default(),
    )
    .unwrap();

    let searched = search.run(&BpsRange::default()).unwrap();
    let closed =
        V2Math::slippage_map(dec!(1000), dec!(2000), &BpsRange::default(), measure).unwrap();
    assert_eq!(searched.len(), closed.len());

    for (bps, outcome) in searched {
        let exact = closed.get(bps).unwrap();
        let base = wad_to_decimal(&outcome.base).unwrap();
        let quote = wad_to_decimal(&outcome.quote).unwrap();
        assert!(
            relative_error(base, exact.base) < dec!(0.002),
            "{measure:?} {bps} bps: searched {base}, exact {}",
            exact.base
        );
        assert!(
            relative_error(quote, exact.quote) < dec!(0.002),
            "{measure:?} {bps} bps: searched quote {quote}, exact {}",
            exact.quote
        );
    }
}

#[test]
fn test_average_measure_matches_closed_form() {
    search_against_closed_form(PriceMeasure::Average);
}

#[test]
fn test_marginal_measure_matches_closed_form() {
    search_against_closed_form(PriceMeasure::Marginal);
}

#[test]
fn test_marginal_sizes_are_smaller_than_average() {
    // the marginal price falls twice as fast as the average price on x*y=k
    let range = BpsRange::default();
    let average =
        V2Math::slippage_map(dec!(1000), dec!(2000), &range, PriceMeasure::Average).unwrap();
    let marginal =
        V2Math::slippage_map(dec!(1000), dec!(2000), &range, PriceMeasure::Marginal).unwrap();
    for bps in range.iter() {
        assert!(marginal.get(bps).unwrap().base < average.get(bps).unwrap().base);
    }
}
