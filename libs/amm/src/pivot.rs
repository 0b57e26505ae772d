//! Two-hop depth through a shared pivot asset
//!
//! The slippage budget is split between the hops on the maps' own 50 bps grid.
//! A split is feasible when the pivot amount bought on the first hop can be
//! sold on the second hop within the remaining budget.

use rust_decimal::Decimal;
use tracing::trace;
use types::SlippageMap;

/// Granularity of the budget split
pub const PIVOT_STEP_BPS: u32 = 50;

pub struct PivotAggregator;

impl PivotAggregator {
    /// Largest first-hop base amount over all feasible budget splits, or zero.
    ///
    /// `segment1_price` is the first hop's spot price in pivot units per base
    /// unit. A split with no entry in either map is infeasible.
    pub fn combine(
        segment1: &SlippageMap,
        segment1_price: Decimal,
        segment2: &SlippageMap,
        target_bps: u32,
    ) -> Decimal {
        let mut best = Decimal::ZERO;
        if target_bps >= 10_000 {
            return best;
        }

        for first_hop in (PIVOT_STEP_BPS..=target_bps).step_by(PIVOT_STEP_BPS as usize) {
            let (Some(hop1), Some(hop2)) = (
                segment1.get(first_hop),
                segment2.get(target_bps - first_hop),
            ) else {
                continue;
            };

            let degraded = Decimal::from(10_000 - first_hop) / Decimal::from(10_000);
            let Some(pivot_amount) = hop1
                .base
                .checked_mul(segment1_price)
                .and_then(|v| v.checked_mul(degraded))
            else {
                continue;
            };

            let feasible = pivot_amount <= hop2.base;
            trace!(
                first_hop,
                pivot_amount = %pivot_amount,
                capacity = %hop2.base,
                feasible,
                "Pivot split"
            );
            if feasible && hop1.base > best {
                best = hop1.base;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use types::SlippageEntry;

    fn map(entries: &[(u32, Decimal)]) -> SlippageMap {
        entries
            .iter()
            .map(|(bps, base)| (*bps, SlippageEntry::new(*base, *base)))
            .collect()
    }

    #[test]
    fn test_empty_maps_give_zero() {
        let empty = SlippageMap::new();
        assert_eq!(
            PivotAggregator::combine(&empty, dec!(2), &empty, 1000),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_picks_largest_feasible_split() {
        // first hop: base at 50/100/150 bps; second hop capacity in pivot units
        let seg1 = map(&[(50, dec!(10)), (100, dec!(20)), (150, dec!(30))]);
        let seg2 = map(&[(50, dec!(100)), (100, dec!(50)), (150, dec!(10))]);

        // b=50: 10*2*0.995 = 19.9 <= seg2[150]=10? no
        // b=100: 20*2*0.99 = 39.6 <= seg2[100]=50 yes
        // b=150: 30*2*0.985 = 59.1 <= seg2[50]=100 yes
        assert_eq!(PivotAggregator::combine(&seg1, dec!(2), &seg2, 200), dec!(30));

        // same maps with a tighter second hop at 50 bps
        let seg2 = map(&[(50, dec!(40)), (100, dec!(50)), (150, dec!(10))]);
        assert_eq!(PivotAggregator::combine(&seg1, dec!(2), &seg2, 200), dec!(20));
    }

    #[test]
    fn test_missing_entries_are_infeasible() {
        // b=100 needs a zero-bps second hop, b=50 has no first-hop entry
        let seg1 = map(&[(100, dec!(5))]);
        let seg2 = map(&[(50, dec!(1000))]);
        assert_eq!(PivotAggregator::combine(&seg1, dec!(1), &seg2, 100), dec!(0));
    }

    #[test]
    fn test_no_feasible_split() {
        let seg1 = map(&[(50, dec!(100)), (100, dec!(200))]);
        let seg2 = map(&[(50, dec!(1)), (100, dec!(1))]);
        assert_eq!(PivotAggregator::combine(&seg1, dec!(1), &seg2, 150), dec!(0));
    }
}
