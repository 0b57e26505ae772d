//! Slippage maps: per-threshold trade sizes a pool absorbs
//!
//! Keys are slippage thresholds in basis points, values the base amount sold
//! and quote amount received at that threshold, both human-scale.

use crate::common::{AmmError, AmmResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Trade size at one slippage threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SlippageEntry {
    /// Amount of the sold asset
    pub base: Decimal,
    /// Amount of the bought asset received for `base`
    pub quote: Decimal,
}

impl SlippageEntry {
    pub const fn new(base: Decimal, quote: Decimal) -> Self {
        Self { base, quote }
    }
}

/// Slippage map ordered by threshold
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlippageMap(BTreeMap<u32, SlippageEntry>);

impl SlippageMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, bps: u32, entry: SlippageEntry) -> Option<SlippageEntry> {
        self.0.insert(bps, entry)
    }

    pub fn get(&self, bps: u32) -> Option<&SlippageEntry> {
        self.0.get(&bps)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &SlippageEntry)> {
        self.0.iter().map(|(bps, entry)| (*bps, entry))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn thresholds(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.keys().copied()
    }

    /// Both `base` and `quote` must be non-decreasing in the threshold.
    /// Reports the first violation found walking up from the tightest key.
    pub fn check_monotonic(&self) -> AmmResult<()> {
        let mut previous: Option<&SlippageEntry> = None;
        for (&bps, entry) in &self.0 {
            if let Some(prev) = previous {
                if entry.base < prev.base {
                    return Err(AmmError::NonMonotonicSlippage {
                        bps,
                        field: "base",
                        previous: prev.base.to_string(),
                        current: entry.base.to_string(),
                    });
                }
                if entry.quote < prev.quote {
                    return Err(AmmError::NonMonotonicSlippage {
                        bps,
                        field: "quote",
                        previous: prev.quote.to_string(),
                        current: entry.quote.to_string(),
                    });
                }
            }
            previous = Some(entry);
        }
        Ok(())
    }
}

impl FromIterator<(u32, SlippageEntry)> for SlippageMap {
    fn from_iter<I: IntoIterator<Item = (u32, SlippageEntry)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for SlippageMap {
    type Item = (u32, SlippageEntry);
    type IntoIter = std::collections::btree_map::IntoIter<u32, SlippageEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Inclusive, stepped range of slippage thresholds in basis points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BpsRange {
    pub min: u32,
    pub max: u32,
    pub step: u32,
}

impl Default for BpsRange {
    fn default() -> Self {
        Self {
            min: 50,
            max: 2000,
            step: 50,
        }
    }
}

impl BpsRange {
    pub fn new(min: u32, max: u32, step: u32) -> AmmResult<Self> {
        let range = Self { min, max, step };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> AmmResult<()> {
        if self.step == 0 {
            return Err(AmmError::invalid_parameter("step_bps", "must be positive"));
        }
        if self.min == 0 || self.min > self.max {
            return Err(AmmError::invalid_parameter(
                "min_bps",
                format!("must be in 1..={}, got {}", self.max, self.min),
            ));
        }
        if self.max >= 10_000 {
            return Err(AmmError::invalid_parameter(
                "max_bps",
                format!("must be below 10000, got {}", self.max),
            ));
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> {
        (self.min..=self.max).step_by(self.step.max(1) as usize)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }
}

/// How the bisection measures the execution price of a candidate trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceMeasure {
    /// Probe price on the post-trade reserves
    #[default]
    Marginal,
    /// `quote / base` of the trade itself
    Average,
}

/// Spot price quote for one direction of a pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub from: String,
    pub to: String,
    /// Units of `to` per unit of `from`
    pub price: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_range() {
        let range = BpsRange::default();
        let thresholds: Vec<u32> = range.iter().collect();
        assert_eq!(thresholds.len(), 40);
        assert_eq!(thresholds.first(), Some(&50));
        assert_eq!(thresholds.last(), Some(&2000));
    }

    #[test]
    fn test_range_validation() {
        assert!(BpsRange::new(50, 2000, 0).is_err());
        assert!(BpsRange::new(0, 2000, 50).is_err());
        assert!(BpsRange::new(500, 100, 50).is_err());
        assert!(BpsRange::new(50, 10_000, 50).is_err());
        assert!(BpsRange::new(100, 100, 50).is_ok());
    }

    #[test]
    fn test_monotonic_map() {
        let map: SlippageMap = [
            (50, SlippageEntry::new(dec!(10), dec!(9.9))),
            (100, SlippageEntry::new(dec!(20), dec!(19.7))),
            (150, SlippageEntry::new(dec!(20), dec!(19.7))),
        ]
        .into_iter()
        .collect();
        assert!(map.check_monotonic().is_ok());
    }

    #[test]
    fn test_non_monotonic_reports_first_violation() {
        let map: SlippageMap = [
            (50, SlippageEntry::new(dec!(10), dec!(9.9))),
            (100, SlippageEntry::new(dec!(20), dec!(9.8))),
            (150, SlippageEntry::new(dec!(5), dec!(4))),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            map.check_monotonic(),
            Err(AmmError::NonMonotonicSlippage {
                bps: 100,
                field: "quote",
                previous: "9.9".to_string(),
                current: "9.8".to_string(),
            })
        );
    }

    #[test]
    fn test_map_serializes_as_object() {
        let mut map = SlippageMap::new();
        map.insert(50, SlippageEntry::new(dec!(1.5), dec!(3)));
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"50":{"base":"1.5","quote":"3"}}"#);
    }
}
