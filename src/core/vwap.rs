//! Depth-aware VWAP: the pure cost model every engine scores against.

use crate::core::domain::{PriceLevel, Price, Volume};

/// Result of walking a book side to fill a target notional.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    vwap: Price,
    fillable_notional: Volume,
}

impl Fill {
    #[must_use]
    pub const fn vwap(&self) -> Price {
        self.vwap
    }

    #[must_use]
    pub const fn fillable_notional(&self) -> Volume {
        self.fillable_notional
    }
}

/// Walk `side` from the touch, accumulating filled quantity and notional
/// until `target_notional` is reached or the side is exhausted.
///
/// Returns `None` if the side cannot fill `target_notional` at all (an
/// empty book, or total depth below the target) -- the "unfillable" case.
/// Levels are assumed to already be ordered nearest-to-touch first, which
/// is the invariant `BookSnapshot` enforces on construction.
#[must_use]
pub fn vwap_for_notional(side: &[PriceLevel], target_notional: Volume) -> Option<Fill> {
    if target_notional <= Volume::ZERO {
        return None;
    }

    let mut filled_qty = Volume::ZERO;
    let mut filled_notional = Volume::ZERO;

    for level in side {
        if filled_notional >= target_notional {
            break;
        }
        let remaining = target_notional - filled_notional;
        let level_notional = level.price() * level.size();

        if level_notional <= remaining {
            filled_qty += level.size();
            filled_notional += level_notional;
        } else {
            let partial_qty = remaining / level.price();
            filled_qty += partial_qty;
            filled_notional += remaining;
        }
    }

    if filled_qty.is_zero() || filled_notional < target_notional {
        return None;
    }

    Some(Fill {
        vwap: filled_notional / filled_qty,
        fillable_notional: filled_notional.min(target_notional),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{BookSide, PriceLevel};
    use rust_decimal_macros::dec;

    fn side(levels: &[(i64, i64)]) -> BookSide {
        levels.iter().map(|&(p, s)| PriceLevel::new(Price::new(p, 0), Volume::new(s, 0))).collect()
    }

    #[test]
    fn single_level_exact_fill() {
        let s = side(&[(100, 2)]);
        let fill = vwap_for_notional(&s, dec!(200)).unwrap();
        assert_eq!(fill.vwap(), dec!(100));
        assert_eq!(fill.fillable_notional(), dec!(200));
    }

    #[test]
    fn multi_level_partial_fill_at_last_level() {
        let s = side(&[(100, 1), (101, 1), (102, 10)]);
        // 100 + 101 = 201 notional filled by first two levels (qty 2).
        // Need 50 more notional from level 3 at price 102: qty = 50/102.
        let fill = vwap_for_notional(&s, dec!(251)).unwrap();
        let expected_qty = Volume::TWO + dec!(50) / dec!(102);
        let expected_vwap = dec!(251) / expected_qty;
        assert_eq!(fill.vwap(), expected_vwap);
        assert_eq!(fill.fillable_notional(), dec!(251));
    }

    #[test]
    fn unfillable_when_depth_insufficient() {
        let s = side(&[(100, 1)]);
        assert!(vwap_for_notional(&s, dec!(1000)).is_none());
    }

    #[test]
    fn unfillable_on_empty_side() {
        let s: BookSide = vec![];
        assert!(vwap_for_notional(&s, dec!(100)).is_none());
    }

    #[test]
    fn zero_or_negative_target_is_unfillable() {
        let s = side(&[(100, 10)]);
        assert!(vwap_for_notional(&s, dec!(0)).is_none());
    }

    #[test]
    fn vwap_stays_within_touched_level_bounds() {
        let s = side(&[(100, 1), (105, 1), (110, 1)]);
        let fill = vwap_for_notional(&s, dec!(305)).unwrap();
        assert!(fill.vwap() >= dec!(100) && fill.vwap() <= dec!(110));
    }
}
