//! Monetary types for price, volume, and basis-point arithmetic.
//!
//! Every price/size/bps value in this crate is a `Decimal`. Floating point
//! is never used for VWAP accumulation; it would silently corrupt the
//! comparisons the engines make against configured thresholds.

use rust_decimal::Decimal;

/// Price, quote units per base unit.
pub type Price = Decimal;

/// Volume, in base units unless stated otherwise.
pub type Volume = Decimal;

/// A basis-point quantity (1 bps = 0.0001 = 0.01%).
pub type Bps = Decimal;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn price_and_volume_are_decimal() {
        let price: Price = dec!(1.50);
        let volume: Volume = dec!(100.0);

        assert_eq!(price + volume, dec!(101.50));
    }

    #[test]
    fn bps_conversion_from_ratio() {
        let ratio: Decimal = dec!(1.0333);
        let bps: Bps = (ratio - Decimal::ONE) * dec!(10000);
        assert_eq!(bps, dec!(333.00));
    }
}
