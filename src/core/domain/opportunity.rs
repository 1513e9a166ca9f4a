//! Detected arbitrage opportunities: cross-exchange and triangular.

use chrono::{DateTime, Utc};

use super::id::{DetectionId, Pair, VenueId};
use super::money::{Bps, Price, Volume};

/// Direction of a leg within a triangular cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Sell the base asset into this pair at the bid.
    Sell,
    /// Buy the base asset out of this pair at the ask.
    Buy,
}

/// One edge of a triangular cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    pair: Pair,
    side: Side,
}

impl Leg {
    #[must_use]
    pub const fn new(pair: Pair, side: Side) -> Self {
        Self { pair, side }
    }

    #[must_use]
    pub const fn pair(&self) -> &Pair {
        &self.pair
    }

    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }
}

/// A cross-exchange spread opportunity: buy on one venue, sell on another.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossOpportunity {
    id: DetectionId,
    pair: Pair,
    buy_venue: VenueId,
    sell_venue: VenueId,
    notional: Volume,
    gross_bps: Bps,
    net_bps: Bps,
    buy_vwap: Price,
    sell_vwap: Price,
    fillable_notional: Volume,
    t_detected: DateTime<Utc>,
}

impl CrossOpportunity {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        pair: Pair,
        buy_venue: VenueId,
        sell_venue: VenueId,
        notional: Volume,
        gross_bps: Bps,
        net_bps: Bps,
        buy_vwap: Price,
        sell_vwap: Price,
        fillable_notional: Volume,
        t_detected: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DetectionId::next(),
            pair,
            buy_venue,
            sell_venue,
            notional,
            gross_bps,
            net_bps,
            buy_vwap,
            sell_vwap,
            fillable_notional,
            t_detected,
        }
    }

    #[must_use]
    pub const fn id(&self) -> DetectionId {
        self.id
    }

    #[must_use]
    pub const fn pair(&self) -> &Pair {
        &self.pair
    }

    #[must_use]
    pub const fn buy_venue(&self) -> VenueId {
        self.buy_venue
    }

    #[must_use]
    pub const fn sell_venue(&self) -> VenueId {
        self.sell_venue
    }

    #[must_use]
    pub const fn notional(&self) -> Volume {
        self.notional
    }

    #[must_use]
    pub const fn gross_bps(&self) -> Bps {
        self.gross_bps
    }

    #[must_use]
    pub const fn net_bps(&self) -> Bps {
        self.net_bps
    }

    #[must_use]
    pub const fn buy_vwap(&self) -> Price {
        self.buy_vwap
    }

    #[must_use]
    pub const fn sell_vwap(&self) -> Price {
        self.sell_vwap
    }

    #[must_use]
    pub const fn fillable_notional(&self) -> Volume {
        self.fillable_notional
    }

    #[must_use]
    pub const fn t_detected(&self) -> DateTime<Utc> {
        self.t_detected
    }

    /// A human-readable one-line summary suitable for the notifier.
    #[must_use]
    pub fn describe(&self) -> String {
        format!(
            "{} buy {} sell {} net {:.2} bps notional {:.2} [{}]",
            self.pair, self.buy_venue, self.sell_venue, self.net_bps, self.notional, self.id
        )
    }
}

/// A triangular (3-leg, intra-venue) cycle opportunity.
#[derive(Debug, Clone, PartialEq)]
pub struct TriOpportunity {
    id: DetectionId,
    venue: VenueId,
    legs: [Leg; 3],
    base: String,
    gross_bps: Bps,
    net_bps: Bps,
    t_detected: DateTime<Utc>,
}

impl TriOpportunity {
    #[must_use]
    pub fn new(
        venue: VenueId,
        legs: [Leg; 3],
        base: impl Into<String>,
        gross_bps: Bps,
        net_bps: Bps,
        t_detected: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DetectionId::next(),
            venue,
            legs,
            base: base.into(),
            gross_bps,
            net_bps,
            t_detected,
        }
    }

    #[must_use]
    pub const fn id(&self) -> DetectionId {
        self.id
    }

    #[must_use]
    pub const fn venue(&self) -> VenueId {
        self.venue
    }

    #[must_use]
    pub fn legs(&self) -> &[Leg; 3] {
        &self.legs
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    #[must_use]
    pub const fn gross_bps(&self) -> Bps {
        self.gross_bps
    }

    #[must_use]
    pub const fn net_bps(&self) -> Bps {
        self.net_bps
    }

    #[must_use]
    pub const fn t_detected(&self) -> DateTime<Utc> {
        self.t_detected
    }

    #[must_use]
    pub fn describe(&self) -> String {
        let path = self
            .legs
            .iter()
            .map(|l| l.pair().to_string())
            .collect::<Vec<_>>()
            .join(" -> ");
        format!(
            "{} tri {} net {:.2} bps via {} [{}]",
            self.venue, self.base, self.net_bps, path, self.id
        )
    }
}

/// A detected opportunity of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Opportunity {
    Cross(CrossOpportunity),
    Tri(TriOpportunity),
}

impl Opportunity {
    #[must_use]
    pub const fn id(&self) -> DetectionId {
        match self {
            Self::Cross(c) => c.id(),
            Self::Tri(t) => t.id(),
        }
    }

    #[must_use]
    pub const fn net_bps(&self) -> Bps {
        match self {
            Self::Cross(c) => c.net_bps(),
            Self::Tri(t) => t.net_bps(),
        }
    }

    #[must_use]
    pub const fn t_detected(&self) -> DateTime<Utc> {
        match self {
            Self::Cross(c) => c.t_detected(),
            Self::Tri(t) => t.t_detected(),
        }
    }

    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Cross(c) => c.describe(),
            Self::Tri(t) => t.describe(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pair() -> Pair {
        Pair::new("BTC", "USDT")
    }

    #[test]
    fn cross_opportunity_describe_contains_venues_and_pair() {
        let opp = CrossOpportunity::new(
            pair(),
            VenueId::Binance,
            VenueId::Bybit,
            dec!(100),
            dec!(33.33),
            dec!(13.33),
            dec!(30000),
            dec!(30100),
            dec!(100),
            Utc::now(),
        );
        let text = opp.describe();
        assert!(text.contains("BTC/USDT"));
        assert!(text.contains("binance"));
        assert!(text.contains("bybit"));
    }

    #[test]
    fn tri_opportunity_has_three_legs() {
        let legs = [
            Leg::new(Pair::new("USDT", "BTC"), Side::Buy),
            Leg::new(Pair::new("BTC", "ETH"), Side::Sell),
            Leg::new(Pair::new("ETH", "USDT"), Side::Sell),
        ];
        let opp = TriOpportunity::new(VenueId::Okx, legs, "USDT", dec!(20), dec!(15), Utc::now());
        assert_eq!(opp.legs().len(), 3);
        assert_eq!(opp.base(), "USDT");
    }

    #[test]
    fn opportunity_enum_dispatches_to_variant() {
        let cross = CrossOpportunity::new(
            pair(),
            VenueId::Binance,
            VenueId::Bybit,
            dec!(100),
            dec!(33.33),
            dec!(13.33),
            dec!(30000),
            dec!(30100),
            dec!(100),
            Utc::now(),
        );
        let wrapped = Opportunity::Cross(cross.clone());
        assert_eq!(wrapped.id(), cross.id());
        assert_eq!(wrapped.net_bps(), cross.net_bps());
    }
}
