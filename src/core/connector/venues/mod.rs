//! Tagged factory selecting a [`VenueTransport`](super::protocol::VenueTransport)
//! implementation by venue id.

mod binance;
mod bybit;
mod generic;

use crate::core::domain::VenueId;

use super::protocol::VenueTransport;

#[must_use]
pub fn build(venue: VenueId) -> Box<dyn VenueTransport> {
    match venue {
        VenueId::Binance => Box::new(binance::BinanceTransport::new()),
        VenueId::Bybit => Box::new(bybit::BybitTransport::new()),
        VenueId::Okx => Box::new(generic::GenericTransport::new(generic::okx_profile())),
        VenueId::Kucoin => Box::new(generic::GenericTransport::new(generic::kucoin_profile())),
        VenueId::Mexc => Box::new(generic::GenericTransport::new(generic::mexc_profile())),
        VenueId::Huobi => Box::new(generic::GenericTransport::new(generic::huobi_profile())),
        VenueId::Cointr => Box::new(generic::GenericTransport::new(generic::cointr_profile())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_transport_for_every_venue() {
        for venue in VenueId::ALL {
            let _ = build(venue);
        }
    }
}
