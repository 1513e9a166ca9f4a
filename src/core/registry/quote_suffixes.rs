//! Preferred quote-asset suffix list, longest-first, used to split
//! concatenated native symbols like `BTCUSDT` with no separator.

pub const PREFERRED_QUOTE_SUFFIXES: &[&str] =
    &["FDUSD", "USDT", "USDC", "TRY", "USD", "EUR", "BTC", "ETH", "BNB"];
