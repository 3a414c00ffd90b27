//! Per-tick price book built from the price source.
//!
//! Position records reference assets by id while the price source keys prices
//! by symbol, so the book resolves id -> symbol -> quote. Invalid prices are
//! dropped at construction and never reach the evaluator.

use chrono::{DateTime, Utc};
use monitor_store::{Asset, AssetId};
use std::collections::HashMap;
use tracing::warn;

use crate::health::SkipReason;

/// Price quote for one symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    /// USD price, always > 0
    pub price: f64,
    /// When the source last wrote the price
    pub updated_at: DateTime<Utc>,
}

/// Immutable snapshot of asset prices.
#[derive(Debug, Clone)]
pub struct PriceBook {
    symbols: HashMap<AssetId, String>,
    quotes: HashMap<String, Quote>,
    as_of: DateTime<Utc>,
}

impl PriceBook {
    /// Build a book from price source records, evaluated at `as_of`.
    pub fn from_assets(assets: impl IntoIterator<Item = Asset>, as_of: DateTime<Utc>) -> Self {
        let mut symbols = HashMap::new();
        let mut quotes = HashMap::new();

        for asset in assets {
            if !asset.price.is_finite() || asset.price <= 0.0 {
                warn!(
                    asset = asset.id,
                    symbol = %asset.symbol,
                    price = asset.price,
                    "Ignoring invalid price"
                );
                continue;
            }

            quotes.insert(
                asset.symbol.clone(),
                Quote {
                    price: asset.price,
                    updated_at: asset.updated_at,
                },
            );
            symbols.insert(asset.id, asset.symbol);
        }

        Self { symbols, quotes, as_of }
    }

    /// Quote for an asset id, if the source knows a valid price for it.
    pub fn quote(&self, asset_id: AssetId) -> Option<Quote> {
        let symbol = self.symbols.get(&asset_id)?;
        self.quotes.get(symbol).copied()
    }

    pub fn symbol(&self, asset_id: AssetId) -> Option<&str> {
        self.symbols.get(&asset_id).map(String::as_str)
    }

    /// Price for an asset, rejecting quotes older than `max_age_secs` when set.
    pub fn price(&self, asset_id: AssetId, max_age_secs: Option<u64>) -> Result<f64, SkipReason> {
        let quote = self.quote(asset_id).ok_or(SkipReason::MissingPrice(asset_id))?;

        if let Some(max_age) = max_age_secs {
            let age = self.as_of.signed_duration_since(quote.updated_at).num_seconds();
            if age > max_age as i64 {
                return Err(SkipReason::StalePrice(asset_id));
            }
        }

        Ok(quote.price)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn asset(id: AssetId, symbol: &str, price: f64, updated_at: DateTime<Utc>) -> Asset {
        Asset {
            id,
            symbol: symbol.to_string(),
            price,
            updated_at,
        }
    }

    #[test]
    fn test_resolves_id_through_symbol() {
        let now = Utc::now();
        let book = PriceBook::from_assets(
            vec![asset(1, "USDC", 1.0, now), asset(2, "ETH", 2000.0, now)],
            now,
        );

        assert_eq!(book.len(), 2);
        assert_eq!(book.symbol(2), Some("ETH"));
        assert_eq!(book.price(2, None), Ok(2000.0));
        assert_eq!(book.price(9, None), Err(SkipReason::MissingPrice(9)));
    }

    #[test]
    fn test_invalid_prices_dropped() {
        let now = Utc::now();
        let book = PriceBook::from_assets(
            vec![
                asset(1, "ZERO", 0.0, now),
                asset(2, "NEG", -5.0, now),
                asset(3, "NAN", f64::NAN, now),
                asset(4, "ETH", 2000.0, now),
            ],
            now,
        );

        assert_eq!(book.len(), 1);
        assert_eq!(book.price(1, None), Err(SkipReason::MissingPrice(1)));
        assert_eq!(book.price(2, None), Err(SkipReason::MissingPrice(2)));
        assert!(book.quote(4).is_some());
    }

    #[test]
    fn test_staleness_is_opt_in() {
        let now = Utc::now();
        let old = now - Duration::seconds(600);
        let book = PriceBook::from_assets(vec![asset(1, "BTC", 40000.0, old)], now);

        assert_eq!(book.price(1, None), Ok(40000.0));
        assert_eq!(book.price(1, Some(900)), Ok(40000.0));
        assert_eq!(book.price(1, Some(300)), Err(SkipReason::StalePrice(1)));
    }
}
