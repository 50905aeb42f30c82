//! CoinGecko Types

use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::collections::HashMap;

use crate::domain::records::{Candle, PriceRecord};
use crate::ports::provider::ProviderError;

/// `/simple/price` body, keyed by coin id
pub type SimplePriceResponse = HashMap<String, SimplePrice>;

#[derive(Debug, Clone, Deserialize)]
pub struct SimplePrice {
    pub usd: Option<f64>,
    pub usd_24h_change: Option<f64>,
    pub usd_24h_vol: Option<f64>,
}

impl SimplePrice {
    pub fn into_price(self, symbol: &str) -> Result<PriceRecord, ProviderError> {
        let price = self
            .usd
            .ok_or_else(|| ProviderError::malformed("simple price missing usd"))?;
        let change_24h_pct = self
            .usd_24h_change
            .ok_or_else(|| ProviderError::malformed("simple price missing usd_24h_change"))?;
        let volume_24h_usd = self
            .usd_24h_vol
            .ok_or_else(|| ProviderError::malformed("simple price missing usd_24h_vol"))?;

        Ok(PriceRecord {
            symbol: symbol.to_string(),
            price,
            change_24h_pct,
            high_24h: None,
            low_24h: None,
            volume_24h_usd,
        })
    }
}

/// `/coins/{id}/market_chart` body: `[ms, value]` pairs
#[derive(Debug, Clone, Deserialize)]
pub struct MarketChart {
    pub prices: Vec<(f64, f64)>,
    #[serde(default)]
    pub total_volumes: Vec<(f64, f64)>,
}

impl MarketChart {
    /// Synthesize flat candles from price points, oldest first
    ///
    /// Each point becomes a bar with open = high = low = close. Volume is
    /// matched by position and zero when the volume series is shorter.
    pub fn into_candles(self) -> Result<Vec<Candle>, ProviderError> {
        self.prices
            .iter()
            .enumerate()
            .map(|(idx, &(ms, price))| {
                let open_time = Utc
                    .timestamp_millis_opt(ms as i64)
                    .single()
                    .ok_or_else(|| ProviderError::malformed(format!("chart timestamp {} out of range", ms)))?;
                let volume = self.total_volumes.get(idx).map(|&(_, v)| v).unwrap_or(0.0);

                Ok(Candle {
                    open_time,
                    open: price,
                    high: price,
                    low: price,
                    close: price,
                    volume,
                })
            })
            .collect()
    }
}
