//! Binance Types
//!
//! Wire shapes for the public market-data endpoints. Binance encodes every
//! number as a decimal string; conversion to canonical records happens here.

use chrono::{TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::adapters::http::parse_decimal;
use crate::domain::records::{Candle, Mover, PriceRecord};
use crate::ports::provider::ProviderError;

/// `/ticker/24hr` entry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24h {
    pub symbol: String,
    pub last_price: String,
    pub price_change_percent: String,
    pub high_price: String,
    pub low_price: String,
    /// Volume in the quote asset (USDT)
    pub quote_volume: String,
}

impl Ticker24h {
    /// Canonical price record labelled with the caller's symbol
    pub fn into_price(self, symbol: &str) -> Result<PriceRecord, ProviderError> {
        Ok(PriceRecord {
            symbol: symbol.to_string(),
            price: parse_decimal("lastPrice", &self.last_price)?,
            change_24h_pct: parse_decimal("priceChangePercent", &self.price_change_percent)?,
            high_24h: Some(parse_decimal("highPrice", &self.high_price)?),
            low_24h: Some(parse_decimal("lowPrice", &self.low_price)?),
            volume_24h_usd: parse_decimal("quoteVolume", &self.quote_volume)?,
        })
    }

    /// Mover entry for a USDT pair; `None` for other quotes or unparsable rows
    pub fn to_mover(&self) -> Option<Mover> {
        let base = self.symbol.strip_suffix("USDT")?;
        if base.is_empty() {
            return None;
        }

        Some(Mover {
            symbol: base.to_string(),
            change_24h_pct: parse_decimal("priceChangePercent", &self.price_change_percent).ok()?,
            price: parse_decimal("lastPrice", &self.last_price).ok()?,
            volume_24h_usd: parse_decimal("quoteVolume", &self.quote_volume).ok()?,
        })
    }
}

/// `/klines` row: `[openTime, open, high, low, close, volume, closeTime, ...]`
pub type RawKline = Vec<Value>;

fn decimal_at(row: &[Value], idx: usize, field: &str) -> Result<f64, ProviderError> {
    match row.get(idx) {
        Some(Value::String(raw)) => parse_decimal(field, raw),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| ProviderError::malformed(format!("kline {} out of range", field))),
        _ => Err(ProviderError::malformed(format!("kline missing {}", field))),
    }
}

/// Convert one kline row into a candle
pub fn parse_kline(row: &[Value]) -> Result<Candle, ProviderError> {
    let open_ms = row
        .first()
        .and_then(Value::as_i64)
        .ok_or_else(|| ProviderError::malformed("kline missing open time"))?;

    let open_time = Utc
        .timestamp_millis_opt(open_ms)
        .single()
        .ok_or_else(|| ProviderError::malformed(format!("kline open time {} out of range", open_ms)))?;

    Ok(Candle {
        open_time,
        open: decimal_at(row, 1, "open")?,
        high: decimal_at(row, 2, "high")?,
        low: decimal_at(row, 3, "low")?,
        close: decimal_at(row, 4, "close")?,
        volume: decimal_at(row, 5, "volume")?,
    })
}
