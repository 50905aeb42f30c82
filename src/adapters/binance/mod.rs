//! Binance Adapter
//!
//! Implementation of the PriceSource port for Binance public market data.

mod client;
mod types;

pub use client::{rank_movers, BinanceClient, BinanceConfig, DEFAULT_BASE_URL, MAX_KLINES};
pub use types::Ticker24h;
