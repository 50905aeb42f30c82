//! CoinGecko Adapter
//!
//! Alternate PriceSource implementation backed by the CoinGecko public API.

mod client;
mod types;

pub use client::{CoinGeckoClient, CoinGeckoConfig, DEFAULT_BASE_URL};
pub use types::{MarketChart, SimplePrice};
