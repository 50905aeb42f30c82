//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the provider ports:
//! - Binance / CoinGecko: spot prices, candles and movers
//! - DefiLlama: TVL, DEX volumes, yields and stablecoins
//! - Fear & Greed: alternative.me sentiment index
//! - Moralis: wallet holdings and history
//! - Etherscan: ETH balances and gas oracle
//! - CLI: Command-line interface handlers

pub mod http;
pub mod binance;
pub mod coingecko;
pub mod defillama;
pub mod fear_greed;
pub mod moralis;
pub mod etherscan;
pub mod cli;

pub use binance::BinanceClient;
pub use coingecko::CoinGeckoClient;
pub use defillama::DefiLlamaClient;
pub use fear_greed::FearGreedClient;
pub use moralis::MoralisClient;
pub use etherscan::EtherscanClient;
pub use cli::CliApp;
