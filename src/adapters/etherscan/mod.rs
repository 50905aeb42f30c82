//! Etherscan Adapter
//!
//! Implementation of the ChainSource port for Ethereum mainnet.

mod client;
mod types;

pub use client::{EtherscanClient, EtherscanConfig, API_KEY_ENV, DEFAULT_BASE_URL};
pub use types::{Envelope, GasOracleResult};
