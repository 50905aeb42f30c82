//! Moralis Adapter
//!
//! Implementation of the WalletSource port for the Moralis wallet API.

mod client;
mod types;

pub use client::{MoralisClient, MoralisConfig, API_KEY_ENV, DEFAULT_BASE_URL};
pub use types::DUST_THRESHOLD_USD;
