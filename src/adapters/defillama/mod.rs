//! DefiLlama Adapter
//!
//! Implementation of the DefiSource port: TVL, DEX volumes, protocol fees,
//! yields, stablecoins and coin prices from the public DefiLlama APIs.

mod client;
mod types;

pub use client::{
    select_pools, DefiLlamaClient, DefiLlamaConfig, DEFAULT_BASE_URL, DEFAULT_COINS_URL,
    DEFAULT_STABLECOINS_URL, DEFAULT_YIELDS_URL,
};
pub use types::{LlamaPool, LlamaProtocol, LlamaProtocolDetail};
