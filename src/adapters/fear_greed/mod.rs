//! Fear & Greed Adapter
//!
//! Implementation of the SentimentSource port for alternative.me.

mod client;

pub use client::{FearGreedClient, FearGreedConfig, FngEntry, FngResponse, DEFAULT_BASE_URL};
