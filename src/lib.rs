//! market-mood - Crypto Market Data and Mood Index Library
//!
//! Fans out to public market data providers, caches their answers per
//! source class and blends them into a 0-100 composite mood index.
//!
//! # Modules
//!
//! - `domain`: Core logic (TtlCache, records, component scoring, bands)
//! - `ports`: Provider traits, ProviderResult and ProviderError
//! - `adapters`: HTTP clients per upstream, plus the CLI
//! - `config`: Configuration loading and validation
//! - `application`: Fan-out aggregator, mood index service and engine

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
