//! Configuration Module
//!
//! Loads and validates configuration from TOML files and the environment.

pub mod loader;

pub use loader::{
    load_config, parse_weights, resolve_config, Config, ConfigError, PriceProvider,
};
