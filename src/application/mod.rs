//! Application Layer
//!
//! Fan-out aggregation, the mood index service and the engine facade that
//! ties them to configured providers.

pub mod aggregator;
pub mod composite;
pub mod engine;

pub use aggregator::{
    AggregatorConfig, FanOutAggregator, FetchRequest, Providers, TtlClass, TtlPolicy,
};
pub use composite::MoodIndexService;
pub use engine::{EngineError, EngineSettings, MarketEngine};
