//! Composite Mood Index Service
//!
//! Fetches the candle history and sentiment window for a token through the
//! aggregator, turns them into weighted components and scores them. Any
//! input that fails to arrive degrades its components to the neutral score,
//! so a mood index is always produced.

use crate::domain::components::{self, HISTORY_DAYS, SENTIMENT_WINDOW};
use crate::domain::records::{Candle, FearGreedWindow};
use crate::domain::scoring::{
    ComponentWeights, CompositeComponent, CompositeIndex, CompositeScorer, HISTORICAL, ONCHAIN,
    SENTIMENT,
};
use crate::ports::provider::{Interval, ProviderResult};

use super::aggregator::{FanOutAggregator, FetchRequest};

/// Builds composite indices from provider results
#[derive(Debug, Clone, Default)]
pub struct MoodIndexService {
    scorer: CompositeScorer,
    weights: ComponentWeights,
}

impl MoodIndexService {
    pub fn new(scorer: CompositeScorer, weights: ComponentWeights) -> Self {
        Self { scorer, weights }
    }

    pub fn weights(&self) -> &ComponentWeights {
        &self.weights
    }

    pub fn scorer(&self) -> &CompositeScorer {
        &self.scorer
    }

    /// Inputs needed for `token`: daily candles, then the sentiment window
    pub fn requests(token: &str) -> [FetchRequest; 2] {
        [
            FetchRequest::ohlcv(token, Interval::OneDay, HISTORY_DAYS),
            FetchRequest::FearGreed {
                limit: SENTIMENT_WINDOW,
            },
        ]
    }

    /// Fetch inputs concurrently and score them
    pub async fn compute(&self, aggregator: &FanOutAggregator, token: &str) -> CompositeIndex {
        let mut results = aggregator.fetch_all(&Self::requests(token)).await.into_iter();

        // fetch_all returns exactly one result per request
        let candles = results.next().map(|r| r.typed::<Vec<Candle>>());
        let sentiment = results.next().map(|r| r.typed::<FearGreedWindow>());

        let index = self.assemble(candles, sentiment);
        tracing::info!(
            "Mood index for {}: {:.1} ({}) - {}",
            token,
            index.score,
            index.classification.label,
            index.signal.label
        );
        index
    }

    /// Score whatever inputs arrived; missing or failed inputs are neutral
    pub fn assemble(
        &self,
        candles: Option<ProviderResult<Vec<Candle>>>,
        sentiment: Option<ProviderResult<FearGreedWindow>>,
    ) -> CompositeIndex {
        let w = &self.weights;
        let mut parts = vec![components::social(w.social)];

        match candles.map(ProviderResult::into_outcome) {
            Some(Ok(candles)) => {
                parts.push(components::onchain(&candles, w.onchain));
                parts.push(components::historical(&candles, w.historical));
            }
            Some(Err(e)) => {
                tracing::warn!("Candle history unavailable, onchain and historical neutral: {}", e);
                let reason = format!("candles unavailable: {}", e);
                parts.push(CompositeComponent::neutral(ONCHAIN, w.onchain, reason.clone()));
                parts.push(CompositeComponent::neutral(HISTORICAL, w.historical, reason));
            }
            None => {
                parts.push(CompositeComponent::neutral(ONCHAIN, w.onchain, "candles not requested"));
                parts.push(CompositeComponent::neutral(HISTORICAL, w.historical, "candles not requested"));
            }
        }

        match sentiment.map(ProviderResult::into_outcome) {
            Some(Ok(window)) => parts.push(components::sentiment(&window, w.sentiment)),
            Some(Err(e)) => {
                tracing::warn!("Sentiment unavailable, component neutral: {}", e);
                parts.push(CompositeComponent::neutral(
                    SENTIMENT,
                    w.sentiment,
                    format!("sentiment unavailable: {}", e),
                ));
            }
            None => parts.push(CompositeComponent::neutral(SENTIMENT, w.sentiment, "sentiment not requested")),
        }

        // Display order: social, onchain, sentiment, historical
        parts.sort_by_key(|c| {
            w.entries()
                .iter()
                .position(|(name, _)| *name == c.name)
                .unwrap_or(usize::MAX)
        });

        self.scorer.score(parts)
    }
}
