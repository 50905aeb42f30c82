//! Composite Mood Scoring
//!
//! Turns normalized component scores into one bounded index.
//!
//! Normalization (heuristic, reproduced as-is):
//! - signed percentage change `p` -> `clamp(50 + p, 0, 100)`
//! - ratio `r` -> `clamp(r * 50, 0, 100)`
//! - an index already on 0..=100 passes through
//!
//! Composite = sum of `raw_score * weight`, clamped to 0..=100 and rounded to
//! one decimal. Classification and signal labels come from ordered band
//! tables, evaluated high to low.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Score substituted for any component whose inputs could not be fetched
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Tolerance on the weight sum
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

pub const SOCIAL: &str = "social";
pub const ONCHAIN: &str = "onchain";
pub const SENTIMENT: &str = "sentiment";
pub const HISTORICAL: &str = "historical";

/// Scoring configuration errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Weight for '{name}' must be within 0..=1, got {weight}")]
    WeightOutOfRange { name: String, weight: f64 },
    #[error("Weights must sum to 1.0, got {0}")]
    WeightSum(f64),
    #[error("Missing weight for component '{0}'")]
    MissingWeight(String),
    #[error("Unknown component '{0}'")]
    UnknownComponent(String),
    #[error("Invalid band table: {0}")]
    InvalidBands(String),
}

/// Map a signed percentage change onto 0..=100, neutral at 50
pub fn score_percent_change(pct: f64) -> f64 {
    (NEUTRAL_SCORE + pct).clamp(0.0, 100.0)
}

/// Map a ratio onto 0..=100; 1.0 is neutral, 2.0 saturates
pub fn score_ratio(ratio: f64) -> f64 {
    (ratio * 50.0).clamp(0.0, 100.0)
}

/// An index already expressed on 0..=100
pub fn score_bounded(value: f64) -> f64 {
    value
}

/// Round half away from zero to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// One weighted input to the composite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeComponent {
    pub name: String,
    pub weight: f64,
    /// Already clamped to 0..=100 by the producer
    pub raw_score: f64,
    pub note: Option<String>,
}

impl CompositeComponent {
    pub fn new(name: impl Into<String>, weight: f64, raw_score: f64) -> Self {
        Self {
            name: name.into(),
            weight,
            raw_score,
            note: None,
        }
    }

    /// Neutral stand-in for a component that could not be computed
    pub fn neutral(name: impl Into<String>, weight: f64, reason: impl Into<String>) -> Self {
        Self::new(name, weight, NEUTRAL_SCORE).with_note(reason)
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Contribution to the weighted sum
    pub fn contribution(&self) -> f64 {
        self.raw_score * self.weight
    }
}

/// Validated component weights (checked once, at construction)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentWeights {
    pub social: f64,
    pub onchain: f64,
    pub sentiment: f64,
    pub historical: f64,
}

impl ComponentWeights {
    pub fn new(social: f64, onchain: f64, sentiment: f64, historical: f64) -> Result<Self, ScoringError> {
        let weights = Self {
            social,
            onchain,
            sentiment,
            historical,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Build from `name=value` pairs; all four components are required
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, ScoringError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let (mut social, mut onchain, mut sentiment, mut historical) = (None, None, None, None);
        for (name, weight) in pairs {
            match name.trim().to_ascii_lowercase().as_str() {
                SOCIAL => social = Some(weight),
                ONCHAIN => onchain = Some(weight),
                SENTIMENT => sentiment = Some(weight),
                HISTORICAL => historical = Some(weight),
                other => return Err(ScoringError::UnknownComponent(other.to_string())),
            }
        }

        let require = |w: Option<f64>, name: &str| w.ok_or_else(|| ScoringError::MissingWeight(name.to_string()));
        Self::new(
            require(social, SOCIAL)?,
            require(onchain, ONCHAIN)?,
            require(sentiment, SENTIMENT)?,
            require(historical, HISTORICAL)?,
        )
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        for (name, weight) in self.entries() {
            if !(0.0..=1.0).contains(&weight) {
                return Err(ScoringError::WeightOutOfRange {
                    name: name.to_string(),
                    weight,
                });
            }
        }

        let sum: f64 = self.entries().iter().map(|(_, w)| w).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ScoringError::WeightSum(sum));
        }
        Ok(())
    }

    /// Weights in display order
    pub fn entries(&self) -> [(&'static str, f64); 4] {
        [
            (SOCIAL, self.social),
            (ONCHAIN, self.onchain),
            (SENTIMENT, self.sentiment),
            (HISTORICAL, self.historical),
        ]
    }
}

impl Default for ComponentWeights {
    fn default() -> Self {
        Self {
            social: 0.30,
            onchain: 0.30,
            sentiment: 0.20,
            historical: 0.20,
        }
    }
}

/// Lower bound and label of one band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub label: String,
}

impl Band {
    pub fn new(min: f64, label: impl Into<String>) -> Self {
        Self {
            min,
            label: label.into(),
        }
    }
}

/// Ordered, non-overlapping thresholds; the first band whose `min` the score
/// reaches wins
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandTable {
    bands: Vec<Band>,
}

impl BandTable {
    /// Sorts bands high to low and checks the table covers every score >= 0
    pub fn new(mut bands: Vec<Band>) -> Result<Self, ScoringError> {
        if bands.is_empty() {
            return Err(ScoringError::InvalidBands("table is empty".into()));
        }
        if bands.iter().any(|b| !b.min.is_finite()) {
            return Err(ScoringError::InvalidBands("thresholds must be finite".into()));
        }

        bands.sort_by(|a, b| b.min.total_cmp(&a.min));

        if bands.windows(2).any(|w| w[0].min == w[1].min) {
            return Err(ScoringError::InvalidBands("duplicate threshold".into()));
        }
        if let Some(lowest) = bands.last() {
            if lowest.min > 0.0 {
                return Err(ScoringError::InvalidBands(format!(
                    "lowest threshold {} leaves scores below it unlabeled",
                    lowest.min
                )));
            }
        }

        Ok(Self { bands })
    }

    /// Fear/greed classification bands
    pub fn default_classification() -> Self {
        Self {
            bands: vec![
                Band::new(80.0, "Extreme Greed"),
                Band::new(65.0, "Greed"),
                Band::new(50.0, "Neutral-Bullish"),
                Band::new(35.0, "Neutral-Bearish"),
                Band::new(20.0, "Fear"),
                Band::new(0.0, "Extreme Fear"),
            ],
        }
    }

    /// Contrarian trading-signal bands
    pub fn default_signal() -> Self {
        Self {
            bands: vec![
                Band::new(75.0, "SELL SIGNAL - market overheated"),
                Band::new(60.0, "CAUTION - greed building"),
                Band::new(40.0, "NEUTRAL - no clear signal"),
                Band::new(25.0, "ACCUMULATE - fear present"),
                Band::new(0.0, "STRONG BUY - extreme fear"),
            ],
        }
    }

    pub fn classify(&self, score: f64) -> &Band {
        self.bands
            .iter()
            .find(|band| score >= band.min)
            .unwrap_or_else(|| &self.bands[self.bands.len() - 1])
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }
}

/// Result of one scoring request; never mutated after creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeIndex {
    pub score: f64,
    pub classification: Band,
    pub signal: Band,
    pub components: Vec<CompositeComponent>,
    pub computed_at: DateTime<Utc>,
}

/// Pure weighted scorer
#[derive(Debug, Clone)]
pub struct CompositeScorer {
    classification: BandTable,
    signal: BandTable,
}

impl CompositeScorer {
    pub fn new(classification: BandTable, signal: BandTable) -> Self {
        Self {
            classification,
            signal,
        }
    }

    /// Score a component set. Total: always returns an index.
    pub fn score(&self, components: Vec<CompositeComponent>) -> CompositeIndex {
        let weighted: f64 = components.iter().map(CompositeComponent::contribution).sum();
        let score = round1(weighted.clamp(0.0, 100.0));

        CompositeIndex {
            score,
            classification: self.classification.classify(score).clone(),
            signal: self.signal.classify(score).clone(),
            components,
            computed_at: Utc::now(),
        }
    }

    pub fn classification_table(&self) -> &BandTable {
        &self.classification
    }

    pub fn signal_table(&self) -> &BandTable {
        &self.signal
    }
}

impl Default for CompositeScorer {
    fn default() -> Self {
        Self::new(BandTable::default_classification(), BandTable::default_signal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn components(scores: [f64; 4]) -> Vec<CompositeComponent> {
        let w = ComponentWeights::default();
        vec![
            CompositeComponent::new(SOCIAL, w.social, scores[0]),
            CompositeComponent::new(ONCHAIN, w.onchain, scores[1]),
            CompositeComponent::new(SENTIMENT, w.sentiment, scores[2]),
            CompositeComponent::new(HISTORICAL, w.historical, scores[3]),
        ]
    }

    #[test]
    fn test_percent_change_normalization() {
        assert_relative_eq!(score_percent_change(20.0), 70.0);
        assert_relative_eq!(score_percent_change(-60.0), 0.0);
        assert_relative_eq!(score_percent_change(75.0), 100.0);
        assert_relative_eq!(score_percent_change(0.0), 50.0);
    }

    #[test]
    fn test_ratio_normalization() {
        assert_relative_eq!(score_ratio(2.0), 100.0);
        assert_relative_eq!(score_ratio(0.5), 25.0);
        assert_relative_eq!(score_ratio(1.0), 50.0);
        assert_relative_eq!(score_ratio(3.5), 100.0);
        assert_relative_eq!(score_ratio(-1.0), 0.0);
    }

    #[test]
    fn test_bounded_passes_through() {
        assert_relative_eq!(score_bounded(37.0), 37.0);
    }

    #[test]
    fn test_all_neutral_scores_fifty() {
        let scorer = CompositeScorer::default();
        let index = scorer.score(components([50.0; 4]));
        assert_eq!(index.score, 50.0);
        assert_eq!(index.classification.label, "Neutral-Bullish");
        assert_eq!(index.signal.label, "NEUTRAL - no clear signal");
    }

    #[test]
    fn test_neutral_substitution_keeps_fifty() {
        let w = ComponentWeights::default();
        let mut parts = components([50.0; 4]);
        parts[2] = CompositeComponent::neutral(SENTIMENT, w.sentiment, "sentiment feed timed out");

        let index = CompositeScorer::default().score(parts);
        assert_eq!(index.score, 50.0);
        assert_eq!(index.components[2].note.as_deref(), Some("sentiment feed timed out"));
    }

    #[test]
    fn test_weighted_sum_rounded() {
        // 0.3*70 + 0.3*25 + 0.2*44 + 0.2*61.3 = 21 + 7.5 + 8.8 + 12.26 = 49.56
        let index = CompositeScorer::default().score(components([70.0, 25.0, 44.0, 61.3]));
        assert_relative_eq!(index.score, 49.6);
        assert_eq!(index.classification.label, "Neutral-Bearish");
    }

    #[test]
    fn test_score_stays_bounded() {
        let scorer = CompositeScorer::default();
        let grid = [0.0, 12.5, 33.3, 50.0, 66.6, 99.9, 100.0];
        for a in grid {
            for b in grid {
                for c in grid {
                    let index = scorer.score(components([a, b, c, 100.0 - a]));
                    assert!((0.0..=100.0).contains(&index.score), "score {}", index.score);
                }
            }
        }
        assert_eq!(scorer.score(components([100.0; 4])).score, 100.0);
        assert_eq!(scorer.score(components([0.0; 4])).score, 0.0);
    }

    #[test]
    fn test_final_sum_is_clamped() {
        let overweight = vec![CompositeComponent::new("x", 1.5, 100.0)];
        assert_eq!(CompositeScorer::default().score(overweight).score, 100.0);
    }

    #[test]
    fn test_classification_boundaries() {
        let table = BandTable::default_classification();
        assert_eq!(table.classify(80.0).label, "Extreme Greed");
        assert_eq!(table.classify(79.9).label, "Greed");
        assert_eq!(table.classify(65.0).label, "Greed");
        assert_eq!(table.classify(50.0).label, "Neutral-Bullish");
        assert_eq!(table.classify(49.9).label, "Neutral-Bearish");
        assert_eq!(table.classify(20.0).label, "Fear");
        assert_eq!(table.classify(19.9).label, "Extreme Fear");
        assert_eq!(table.classify(0.0).label, "Extreme Fear");
    }

    #[test]
    fn test_signal_boundaries() {
        let table = BandTable::default_signal();
        assert_eq!(table.classify(75.0).label, "SELL SIGNAL - market overheated");
        assert_eq!(table.classify(74.9).label, "CAUTION - greed building");
        assert_eq!(table.classify(40.0).label, "NEUTRAL - no clear signal");
        assert_eq!(table.classify(25.0).label, "ACCUMULATE - fear present");
        assert_eq!(table.classify(24.9).label, "STRONG BUY - extreme fear");
    }

    #[test]
    fn test_custom_band_table_is_sorted() {
        let table = BandTable::new(vec![
            Band::new(0.0, "low"),
            Band::new(70.0, "high"),
            Band::new(30.0, "mid"),
        ])
        .unwrap();

        let labels: Vec<_> = table.bands().iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["high", "mid", "low"]);
        assert_eq!(table.classify(69.9).label, "mid");
    }

    #[test]
    fn test_invalid_band_tables() {
        assert!(BandTable::new(vec![]).is_err());
        assert!(BandTable::new(vec![Band::new(10.0, "only")]).is_err());
        assert!(BandTable::new(vec![Band::new(0.0, "a"), Band::new(0.0, "b")]).is_err());
        assert!(BandTable::new(vec![Band::new(f64::NAN, "a")]).is_err());
    }

    #[test]
    fn test_weights_validation() {
        assert!(ComponentWeights::new(0.3, 0.3, 0.2, 0.2).is_ok());
        assert!(ComponentWeights::new(0.25, 0.25, 0.25, 0.25).is_ok());
        assert!(matches!(
            ComponentWeights::new(0.3, 0.3, 0.3, 0.3),
            Err(ScoringError::WeightSum(_))
        ));
        assert!(matches!(
            ComponentWeights::new(1.5, -0.5, 0.0, 0.0),
            Err(ScoringError::WeightOutOfRange { .. })
        ));
    }

    #[test]
    fn test_weights_from_pairs() {
        let weights = ComponentWeights::from_pairs([
            ("Social", 0.4),
            ("onchain", 0.2),
            ("sentiment", 0.2),
            ("historical", 0.2),
        ])
        .unwrap();
        assert_relative_eq!(weights.social, 0.4);

        let missing = ComponentWeights::from_pairs([("social", 1.0)]);
        assert!(matches!(missing, Err(ScoringError::MissingWeight(_))));

        let unknown = ComponentWeights::from_pairs([("vibes", 1.0)]);
        assert!(matches!(unknown, Err(ScoringError::UnknownComponent(_))));
    }
}
