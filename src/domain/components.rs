//! Composite Component Producers
//!
//! Each producer turns already-fetched provider records into one clamped
//! [`CompositeComponent`]. When an input is missing or unusable the producer
//! hands back the neutral score with the reason in `note`, so the scorer only
//! ever sees numbers.

use super::records::{Candle, FearGreedWindow};
use super::scoring::{
    round1, score_bounded, score_percent_change, score_ratio, CompositeComponent, HISTORICAL,
    ONCHAIN, SENTIMENT, SOCIAL,
};

/// Daily candles requested for the historical and on-chain components
pub const HISTORY_DAYS: u32 = 30;

/// Trailing window requested from the sentiment feed
pub const SENTIMENT_WINDOW: u32 = 7;

/// Recent window for the volume ratio
const RECENT_VOLUME_DAYS: usize = 7;

/// Historical momentum: first-to-last close change over the window
pub fn historical(candles: &[Candle], weight: f64) -> CompositeComponent {
    let (first, last) = match (candles.first(), candles.last()) {
        (Some(first), Some(last)) if candles.len() >= 2 => (first.close, last.close),
        _ => {
            return CompositeComponent::neutral(
                HISTORICAL,
                weight,
                format!("need at least 2 candles, got {}", candles.len()),
            )
        }
    };

    if first <= 0.0 {
        return CompositeComponent::neutral(HISTORICAL, weight, "opening close is not positive");
    }

    let change_pct = (last - first) / first * 100.0;
    CompositeComponent::new(HISTORICAL, weight, round1(score_percent_change(change_pct)))
        .with_note(format!("{}d price change {:+.2}%", candles.len(), change_pct))
}

/// Volume activity: average of the last seven bars against the window mean
///
/// The recent sum is divided by seven even when fewer bars exist.
pub fn onchain(candles: &[Candle], weight: f64) -> CompositeComponent {
    if candles.is_empty() {
        return CompositeComponent::neutral(ONCHAIN, weight, "no volume data");
    }

    let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();
    let recent_start = volumes.len().saturating_sub(RECENT_VOLUME_DAYS);
    let recent_avg = volumes[recent_start..].iter().sum::<f64>() / RECENT_VOLUME_DAYS as f64;
    let window_avg = volumes.iter().sum::<f64>() / volumes.len() as f64;
    let ratio = if window_avg > 0.0 { recent_avg / window_avg } else { 1.0 };

    CompositeComponent::new(ONCHAIN, weight, round1(score_ratio(ratio)))
        .with_note(format!("7d/{}d volume ratio {:.2}x", volumes.len(), ratio))
}

/// Market sentiment: today's fear & greed value as-is
pub fn sentiment(window: &FearGreedWindow, weight: f64) -> CompositeComponent {
    let Some(current) = window.current() else {
        return CompositeComponent::neutral(SENTIMENT, weight, "sentiment window is empty");
    };

    let trend = window.trend().unwrap_or(0.0);
    CompositeComponent::new(SENTIMENT, weight, round1(score_bounded(current.value as f64)))
        .with_note(format!(
            "fear & greed {} ({}), {}d trend {:+.1}",
            current.value,
            current.label,
            window.readings.len(),
            trend
        ))
}

/// Social activity has no provider; always neutral
pub fn social(weight: f64) -> CompositeComponent {
    CompositeComponent::neutral(SOCIAL, weight, "no social feed configured, neutral placeholder")
}
