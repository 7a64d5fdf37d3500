//! Composite confidence estimate for a prediction.

use serde::{Deserialize, Serialize};

use super::patterns::PatternReport;
use super::trend::TrendReport;

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confidence {
    // ---
    pub score: u32,
    pub level: ConfidenceLevel,
    /// Human-readable justification, not used in further computation.
    pub factors: Vec<String>,
}

impl ConfidenceLevel {
    // ---
    pub fn from_score(score: u32) -> Self {
        // ---
        if score >= 70 {
            ConfidenceLevel::High
        } else if score >= 40 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

pub fn assess(sample_count: usize, trends: &TrendReport, patterns: &PatternReport) -> Confidence {
    // ---
    let mut score = 0;
    let mut factors = Vec::new();

    if sample_count > 20 {
        score += 40;
        factors.push(format!("Large sample ({sample_count} readings)"));
    } else if sample_count > 10 {
        score += 25;
        factors.push(format!("Moderate sample ({sample_count} readings)"));
    } else {
        score += 10;
        factors.push(format!("Limited sample ({sample_count} readings)"));
    }

    let clear = trends.directional_count();
    if clear >= 2 {
        score += 30;
        factors.push(format!("{clear} metrics show a clear trend"));
    } else if clear >= 1 {
        score += 15;
        factors.push("One metric shows a clear trend".to_string());
    }

    if patterns.any() {
        score += 20;
        factors.push("Recognized pattern detected".to_string());
    }

    score += 10;
    factors.push("Consistent sampling".to_string());

    Confidence {
        score,
        level: ConfidenceLevel::from_score(score),
        factors,
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::engine::trend::{MetricTrend, Trend};

    fn trends(labels: [Trend; 4]) -> TrendReport {
        // ---
        let m = |trend| MetricTrend { trend, slope: None };
        TrendReport {
            temperature: m(labels[0]),
            humidity: m(labels[1]),
            risk: m(labels[2]),
            gas: m(labels[3]),
        }
    }

    #[test]
    fn test_minimum_score_is_low() {
        // ---
        let c = assess(2, &trends([Trend::InsufficientData; 4]), &PatternReport::default());
        assert_eq!(c.score, 20);
        assert_eq!(c.level, ConfidenceLevel::Low);
        assert_eq!(c.factors.len(), 2);
    }

    #[test]
    fn test_maximum_score_is_high() {
        // ---
        let patterns = PatternReport {
            temperature_spike: true,
            ..PatternReport::default()
        };
        let c = assess(
            30,
            &trends([Trend::Rising, Trend::Falling, Trend::Stable, Trend::Stable]),
            &patterns,
        );
        assert_eq!(c.score, 100);
        assert_eq!(c.level, ConfidenceLevel::High);
    }

    #[test]
    fn test_single_trend_and_moderate_volume() {
        // ---
        let c = assess(
            15,
            &trends([Trend::Stable, Trend::Stable, Trend::RisingRapidly, Trend::Stable]),
            &PatternReport::default(),
        );
        assert_eq!(c.score, 25 + 15 + 10);
        assert_eq!(c.level, ConfidenceLevel::Medium);
    }

    #[test]
    fn test_non_decreasing_in_sample_count() {
        // ---
        let t = trends([Trend::Stable; 4]);
        let p = PatternReport::default();
        let scores: Vec<u32> = [10, 25, 50].iter().map(|n| assess(*n, &t, &p).score).collect();
        assert!(scores.windows(2).all(|w| w[0] <= w[1]), "{scores:?}");
    }
}
