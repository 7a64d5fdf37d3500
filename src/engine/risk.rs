//! Spoilage risk scoring and health classification.
//!
//! The score is an additive penalty model: every term below contributes
//! independently, the sum is clamped to `[0, 100]`. The coefficients encode
//! storage-specific weighting and are part of the data contract shared with
//! every deployed agent.

use serde::{Deserialize, Serialize};

use super::metrics::dew_point;
use crate::thresholds::{RiskTiers, Thresholds};

/// Flat penalty when temperature sits between the critical and ideal minimum.
const CHILL_PENALTY: f64 = 10.0;
/// Flat penalty when the dew point is within the configured margin.
const CONDENSATION_PENALTY: f64 = 40.0;
/// Extra margin (°C) on top of `dewPointDifference` for early warnings.
const CONDENSATION_PROXIMITY_MARGIN: f64 = 1.0;

// ---

/// Four-level health classification, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthClass {
    Good,
    Caution,
    Warning,
    Critical,
}

impl HealthClass {
    // ---
    pub fn as_str(&self) -> &'static str {
        // ---
        match self {
            HealthClass::Good => "GOOD",
            HealthClass::Caution => "CAUTION",
            HealthClass::Warning => "WARNING",
            HealthClass::Critical => "CRITICAL",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        // ---
        match value {
            "GOOD" => Some(HealthClass::Good),
            "CAUTION" => Some(HealthClass::Caution),
            "WARNING" => Some(HealthClass::Warning),
            "CRITICAL" => Some(HealthClass::Critical),
            _ => None,
        }
    }
}

/// Compute the spoilage risk score for one sample.
pub fn score(temperature: f64, humidity: f64, thresholds: &Thresholds) -> f64 {
    // ---
    let t = &thresholds.temperature;
    let h = &thresholds.humidity;
    let mut risk = 0.0;

    // Temperature: warm side
    if temperature > t.critical_max {
        risk += (temperature - t.critical_max) * 4.0;
    } else if temperature > t.warning_max {
        risk += (temperature - t.warning_max) * 2.0;
    }

    // Temperature: cold side
    if temperature < t.critical_min {
        risk += (t.critical_min - temperature) * 3.0;
    } else if temperature < t.ideal_min {
        risk += CHILL_PENALTY;
    }

    // Sprouting risk, stacks with the terms above
    if temperature > t.ideal_max {
        risk += (temperature - t.ideal_max) * 1.5;
    }

    // Humidity
    if humidity < h.warning_min {
        risk += (h.warning_min - humidity) * 2.0;
    }
    if humidity > h.critical_max {
        risk += (humidity - h.critical_max) * 5.0;
    } else if humidity > h.ideal_max {
        risk += (humidity - h.ideal_max) * 2.0;
    }

    // Condensation
    let dp = dew_point(temperature, humidity);
    if dp > temperature - thresholds.condensation.dew_point_difference {
        risk += CONDENSATION_PENALTY;
    }

    risk.clamp(0.0, 100.0)
}

/// Map a risk score to a health class using the ascending risk tiers.
pub fn classify(score: f64, tiers: &RiskTiers) -> HealthClass {
    // ---
    if score < tiers.low {
        HealthClass::Good
    } else if score < tiers.medium {
        HealthClass::Caution
    } else if score < tiers.high {
        HealthClass::Warning
    } else {
        HealthClass::Critical
    }
}

/// True when the dew point is getting close to the air temperature, a
/// little before the condensation penalty kicks in.
pub fn condensation_proximity(temperature: f64, dew_point: f64, thresholds: &Thresholds) -> bool {
    // ---
    temperature - dew_point
        < thresholds.condensation.dew_point_difference + CONDENSATION_PROXIMITY_MARGIN
}
