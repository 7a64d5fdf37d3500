//! Rule-based recommendations for the storage operator.
//!
//! Every rule is an independent predicate; all matching rules fire and none
//! suppresses another. The result is stable-sorted by priority so rules of
//! equal priority keep their evaluation order.

use serde::{Deserialize, Serialize};

use super::patterns::PatternReport;
use super::predictor::Prediction;
use super::risk::condensation_proximity;
use super::trend::{Trend, TrendReport};
use crate::models::Reading;
use crate::thresholds::Thresholds;

// ---

/// Ordered so that sorting ascending puts the most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    // ---
    pub priority: Priority,
    pub message: String,
    pub action: String,
}

/// Everything a rule may look at.
pub struct RuleInput<'a> {
    // ---
    pub latest: &'a Reading,
    pub trends: &'a TrendReport,
    pub patterns: &'a PatternReport,
    pub prediction: &'a Prediction,
    pub thresholds: &'a Thresholds,
}

fn rec(priority: Priority, message: String, action: &str) -> Recommendation {
    // ---
    Recommendation {
        priority,
        message,
        action: action.to_string(),
    }
}

pub fn recommend(input: &RuleInput<'_>) -> Vec<Recommendation> {
    // ---
    let RuleInput {
        latest,
        trends,
        patterns,
        prediction,
        thresholds,
    } = input;
    let t = &thresholds.temperature;
    let h = &thresholds.humidity;
    let mut out = Vec::new();

    if latest.temperature < t.critical_min {
        out.push(rec(
            Priority::Critical,
            format!(
                "Freezing risk: {:.1}°C is below the critical minimum of {:.1}°C",
                latest.temperature, t.critical_min
            ),
            "Add heating or insulation immediately",
        ));
    }

    if latest.spoilage_risk > thresholds.spoilage_risk.high {
        out.push(rec(
            Priority::Critical,
            format!("Spoilage risk is {:.0}", latest.spoilage_risk),
            "Inspect the stored product now and remove affected units",
        ));
    }

    if let Some(forecast) = prediction.forecast() {
        if forecast.predicted_risk > thresholds.spoilage_risk.high {
            out.push(rec(
                Priority::High,
                format!(
                    "Risk projected to reach {:.0} within {} samples",
                    forecast.predicted_risk, forecast.horizon_samples
                ),
                "Correct storage conditions before the risk materializes",
            ));
        }
    }

    if latest.temperature > t.ideal_max {
        out.push(rec(
            Priority::High,
            format!(
                "Temperature {:.1}°C is above the ideal maximum of {:.1}°C",
                latest.temperature, t.ideal_max
            ),
            "Increase cooling or ventilation",
        ));
    }

    if latest.humidity < h.ideal_min {
        out.push(rec(
            Priority::High,
            format!(
                "Humidity {:.0}% is below the ideal minimum of {:.0}%",
                latest.humidity, h.ideal_min
            ),
            "Humidify to prevent shrinkage and weight loss",
        ));
    } else if latest.humidity > h.ideal_max {
        out.push(rec(
            Priority::High,
            format!(
                "Humidity {:.0}% is above the ideal maximum of {:.0}%",
                latest.humidity, h.ideal_max
            ),
            "Ventilate or dehumidify to limit rot",
        ));
    }

    if condensation_proximity(latest.temperature, latest.dew_point, thresholds) {
        out.push(rec(
            Priority::Medium,
            format!(
                "Condensation risk: dew point {:.1}°C is close to {:.1}°C",
                latest.dew_point, latest.temperature
            ),
            "Improve air circulation and avoid temperature swings",
        ));
    }

    if latest.gas_level > thresholds.air_quality.poor {
        out.push(rec(
            Priority::Medium,
            format!("Poor air quality (gas level {:.0})", latest.gas_level),
            "Ventilate and check for decaying product",
        ));
    }

    if trends.risk.trend.is_rising() {
        out.push(rec(
            Priority::Medium,
            "Spoilage risk is trending upward".to_string(),
            "Review recent changes to storage conditions",
        ));
    }

    if patterns.any_spike() || patterns.accelerating_risk {
        out.push(rec(
            Priority::Medium,
            "Unusual change pattern in recent readings".to_string(),
            "Check doors, cooling equipment and sensor placement",
        ));
    }

    if trends.risk.trend == Trend::InsufficientData {
        out.push(rec(
            Priority::Low,
            "Not enough history for trend analysis".to_string(),
            "Keep the unit reporting to build up history",
        ));
    }

    // Informational only, never next to an actual finding
    let nominal = out.is_empty()
        && (t.ideal_min..=t.ideal_max).contains(&latest.temperature)
        && (h.ideal_min..=h.ideal_max).contains(&latest.humidity)
        && latest.gas_level < thresholds.air_quality.moderate
        && latest.spoilage_risk < thresholds.spoilage_risk.low;
    if nominal {
        out.push(rec(
            Priority::Low,
            "All metrics within ideal ranges".to_string(),
            "No action needed",
        ));
    }

    // Vec::sort_by_key is stable
    out.sort_by_key(|r| r.priority);
    out
}
