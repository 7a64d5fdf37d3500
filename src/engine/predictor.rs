//! Short-horizon extrapolation of the risk trajectory.
//!
//! The forecast is linear in the latest per-sample risk change. It is a
//! deliberately simple estimate meant to answer "how long until this unit
//! goes critical if nothing changes".

use serde::{Deserialize, Serialize};

use super::confidence::{self, Confidence};
use super::patterns::PatternReport;
use super::risk::condensation_proximity;
use super::trend::TrendReport;
use crate::models::Reading;
use crate::thresholds::Thresholds;

/// Number of sampling intervals the predicted risk looks ahead.
pub const HORIZON_SAMPLES: u32 = 6;

const TEMPERATURE_DELTA: f64 = 0.5;
const HUMIDITY_DELTA: f64 = 2.0;
const GAS_DELTA: f64 = 20.0;

// ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Prediction {
    /// Fewer than two readings: no rate of change exists yet.
    NeedMoreData,
    Forecast(Forecast),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    // ---
    pub current_risk: f64,
    /// Risk change between the two most recent readings.
    pub risk_rate: f64,
    pub predicted_risk: f64,
    pub horizon_samples: u32,
    /// Samples until the alarm threshold is reached, only while risk rises.
    pub time_to_critical_samples: Option<u32>,
    pub time_to_critical_secs: Option<u64>,
    pub reasoning: Vec<String>,
    pub confidence: Confidence,
}

impl Prediction {
    // ---
    pub fn forecast(&self) -> Option<&Forecast> {
        // ---
        match self {
            Prediction::Forecast(f) => Some(f),
            Prediction::NeedMoreData => None,
        }
    }
}

pub fn predict(
    window: &[Reading],
    thresholds: &Thresholds,
    trends: &TrendReport,
    patterns: &PatternReport,
) -> Prediction {
    // ---
    let [.., previous, latest] = window else {
        return Prediction::NeedMoreData;
    };

    let risk_rate = latest.spoilage_risk - previous.spoilage_risk;
    let predicted_risk =
        (latest.spoilage_risk + risk_rate * f64::from(HORIZON_SAMPLES)).clamp(0.0, 100.0);

    let time_to_critical_samples = time_to_critical(
        latest.spoilage_risk,
        risk_rate,
        thresholds.alerts.critical_risk_threshold,
    );
    let time_to_critical_secs = time_to_critical_samples
        .map(|samples| u64::from(samples) * thresholds.data_collection.sample_interval);

    Prediction::Forecast(Forecast {
        current_risk: latest.spoilage_risk,
        risk_rate,
        predicted_risk,
        horizon_samples: HORIZON_SAMPLES,
        time_to_critical_samples,
        time_to_critical_secs,
        reasoning: reasoning(previous, latest, thresholds),
        confidence: confidence::assess(window.len(), trends, patterns),
    })
}

/// Samples until `critical` is reached at the current rate. Undefined when
/// risk is flat or falling.
pub fn time_to_critical(latest: f64, rate: f64, critical: f64) -> Option<u32> {
    // ---
    if rate <= 0.0 {
        return None;
    }
    let samples = ((critical - latest) / rate).round().max(1.0);
    Some(samples.min(f64::from(u32::MAX)) as u32)
}

fn reasoning(previous: &Reading, latest: &Reading, thresholds: &Thresholds) -> Vec<String> {
    // ---
    let mut reasons = Vec::new();

    let d_temp = latest.temperature - previous.temperature;
    if d_temp > TEMPERATURE_DELTA {
        reasons.push(format!("Temperature rising ({d_temp:+.1}°C per sample)"));
    } else if d_temp < -TEMPERATURE_DELTA {
        reasons.push(format!("Temperature falling ({d_temp:+.1}°C per sample)"));
    }

    let d_humidity = latest.humidity - previous.humidity;
    if d_humidity > HUMIDITY_DELTA {
        reasons.push(format!("Humidity rising ({d_humidity:+.1}% per sample)"));
    } else if d_humidity < -HUMIDITY_DELTA {
        reasons.push(format!("Humidity falling ({d_humidity:+.1}% per sample)"));
    }

    let d_gas = latest.gas_level - previous.gas_level;
    if d_gas > GAS_DELTA {
        reasons.push(format!(
            "Gas level increasing ({d_gas:+.0} per sample), possible decay onset"
        ));
    }

    if condensation_proximity(latest.temperature, latest.dew_point, thresholds) {
        reasons.push(format!(
            "Dew point {:.1}°C is close to air temperature {:.1}°C",
            latest.dew_point, latest.temperature
        ));
    }

    if reasons.is_empty() {
        reasons.push("Conditions stable".to_string());
    }
    reasons
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::engine::patterns::PatternReport;
    use crate::engine::trend::TrendReport;
    use crate::models::RawSample;
    use chrono::{Duration, TimeZone, Utc};

    fn window(samples: &[(f64, f64, f64)]) -> Vec<Reading> {
        // ---
        let t = Thresholds::default();
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        samples
            .iter()
            .enumerate()
            .map(|(i, (temperature, humidity, gas_level))| {
                Reading::derive(
                    "unit-1",
                    start + Duration::seconds(30 * i as i64),
                    RawSample {
                        temperature: *temperature,
                        humidity: *humidity,
                        gas_level: *gas_level,
                    },
                    &t,
                )
            })
            .collect()
    }

    fn run(readings: &[Reading]) -> Prediction {
        // ---
        let t = Thresholds::default();
        let trends = TrendReport::from_window(readings);
        let patterns = PatternReport::from_window(readings, &t);
        predict(readings, &t, &trends, &patterns)
    }

    #[test]
    fn test_single_reading_needs_more_data() {
        // ---
        assert_eq!(run(&window(&[(6.0, 85.0, 80.0)])), Prediction::NeedMoreData);
        assert_eq!(run(&[]), Prediction::NeedMoreData);
    }

    #[test]
    fn test_time_to_critical() {
        // ---
        assert_eq!(time_to_critical(40.0, 5.0, 70.0), Some(6));
        assert_eq!(time_to_critical(40.0, 4.0, 70.0), Some(8)); // 7.5 rounds up
        assert_eq!(time_to_critical(90.0, 2.0, 70.0), Some(1)); // already past
        assert_eq!(time_to_critical(40.0, 0.0, 70.0), None);
        assert_eq!(time_to_critical(40.0, -3.0, 70.0), None);
    }

    #[test]
    fn test_rising_risk_forecast() {
        // ---
        // 9°C → 11°C: risk 1.5 → 4.5 (sprouting term only)
        let readings = window(&[(9.0, 85.0, 80.0), (11.0, 85.0, 80.0)]);
        let f = run(&readings).forecast().cloned().unwrap();

        let rate = readings[1].spoilage_risk - readings[0].spoilage_risk;
        assert!((f.risk_rate - rate).abs() < 1e-9);
        assert!((f.predicted_risk - (readings[1].spoilage_risk + rate * 6.0)).abs() < 1e-9);
        assert_eq!(
            f.time_to_critical_samples,
            time_to_critical(readings[1].spoilage_risk, rate, 70.0)
        );
        assert_eq!(
            f.time_to_critical_secs,
            f.time_to_critical_samples.map(|s| u64::from(s) * 30)
        );
        assert!(f.reasoning[0].starts_with("Temperature rising"));
    }

    #[test]
    fn test_predicted_risk_is_clamped() {
        // ---
        // Warm excursion recovers: 16°C → 6°C drops risk 16 → 0, the
        // forecast bottoms out at zero
        let readings = window(&[(16.0, 85.0, 80.0), (6.0, 85.0, 80.0)]);
        let f = run(&readings).forecast().cloned().unwrap();
        assert_eq!(f.predicted_risk, 0.0);
        assert_eq!(f.time_to_critical_samples, None);
        assert!(f.reasoning.iter().any(|r| r.starts_with("Temperature falling")));
    }

    #[test]
    fn test_stable_conditions_fallback() {
        // ---
        // Dry enough that the dew point stays well below air temperature
        let readings = window(&[(8.0, 75.0, 80.0), (8.1, 75.5, 85.0)]);
        let f = run(&readings).forecast().cloned().unwrap();
        assert_eq!(f.reasoning, vec!["Conditions stable".to_string()]);
    }

    #[test]
    fn test_gas_and_humidity_reasons_in_order() {
        // ---
        let readings = window(&[(6.0, 85.0, 80.0), (6.0, 88.0, 140.0)]);
        let f = run(&readings).forecast().cloned().unwrap();
        assert!(f.reasoning[0].starts_with("Humidity rising"));
        assert!(f.reasoning[1].starts_with("Gas level increasing"));
    }

    #[test]
    fn test_serialized_status_tag() {
        // ---
        let json = serde_json::to_value(Prediction::NeedMoreData).unwrap();
        assert_eq!(json["status"], "NEED_MORE_DATA");
    }
}
