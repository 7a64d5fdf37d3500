//! Data models for sensor samples and derived readings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::metrics::DerivedMetrics;
use crate::engine::risk::{self, HealthClass};
use crate::thresholds::Thresholds;

// ---

/// Raw sample produced by the physical sensors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSample {
    // ---
    pub temperature: f64,
    pub humidity: f64,
    pub gas_level: f64,
}

/// A sample enriched with risk score, health class and derived metrics.
///
/// Readings are immutable once derived; the aggregation service stores them
/// exactly as the edge agent computed them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    // ---
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    pub gas_level: f64,
    pub spoilage_risk: f64,
    pub health_class: HealthClass,
    pub dew_point: f64,
    pub absolute_humidity: f64,
    pub vapor_pressure_deficit: f64,
    pub equilibrium_moisture_content: f64,
}

impl Reading {
    // ---
    /// Run a raw sample through the derived-metrics calculator and risk scorer.
    pub fn derive(
        device_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        sample: RawSample,
        thresholds: &Thresholds,
    ) -> Self {
        // ---
        let metrics = DerivedMetrics::compute(sample.temperature, sample.humidity);
        let spoilage_risk = risk::score(sample.temperature, sample.humidity, thresholds);
        let health_class = risk::classify(spoilage_risk, &thresholds.spoilage_risk);

        Reading {
            device_id: device_id.into(),
            timestamp,
            temperature: sample.temperature,
            humidity: sample.humidity,
            gas_level: sample.gas_level,
            spoilage_risk,
            health_class,
            dew_point: metrics.dew_point,
            absolute_humidity: metrics.absolute_humidity,
            vapor_pressure_deficit: metrics.vapor_pressure_deficit,
            equilibrium_moisture_content: metrics.equilibrium_moisture_content,
        }
    }

    /// Basic plausibility check applied at the ingestion boundary.
    pub fn validate(&self) -> Result<(), String> {
        // ---
        if self.device_id.trim().is_empty() {
            return Err("deviceId must not be empty".to_string());
        }
        let numbers = [
            ("temperature", self.temperature),
            ("humidity", self.humidity),
            ("gasLevel", self.gas_level),
            ("spoilageRisk", self.spoilage_risk),
        ];
        if let Some((name, _)) = numbers.iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("{name} must be a finite number"));
        }
        if !(0.0..=100.0).contains(&self.humidity) {
            return Err(format!("humidity {} is outside [0, 100]", self.humidity));
        }
        if !(0.0..=100.0).contains(&self.spoilage_risk) {
            return Err(format!(
                "spoilageRisk {} is outside [0, 100]",
                self.spoilage_risk
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    fn sample(temperature: f64, humidity: f64) -> RawSample {
        // ---
        RawSample {
            temperature,
            humidity,
            gas_level: 120.0,
        }
    }

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 26, 18, 45, 0).unwrap()
    }

    #[test]
    fn test_derive_populates_every_field() {
        // ---
        let t = Thresholds::default();
        let r = Reading::derive("unit-7", ts(), sample(14.0, 92.0), &t);

        assert_eq!(r.device_id, "unit-7");
        assert_eq!(r.timestamp, ts());
        assert_eq!(r.gas_level, 120.0);
        assert!((r.spoilage_risk - 53.0).abs() < 1e-9);
        assert_eq!(r.health_class, HealthClass::Warning);
        assert!((r.dew_point - 12.72).abs() < 0.05);
        assert!(r.absolute_humidity > 0.0);
        assert!(r.vapor_pressure_deficit > 0.0);
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        // ---
        let r = Reading::derive("unit-7", ts(), sample(6.0, 85.0), &Thresholds::default());
        let json = serde_json::to_value(&r).unwrap();

        assert_eq!(json["deviceId"], "unit-7");
        assert_eq!(json["healthClass"], "GOOD");
        assert!(json.get("vaporPressureDeficit").is_some());
        assert_eq!(json["timestamp"], "2025-03-26T18:45:00Z");
    }

    #[test]
    fn test_validate_rejects_implausible_values() {
        // ---
        let t = Thresholds::default();
        assert!(Reading::derive("a", ts(), sample(6.0, 85.0), &t).validate().is_ok());

        let mut r = Reading::derive("a", ts(), sample(6.0, 85.0), &t);
        r.humidity = 140.0;
        assert!(r.validate().is_err());

        let mut r = Reading::derive("a", ts(), sample(6.0, 85.0), &t);
        r.temperature = f64::NAN;
        assert!(r.validate().unwrap_err().contains("temperature"));

        let r = Reading::derive(" ", ts(), sample(6.0, 85.0), &t);
        assert!(r.validate().is_err());
    }
}
