//! Threshold document shared by the aggregation service and edge agents.
//!
//! The aggregation service is the single authority for this document. Edge
//! agents hold a read-only cached copy refreshed on a pull interval.
//!
//! Updates never mutate a live document in place: [`ThresholdStore::publish`]
//! deep-merges a partial JSON patch into a copy of the current snapshot,
//! validates the result, and swaps the whole snapshot at once. Evaluations
//! that grabbed the previous `Arc` keep reading a consistent document.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::alarm::DEAD_BAND;
use crate::error::ConfigValidationError;

// ---

/// Six-point band for a single metric (ideal, warning and critical bounds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Band {
    // ---
    pub ideal_min: f64,
    pub ideal_max: f64,
    pub warning_min: f64,
    pub warning_max: f64,
    pub critical_min: f64,
    pub critical_max: f64,
}

/// Ascending air-quality cut points for the gas-sensor proxy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirQualityTiers {
    // ---
    pub good: f64,
    pub moderate: f64,
    pub poor: f64,
    pub very_poor: f64,
}

/// Ascending spoilage-risk tiers used for health classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskTiers {
    // ---
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condensation {
    // ---
    /// Minimum margin (°C) between air temperature and dew point.
    pub dew_point_difference: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alerts {
    // ---
    pub buzzer_enabled: bool,
    /// Risk score above which the local alarm activates.
    pub critical_risk_threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataCollection {
    // ---
    /// Seconds between two samples on the edge.
    pub sample_interval: u64,
    /// Capacity of the edge history window.
    pub history_size: usize,
}

/// The complete, versioned threshold document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    // ---
    pub version: u32,
    pub temperature: Band,
    pub humidity: Band,
    pub air_quality: AirQualityTiers,
    pub spoilage_risk: RiskTiers,
    pub condensation: Condensation,
    pub alerts: Alerts,
    pub data_collection: DataCollection,
}

impl Default for Thresholds {
    /// Reference values for cold storage of root crops.
    fn default() -> Self {
        // ---
        Self {
            version: 1,
            temperature: Band {
                ideal_min: 4.0,
                ideal_max: 8.0,
                warning_min: 2.0,
                warning_max: 12.0,
                critical_min: 0.0,
                critical_max: 15.0,
            },
            humidity: Band {
                ideal_min: 85.0,
                ideal_max: 95.0,
                warning_min: 80.0,
                warning_max: 97.0,
                critical_min: 70.0,
                critical_max: 98.0,
            },
            air_quality: AirQualityTiers {
                good: 100.0,
                moderate: 200.0,
                poor: 300.0,
                very_poor: 500.0,
            },
            spoilage_risk: RiskTiers {
                low: 20.0,
                medium: 40.0,
                high: 60.0,
                critical: 80.0,
            },
            condensation: Condensation {
                dew_point_difference: 2.0,
            },
            alerts: Alerts {
                buzzer_enabled: true,
                critical_risk_threshold: 70.0,
            },
            data_collection: DataCollection {
                sample_interval: 30,
                history_size: 20,
            },
        }
    }
}

impl Thresholds {
    // ---
    /// Check every invariant and return all violations at once.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        // ---
        let mut violations = Vec::new();

        check_band("temperature", &self.temperature, &mut violations);
        check_band("humidity", &self.humidity, &mut violations);

        for (name, value) in [
            ("idealMin", self.humidity.ideal_min),
            ("idealMax", self.humidity.ideal_max),
            ("warningMin", self.humidity.warning_min),
            ("warningMax", self.humidity.warning_max),
            ("criticalMin", self.humidity.critical_min),
            ("criticalMax", self.humidity.critical_max),
        ] {
            check_percentage(&format!("humidity.{name}"), value, &mut violations);
        }

        let aq = &self.air_quality;
        check_ascending(
            "airQuality",
            &[
                ("good", aq.good),
                ("moderate", aq.moderate),
                ("poor", aq.poor),
                ("veryPoor", aq.very_poor),
            ],
            &mut violations,
        );

        let risk = &self.spoilage_risk;
        let tiers = [
            ("low", risk.low),
            ("medium", risk.medium),
            ("high", risk.high),
            ("critical", risk.critical),
        ];
        check_ascending("spoilageRisk", &tiers, &mut violations);
        for (name, value) in tiers {
            check_percentage(&format!("spoilageRisk.{name}"), value, &mut violations);
        }

        // The alarm clears one dead band below this, so it must leave room
        let trigger = self.alerts.critical_risk_threshold;
        if !(DEAD_BAND..=100.0).contains(&trigger) {
            violations.push(format!(
                "alerts.criticalRiskThreshold must be within [{DEAD_BAND}, 100], got {trigger}"
            ));
        }

        let margin = self.condensation.dew_point_difference;
        if !margin.is_finite() || margin < 0.0 {
            violations.push(format!(
                "condensation.dewPointDifference must be a non-negative number, got {margin}"
            ));
        }
        if self.data_collection.sample_interval == 0 {
            violations.push("dataCollection.sampleInterval must be at least 1 second".to_string());
        }
        if self.data_collection.history_size == 0 {
            violations.push("dataCollection.historySize must be at least 1".to_string());
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ConfigValidationError { violations })
        }
    }

    /// Deep-merge a partial JSON document into a copy of `self`.
    ///
    /// Objects are merged key by key, any other provided value replaces the
    /// prior one, absent keys keep their current value. The merged document
    /// is validated but `self` is never modified.
    pub fn merged(&self, patch: &Value) -> Result<Thresholds, ConfigValidationError> {
        // ---
        if !patch.is_object() {
            return Err(ConfigValidationError::single(
                "configuration update must be a JSON object",
            ));
        }

        let mut document = serde_json::to_value(self)
            .map_err(|e| ConfigValidationError::single(format!("unserializable document: {e}")))?;
        deep_merge(&mut document, patch);

        let merged: Thresholds = serde_json::from_value(document)
            .map_err(|e| ConfigValidationError::single(format!("malformed document: {e}")))?;
        merged.validate()?;
        Ok(merged)
    }
}

fn check_band(metric: &str, band: &Band, violations: &mut Vec<String>) {
    // ---
    for (label, min, max) in [
        ("ideal", band.ideal_min, band.ideal_max),
        ("warning", band.warning_min, band.warning_max),
        ("critical", band.critical_min, band.critical_max),
    ] {
        if !(min < max) {
            violations.push(format!(
                "{metric}.{label}Min ({min}) must be less than {metric}.{label}Max ({max})"
            ));
        }
    }
}

fn check_ascending(group: &str, tiers: &[(&str, f64)], violations: &mut Vec<String>) {
    // ---
    for pair in tiers.windows(2) {
        let (lower_name, lower) = pair[0];
        let (upper_name, upper) = pair[1];
        if !(lower < upper) {
            violations.push(format!(
                "{group}.{lower_name} ({lower}) must be less than {group}.{upper_name} ({upper})"
            ));
        }
    }
}

fn check_percentage(field: &str, value: f64, violations: &mut Vec<String>) {
    // ---
    if !(0.0..=100.0).contains(&value) {
        violations.push(format!("{field} must be within [0, 100], got {value}"));
    }
}

fn deep_merge(target: &mut Value, patch: &Value) {
    // ---
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                let nested = value.is_object() && target.get(key).is_some_and(Value::is_object);
                match target.get_mut(key) {
                    Some(existing) if nested => deep_merge(existing, value),
                    _ => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

// ---

/// Atomically swapped holder of the current threshold snapshot.
#[derive(Debug)]
pub struct ThresholdStore {
    // ---
    current: RwLock<Arc<Thresholds>>,
}

impl ThresholdStore {
    // ---
    pub fn new(initial: Thresholds) -> Self {
        // ---
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    /// Immutable snapshot for one evaluation.
    pub fn current(&self) -> Arc<Thresholds> {
        // ---
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Merge, validate and swap in a partial update. The version is bumped
    /// on success; on failure the previous snapshot stays in place.
    pub fn publish(&self, patch: &Value) -> Result<Arc<Thresholds>, ConfigValidationError> {
        // ---
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut merged = guard.merged(patch)?;
        merged.version = guard.version.wrapping_add(1);

        let snapshot = Arc::new(merged);
        *guard = Arc::clone(&snapshot);
        Ok(snapshot)
    }

    /// Replace the whole document, used when an edge agent pulls a fresh copy.
    /// An incoming document that fails validation is rejected and the cached
    /// copy stays in place.
    pub fn replace(&self, next: Thresholds) -> Result<Arc<Thresholds>, ConfigValidationError> {
        // ---
        next.validate()?;
        let snapshot = Arc::new(next);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Arc::clone(&snapshot);
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::engine::alarm::AlarmThresholds;
    use serde_json::json;

    #[test]
    fn test_defaults_are_valid() {
        // ---
        assert!(Thresholds::default().validate().is_ok());
    }

    #[test]
    fn test_round_trip_reproduces_document() {
        // ---
        let original = Thresholds::default();
        let text = serde_json::to_string(&original).unwrap();
        let parsed: Thresholds = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, original);
        assert!(text.contains("\"idealMin\""));
        assert!(text.contains("\"dewPointDifference\""));
    }

    #[test]
    fn test_validation_reports_every_violation() {
        // ---
        let mut t = Thresholds::default();
        t.temperature.ideal_min = 9.0; // above idealMax
        t.spoilage_risk.medium = 10.0; // below low
        t.humidity.critical_max = 120.0; // percentage out of range

        let err = t.validate().unwrap_err();
        assert_eq!(err.violations.len(), 3, "{:?}", err.violations);
        assert!(err.violations[0].contains("temperature.idealMin"));
        assert!(err.violations.iter().any(|v| v.contains("humidity.criticalMax")));
        assert!(err.violations.iter().any(|v| v.contains("spoilageRisk.low")));
    }

    #[test]
    fn test_merge_keeps_absent_keys() {
        // ---
        let base = Thresholds::default();
        let merged = base
            .merged(&json!({ "temperature": { "idealMax": 9.0 } }))
            .unwrap();

        assert_eq!(merged.temperature.ideal_max, 9.0);
        assert_eq!(merged.temperature.ideal_min, base.temperature.ideal_min);
        assert_eq!(merged.humidity, base.humidity);
    }

    #[test]
    fn test_merge_rejects_non_object_and_bad_types() {
        // ---
        let base = Thresholds::default();
        assert!(base.merged(&json!([1, 2])).is_err());
        assert!(base
            .merged(&json!({ "alerts": { "buzzerEnabled": "yes" } }))
            .is_err());
    }

    #[test]
    fn test_publish_swaps_and_bumps_version() {
        // ---
        let store = ThresholdStore::new(Thresholds::default());
        let before = store.current();

        let after = store
            .publish(&json!({ "alerts": { "criticalRiskThreshold": 75.0 } }))
            .unwrap();

        assert_eq!(after.version, before.version + 1);
        assert_eq!(store.current().alerts.critical_risk_threshold, 75.0);
        // The snapshot taken earlier is untouched
        assert_eq!(before.alerts.critical_risk_threshold, 70.0);
    }

    #[test]
    fn test_rejected_publish_keeps_prior_document() {
        // ---
        let store = ThresholdStore::new(Thresholds::default());
        let err = store
            .publish(&json!({
                "spoilageRisk": { "low": 90.0 },
                "dataCollection": { "historySize": 0 }
            }))
            .unwrap_err();

        assert_eq!(err.violations.len(), 2, "{:?}", err.violations);
        assert_eq!(*store.current(), Thresholds::default());
    }

    #[test]
    fn test_replace_validates() {
        // ---
        let store = ThresholdStore::new(Thresholds::default());
        let mut next = Thresholds::default();
        next.version = 7;
        assert_eq!(store.replace(next).unwrap().version, 7);

        let mut bad = Thresholds::default();
        bad.alerts.critical_risk_threshold = -1.0;
        assert!(store.replace(bad).is_err());
        assert_eq!(store.current().version, 7);
    }

    #[test]
    fn test_alarm_trigger_leaves_room_for_dead_band() {
        // ---
        let store = ThresholdStore::new(Thresholds::default());
        for trigger in [0.0, 19.5] {
            let err = store
                .publish(&json!({ "alerts": { "criticalRiskThreshold": trigger } }))
                .unwrap_err();
            assert!(err.violations[0].contains("alerts.criticalRiskThreshold"));
        }
        assert_eq!(*store.current(), Thresholds::default());

        // Lowest accepted trigger still clears strictly below itself
        let published = store
            .publish(&json!({ "alerts": { "criticalRiskThreshold": DEAD_BAND } }))
            .unwrap();
        let alarm = AlarmThresholds::from_trigger(published.alerts.critical_risk_threshold);
        assert!(alarm.stop < alarm.trigger);
    }

    #[test]
    fn test_round_trip_is_exact_for_long_fractions() {
        // ---
        let mut original = Thresholds::default();
        original.alerts.critical_risk_threshold = 99.39754828489075;
        original.condensation.dew_point_difference = 0.1 + 0.2;

        let text = serde_json::to_string(&original).unwrap();
        let parsed: Thresholds = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, original);
        assert_eq!(
            parsed.alerts.critical_risk_threshold.to_bits(),
            original.alerts.critical_risk_threshold.to_bits()
        );
    }
}
