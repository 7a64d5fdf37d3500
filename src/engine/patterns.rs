//! Spike, acceleration and gas-decline detection over sub-windows.

use serde::{Deserialize, Serialize};

use crate::models::Reading;
use crate::thresholds::Thresholds;

/// Relative change between two 3-sample means that counts as a spike.
pub const DEFAULT_SPIKE_THRESHOLD: f64 = 0.15;

const SPIKE_SPAN: usize = 3;
const MIN_ACCELERATION_SAMPLES: usize = 4;
const ACCELERATION_RATIO: f64 = 1.5;
const MIN_GAS_SAMPLES: usize = 4;

// ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternReport {
    // ---
    pub temperature_spike: bool,
    pub humidity_spike: bool,
    pub gas_spike: bool,
    pub accelerating_risk: bool,
    pub gas_decline: bool,
}

impl PatternReport {
    // ---
    pub fn from_window(window: &[Reading], thresholds: &Thresholds) -> Self {
        // ---
        let temperature: Vec<f64> = window.iter().map(|r| r.temperature).collect();
        let humidity: Vec<f64> = window.iter().map(|r| r.humidity).collect();
        let gas: Vec<f64> = window.iter().map(|r| r.gas_level).collect();
        let risk: Vec<f64> = window.iter().map(|r| r.spoilage_risk).collect();

        Self {
            temperature_spike: detect_spike(&temperature, DEFAULT_SPIKE_THRESHOLD),
            humidity_spike: detect_spike(&humidity, DEFAULT_SPIKE_THRESHOLD),
            gas_spike: detect_spike(&gas, DEFAULT_SPIKE_THRESHOLD),
            accelerating_risk: detect_acceleration(&risk),
            gas_decline: detect_gas_decline(&gas, thresholds.air_quality.poor),
        }
    }

    pub fn any(&self) -> bool {
        // ---
        self.temperature_spike
            || self.humidity_spike
            || self.gas_spike
            || self.accelerating_risk
            || self.gas_decline
    }

    pub fn any_spike(&self) -> bool {
        self.temperature_spike || self.humidity_spike || self.gas_spike
    }
}

fn mean(values: &[f64]) -> f64 {
    // ---
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Difference between the means of the second and first half.
fn half_mean_delta(values: &[f64]) -> f64 {
    // ---
    let mid = values.len() / 2;
    mean(&values[mid..]) - mean(&values[..mid])
}

/// Compare the last three samples with the three immediately before them.
pub fn detect_spike(series: &[f64], threshold: f64) -> bool {
    // ---
    let n = series.len();
    if n < SPIKE_SPAN * 2 {
        return false;
    }

    let recent = mean(&series[n - SPIKE_SPAN..]);
    let before = mean(&series[n - 2 * SPIKE_SPAN..n - SPIKE_SPAN]);
    (recent - before).abs() > threshold * before.abs()
}

/// The second half of the series moves faster than the first half.
pub fn detect_acceleration(series: &[f64]) -> bool {
    // ---
    if series.len() < MIN_ACCELERATION_SAMPLES {
        return false;
    }

    let mid = series.len() / 2;
    let first = half_mean_delta(&series[..mid]);
    let second = half_mean_delta(&series[mid..]);
    second.abs() > ACCELERATION_RATIO * first.abs()
}

/// Latest gas reading has crossed into the "poor" air-quality tier.
pub fn detect_gas_decline(series: &[f64], poor: f64) -> bool {
    // ---
    series.len() >= MIN_GAS_SAMPLES && series.last().is_some_and(|latest| *latest > poor)
}
