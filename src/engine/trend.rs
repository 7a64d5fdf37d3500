//! Trend classification over a single metric's recent values.
//!
//! Slope estimation is ordinary least squares of value against sample
//! index, shared by the edge agent and the aggregation service. The slope is
//! therefore expressed "per sample", in the metric's own unit.

use serde::{Deserialize, Serialize};

use crate::models::Reading;

/// Fewer values than this yield [`Trend::InsufficientData`].
pub const MIN_TREND_SAMPLES: usize = 3;

const RAPID_SLOPE: f64 = 1.0;
const GENTLE_SLOPE: f64 = 0.3;

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    RisingRapidly,
    Rising,
    Stable,
    Falling,
    FallingRapidly,
    InsufficientData,
}

impl Trend {
    // ---
    pub fn is_rising(&self) -> bool {
        matches!(self, Trend::Rising | Trend::RisingRapidly)
    }

    /// A trend that says something: neither flat nor undetermined.
    pub fn is_directional(&self) -> bool {
        !matches!(self, Trend::Stable | Trend::InsufficientData)
    }
}

/// Label plus the slope it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricTrend {
    // ---
    pub trend: Trend,
    /// `None` when there was not enough data to estimate a slope.
    pub slope: Option<f64>,
}

/// Trends for every tracked metric over one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    // ---
    pub temperature: MetricTrend,
    pub humidity: MetricTrend,
    pub risk: MetricTrend,
    pub gas: MetricTrend,
}

impl TrendReport {
    // ---
    pub fn from_window(window: &[Reading]) -> Self {
        // ---
        let series = |f: fn(&Reading) -> f64| window.iter().map(f).collect::<Vec<_>>();

        Self {
            temperature: analyze(&series(|r| r.temperature)),
            humidity: analyze(&series(|r| r.humidity)),
            risk: analyze(&series(|r| r.spoilage_risk)),
            gas: analyze(&series(|r| r.gas_level)),
        }
    }

    pub fn all(&self) -> [MetricTrend; 4] {
        [self.temperature, self.humidity, self.risk, self.gas]
    }

    /// Number of metrics showing a definite direction.
    pub fn directional_count(&self) -> usize {
        self.all().iter().filter(|m| m.trend.is_directional()).count()
    }
}

/// Least-squares slope of `series` against its index. Returns 0 for fewer
/// than two values.
pub fn estimate_slope(series: &[f64]) -> f64 {
    // ---
    let n = series.len();
    if n < 2 {
        return 0.0;
    }

    let n_f = n as f64;
    let mean_x = (n_f - 1.0) / 2.0;
    let mean_y = series.iter().sum::<f64>() / n_f;

    let (mut num, mut den) = (0.0, 0.0);
    for (i, y) in series.iter().enumerate() {
        let dx = i as f64 - mean_x;
        num += dx * (y - mean_y);
        den += dx * dx;
    }

    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Map a per-sample slope onto the symmetric trend bands.
pub fn classify_slope(slope: f64) -> Trend {
    // ---
    if slope > RAPID_SLOPE {
        Trend::RisingRapidly
    } else if slope > GENTLE_SLOPE {
        Trend::Rising
    } else if slope < -RAPID_SLOPE {
        Trend::FallingRapidly
    } else if slope < -GENTLE_SLOPE {
        Trend::Falling
    } else {
        Trend::Stable
    }
}

pub fn classify(series: &[f64]) -> Trend {
    analyze(series).trend
}

pub fn analyze(series: &[f64]) -> MetricTrend {
    // ---
    if series.len() < MIN_TREND_SAMPLES {
        return MetricTrend {
            trend: Trend::InsufficientData,
            slope: None,
        };
    }

    let slope = estimate_slope(series);
    MetricTrend {
        trend: classify_slope(slope),
        slope: Some(slope),
    }
}
