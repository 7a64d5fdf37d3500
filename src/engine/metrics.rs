//! Derived psychrometric quantities computed from temperature and humidity.
//!
//! All functions are pure and infallible. Inputs are expected to be range
//! checked before they reach this module (relative humidity of 0 produces a
//! non-finite dew point because of the `ln(RH/100)` term).

use serde::{Deserialize, Serialize};

// Magnus coefficients for the dew point approximation.
const MAGNUS_A: f64 = 17.27;
const MAGNUS_B: f64 = 237.7;

// ---

/// Bundle of the four derived values attached to every reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    // ---
    /// Dew point in °C.
    pub dew_point: f64,
    /// Absolute humidity in g/m³.
    pub absolute_humidity: f64,
    /// Vapor pressure deficit in kPa.
    pub vapor_pressure_deficit: f64,
    /// Equilibrium moisture content of the stored product, in percent.
    pub equilibrium_moisture_content: f64,
}

impl DerivedMetrics {
    // ---
    pub fn compute(temperature: f64, humidity: f64) -> Self {
        // ---
        Self {
            dew_point: dew_point(temperature, humidity),
            absolute_humidity: absolute_humidity(temperature, humidity),
            vapor_pressure_deficit: vapor_pressure_deficit(temperature, humidity),
            equilibrium_moisture_content: equilibrium_moisture_content(temperature, humidity),
        }
    }
}

/// Dew point (°C) using the Magnus approximation.
pub fn dew_point(temperature: f64, humidity: f64) -> f64 {
    // ---
    let alpha = (MAGNUS_A * temperature) / (MAGNUS_B + temperature) + (humidity / 100.0).ln();
    (MAGNUS_B * alpha) / (MAGNUS_A - alpha)
}

/// Absolute humidity (g/m³), humidity given in percent.
pub fn absolute_humidity(temperature: f64, humidity: f64) -> f64 {
    // ---
    let saturation_hpa = 6.112 * ((17.67 * temperature) / (temperature + 243.5)).exp();
    (saturation_hpa * humidity) / (0.4615 * (temperature + 273.15))
}

/// Vapor pressure deficit (kPa).
pub fn vapor_pressure_deficit(temperature: f64, humidity: f64) -> f64 {
    // ---
    let saturation_kpa = 0.6108 * ((17.27 * temperature) / (temperature + 237.3)).exp();
    let actual_kpa = saturation_kpa * (humidity / 100.0);
    saturation_kpa - actual_kpa
}

/// Empirical equilibrium moisture content (%) for stored tubers.
pub fn equilibrium_moisture_content(temperature: f64, humidity: f64) -> f64 {
    // ---
    9.7 - 0.082 * temperature + 0.0025 * humidity * temperature
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn approx(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() < tolerance,
            "expected {expected} ± {tolerance}, got {actual}"
        );
    }

    #[test]
    fn test_dew_point_reference_values() {
        // ---
        approx(dew_point(20.0, 50.0), 9.26, 0.05);
        approx(dew_point(14.0, 92.0), 12.72, 0.05);

        // Saturated air: dew point equals air temperature
        approx(dew_point(10.0, 100.0), 10.0, 1e-9);
    }

    #[test]
    fn test_absolute_humidity() {
        // ---
        approx(absolute_humidity(20.0, 50.0), 8.64, 0.05);
        approx(absolute_humidity(5.0, 0.0), 0.0, 1e-12);
    }

    #[test]
    fn test_vapor_pressure_deficit() {
        // ---
        // 2.338 kPa saturation at 20°C, half of it missing at 50% RH
        approx(vapor_pressure_deficit(20.0, 50.0), 1.169, 0.01);
        approx(vapor_pressure_deficit(20.0, 100.0), 0.0, 1e-12);
    }

    #[test]
    fn test_equilibrium_moisture_content() {
        // ---
        approx(equilibrium_moisture_content(0.0, 90.0), 9.7, 1e-12);
        approx(equilibrium_moisture_content(10.0, 90.0), 9.7 - 0.82 + 2.25, 1e-12);
    }

    #[test]
    fn test_compute_bundles_all_values() {
        // ---
        let m = DerivedMetrics::compute(6.0, 90.0);
        assert_eq!(m.dew_point, dew_point(6.0, 90.0));
        assert_eq!(m.absolute_humidity, absolute_humidity(6.0, 90.0));
        assert_eq!(m.vapor_pressure_deficit, vapor_pressure_deficit(6.0, 90.0));
        assert_eq!(
            m.equilibrium_moisture_content,
            equilibrium_moisture_content(6.0, 90.0)
        );
    }
}
