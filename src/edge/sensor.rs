//! Sensor source for the edge agent.

use crate::error::SensorReadError;
use crate::models::RawSample;

// ---

pub trait Sensor {
    /// Take one sample. An error skips the current cycle.
    fn sample(&mut self) -> Result<RawSample, SensorReadError>;
}

/// Reject samples no physical unit could produce.
pub fn check_plausible(sample: RawSample) -> Result<RawSample, SensorReadError> {
    // ---
    let checks = [
        ("temperature", sample.temperature, -40.0, 85.0),
        ("humidity", sample.humidity, 0.0, 100.0),
        ("gasLevel", sample.gas_level, 0.0, f64::MAX),
    ];
    for (field, value, min, max) in checks {
        if !value.is_finite() || value < min || value > max {
            return Err(SensorReadError::Implausible { field, value });
        }
    }
    Ok(sample)
}

/// Deterministic stand-in for the physical sensors.
///
/// Produces a slow daily-like temperature swing around a base value, a
/// humidity swing in antiphase and a gas level that creeps upward, which is
/// enough to exercise every stage of the engine on a bench.
#[derive(Debug, Clone)]
pub struct SimulatedSensor {
    // ---
    tick: u64,
    base_temperature: f64,
    base_humidity: f64,
    base_gas: f64,
    /// Samples per full oscillation.
    period: u64,
}

impl SimulatedSensor {
    // ---
    pub fn new(base_temperature: f64, base_humidity: f64, base_gas: f64) -> Self {
        // ---
        Self {
            tick: 0,
            base_temperature,
            base_humidity,
            base_gas,
            period: 120,
        }
    }
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        Self::new(6.0, 88.0, 80.0)
    }
}

impl Sensor for SimulatedSensor {
    fn sample(&mut self) -> Result<RawSample, SensorReadError> {
        // ---
        let phase = (self.tick % self.period) as f64 / self.period as f64 * std::f64::consts::TAU;
        self.tick += 1;

        let sample = RawSample {
            temperature: self.base_temperature + 3.0 * phase.sin(),
            humidity: (self.base_humidity - 6.0 * phase.sin()).clamp(0.0, 100.0),
            gas_level: self.base_gas + 0.5 * self.tick as f64,
        };
        check_plausible(sample)
    }
}
