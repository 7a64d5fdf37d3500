//! Error taxonomy for the analytics pipeline.
//!
//! None of these are fatal. Each one maps to a degradation rule:
//! - [`SensorReadError`]: skip the cycle, history stays unchanged
//! - [`DeliveryError`]: the reading stays in the outbox until it runs out of retries
//! - [`ConfigFetchError`]: keep the cached thresholds, try again on the next pull
//! - [`ConfigValidationError`]: reject the update, report every violation
//!
//! Not having enough history is not an error at all; it is the
//! `InsufficientData` / `NeedMoreData` result of the trend and prediction
//! stages.

use thiserror::Error;

// ---

#[derive(Debug, Error)]
pub enum SensorReadError {
    // ---
    #[error("sensor did not respond")]
    NoResponse,

    #[error("sensor returned an implausible {field}: {value}")]
    Implausible { field: &'static str, value: f64 },

    #[error("sensor bus error: {0}")]
    Bus(String),
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    // ---
    #[error("delivery timed out")]
    Timeout,

    #[error("server rejected reading with status {0}")]
    Rejected(u16),

    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum ConfigFetchError {
    // ---
    #[error("configuration fetch timed out")]
    Timeout,

    #[error("configuration server returned status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("configuration document could not be decoded: {0}")]
    Decode(String),

    #[error(transparent)]
    Invalid(#[from] ConfigValidationError),
}

/// A configuration document (or merged update) that broke one or more
/// invariants. All violations are collected, not only the first.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("invalid configuration: {}", violations.join("; "))]
pub struct ConfigValidationError {
    // ---
    pub violations: Vec<String>,
}

impl ConfigValidationError {
    // ---
    pub fn single(message: impl Into<String>) -> Self {
        // ---
        Self {
            violations: vec![message.into()],
        }
    }
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        // ---
        if err.is_timeout() {
            DeliveryError::Timeout
        } else if let Some(status) = err.status() {
            DeliveryError::Rejected(status.as_u16())
        } else {
            DeliveryError::Transport(err.to_string())
        }
    }
}

impl From<reqwest::Error> for ConfigFetchError {
    fn from(err: reqwest::Error) -> Self {
        // ---
        if err.is_timeout() {
            ConfigFetchError::Timeout
        } else if let Some(status) = err.status() {
            ConfigFetchError::Status(status.as_u16())
        } else if err.is_decode() {
            ConfigFetchError::Decode(err.to_string())
        } else {
            ConfigFetchError::Transport(err.to_string())
        }
    }
}
