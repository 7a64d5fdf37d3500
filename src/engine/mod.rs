//! Environmental risk analytics engine.
//!
//! Pure computations and small state machines shared by the edge agent and
//! the aggregation service. Nothing in here performs I/O.
//!
//! Data flow: raw sample → [`metrics`] → [`risk`] → {[`trend`], [`patterns`]}
//! over a [`window`] → [`predictor`] (with [`confidence`]) →
//! [`recommendations`]. The risk score independently drives [`alarm`].

pub mod alarm;
pub mod analysis;
pub mod confidence;
pub mod metrics;
pub mod patterns;
pub mod predictor;
pub mod recommendations;
pub mod risk;
pub mod trend;
pub mod window;

pub use analysis::{analyze, Analysis};
