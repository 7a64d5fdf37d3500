//! One full evaluation of a device's history window.

use serde::{Deserialize, Serialize};

use super::patterns::PatternReport;
use super::predictor::{self, Prediction};
use super::recommendations::{self, Recommendation, RuleInput};
use super::trend::TrendReport;
use crate::models::Reading;
use crate::thresholds::Thresholds;

// ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    // ---
    pub sample_count: usize,
    pub latest: Option<Reading>,
    pub trends: TrendReport,
    pub patterns: PatternReport,
    pub prediction: Prediction,
    pub recommendations: Vec<Recommendation>,
}

/// Evaluate an oldest-first window against one threshold snapshot.
pub fn analyze(window: &[Reading], thresholds: &Thresholds) -> Analysis {
    // ---
    let trends = TrendReport::from_window(window);
    let patterns = PatternReport::from_window(window, thresholds);
    let prediction = predictor::predict(window, thresholds, &trends, &patterns);

    let recommendations = match window.last() {
        Some(latest) => recommendations::recommend(&RuleInput {
            latest,
            trends: &trends,
            patterns: &patterns,
            prediction: &prediction,
            thresholds,
        }),
        None => Vec::new(),
    };

    Analysis {
        sample_count: window.len(),
        latest: window.last().cloned(),
        trends,
        patterns,
        prediction,
        recommendations,
    }
}
