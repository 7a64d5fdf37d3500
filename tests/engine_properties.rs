use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use spoilage_sentinel::engine::alarm::{AlarmMachine, AlarmState, AlarmThresholds, BuzzerPattern};
use spoilage_sentinel::engine::confidence;
use spoilage_sentinel::engine::patterns::PatternReport;
use spoilage_sentinel::engine::recommendations::{self, RuleInput};
use spoilage_sentinel::engine::risk::{self, HealthClass};
use spoilage_sentinel::engine::trend::{self, Trend, TrendReport};
use spoilage_sentinel::engine::{analyze, predictor};
use spoilage_sentinel::{RawSample, Reading, Thresholds};

fn series(samples: &[(f64, f64, f64)]) -> Vec<Reading> {
    // ---
    let thresholds = Thresholds::default();
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    samples
        .iter()
        .enumerate()
        .map(|(i, &(temperature, humidity, gas_level))| {
            Reading::derive(
                "prop",
                start + Duration::seconds(30 * i as i64),
                RawSample {
                    temperature,
                    humidity,
                    gas_level,
                },
                &thresholds,
            )
        })
        .collect()
}

fn sample() -> impl Strategy<Value = (f64, f64, f64)> {
    (-10.0f64..40.0, 0.0f64..100.0, 0.0f64..600.0)
}

proptest! {
    #[test]
    fn risk_is_always_a_percentage(t in -40.0f64..60.0, rh in 0.0f64..100.0) {
        let score = risk::score(t, rh, &Thresholds::default());
        prop_assert!((0.0..=100.0).contains(&score));
    }

    #[test]
    fn classification_is_monotonic(a in 0.0f64..100.0, b in 0.0f64..100.0) {
        let tiers = Thresholds::default().spoilage_risk;
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(risk::classify(lo, &tiers) <= risk::classify(hi, &tiers));
    }

    #[test]
    fn constant_series_is_stable(value in -50.0f64..500.0, len in 3usize..40) {
        let flat = vec![value; len];
        prop_assert_eq!(trend::classify(&flat), Trend::Stable);
    }

    #[test]
    fn short_series_has_no_trend(values in prop::collection::vec(-50.0f64..50.0, 0..3)) {
        prop_assert_eq!(trend::classify(&values), Trend::InsufficientData);
    }

    #[test]
    fn alarm_never_chatters_inside_dead_band(
        trigger in 25.0f64..95.0,
        risks in prop::collection::vec(0.0f64..100.0, 1..60),
    ) {
        let thresholds = AlarmThresholds::from_trigger(trigger);
        let mut machine = AlarmMachine::new(thresholds, BuzzerPattern::default(), true);
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();

        for (i, risk) in risks.into_iter().enumerate() {
            let was_active = machine.state().is_active();
            machine.update(risk, t0 + Duration::seconds(i as i64));
            let active = machine.state().is_active();

            if !was_active && active {
                prop_assert!(risk > thresholds.trigger);
            }
            if was_active && !active {
                prop_assert!(risk <= thresholds.stop);
            }
            if risk > thresholds.stop && risk <= thresholds.trigger {
                prop_assert_eq!(was_active, active);
            }
        }
    }

    #[test]
    fn confidence_grows_with_sample_count(a in 0usize..60, b in 0usize..60) {
        let trends = TrendReport::from_window(&[]);
        let patterns = PatternReport::from_window(&[], &Thresholds::default());
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            confidence::assess(lo, &trends, &patterns).score
                <= confidence::assess(hi, &trends, &patterns).score
        );
    }

    #[test]
    fn thresholds_survive_json(
        critical in 0.0f64..=100.0,
        margin in 0.0f64..10.0,
        size in 1usize..500,
    ) {
        let mut doc = Thresholds::default();
        doc.alerts.critical_risk_threshold = critical;
        doc.condensation.dew_point_difference = margin;
        doc.data_collection.history_size = size;

        let text = serde_json::to_string(&doc).unwrap();
        let back: Thresholds = serde_json::from_str(&text).unwrap();
        prop_assert_eq!(back, doc);
    }

    #[test]
    fn recommendations_are_priority_ordered(samples in prop::collection::vec(sample(), 1..25)) {
        let thresholds = Thresholds::default();
        let window = series(&samples);
        let trends = TrendReport::from_window(&window);
        let patterns = PatternReport::from_window(&window, &thresholds);
        let prediction = predictor::predict(&window, &thresholds, &trends, &patterns);

        let latest = window.last().unwrap();
        let recs = recommendations::recommend(&RuleInput {
            latest,
            trends: &trends,
            patterns: &patterns,
            prediction: &prediction,
            thresholds: &thresholds,
        });
        prop_assert!(recs.windows(2).all(|w| w[0].priority <= w[1].priority));
    }

    #[test]
    fn analysis_health_matches_latest_risk(samples in prop::collection::vec(sample(), 1..25)) {
        let thresholds = Thresholds::default();
        let window = series(&samples);
        let analysis = analyze(&window, &thresholds);

        let latest = analysis.latest.unwrap();
        prop_assert_eq!(analysis.sample_count, samples.len());
        prop_assert_eq!(
            latest.health_class,
            risk::classify(latest.spoilage_risk, &thresholds.spoilage_risk)
        );
        if samples.len() < 2 {
            prop_assert!(analysis.prediction.forecast().is_none());
        }
    }
}

#[test]
fn critical_reading_sounds_alarm() {
    // ---
    let window = series(&[(20.0, 60.0, 80.0)]);
    assert_eq!(window[0].health_class, HealthClass::Critical);

    let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let mut machine = AlarmMachine::from_config(&Thresholds::default(), BuzzerPattern::default());
    machine.update(window[0].spoilage_risk, t0);
    assert!(matches!(machine.state(), AlarmState::Active { .. }));
    assert!(machine.buzzer_on(t0));
}
