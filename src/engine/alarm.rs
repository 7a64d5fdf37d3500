//! Two-state alarm with a hysteresis dead band.
//!
//! `Idle → Active` when risk exceeds the trigger threshold, `Active → Idle`
//! when risk falls to or below the lower stop threshold. Values inside the
//! dead band never cause a transition. Muting only silences the buzzer; the
//! logical state stays `Active`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::thresholds::Thresholds;

/// Gap between trigger and stop thresholds.
pub const DEAD_BAND: f64 = 20.0;
pub const DEFAULT_TRIGGER: f64 = 70.0;
pub const DEFAULT_BUZZER_PERIOD_MS: i64 = 1000;

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmState {
    Idle,
    #[serde(rename_all = "camelCase")]
    Active { activated_at: DateTime<Utc> },
}

impl AlarmState {
    pub fn is_active(&self) -> bool {
        matches!(self, AlarmState::Active { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmTransition {
    Activated,
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlarmThresholds {
    // ---
    pub trigger: f64,
    pub stop: f64,
}

impl AlarmThresholds {
    // ---
    /// Stop threshold sits one dead band below the trigger, floored at 0.
    pub fn from_trigger(trigger: f64) -> Self {
        // ---
        Self {
            trigger,
            stop: (trigger - DEAD_BAND).max(0.0),
        }
    }

    pub fn should_activate(&self, risk: f64) -> bool {
        risk > self.trigger
    }

    pub fn should_clear(&self, risk: f64) -> bool {
        risk <= self.stop
    }
}

impl Default for AlarmThresholds {
    fn default() -> Self {
        Self::from_trigger(DEFAULT_TRIGGER)
    }
}

/// On for the first half of every cycle, off for the second half.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuzzerPattern {
    // ---
    pub period_ms: i64,
}

impl BuzzerPattern {
    // ---
    pub fn new(period_ms: i64) -> Self {
        Self {
            period_ms: period_ms.max(2),
        }
    }

    pub fn is_on(&self, elapsed_ms: i64) -> bool {
        elapsed_ms.rem_euclid(self.period_ms) < self.period_ms / 2
    }
}

impl Default for BuzzerPattern {
    fn default() -> Self {
        Self::new(DEFAULT_BUZZER_PERIOD_MS)
    }
}

#[derive(Debug, Clone)]
pub struct AlarmMachine {
    // ---
    state: AlarmState,
    thresholds: AlarmThresholds,
    pattern: BuzzerPattern,
    buzzer_enabled: bool,
    muted: bool,
}

impl AlarmMachine {
    // ---
    pub fn new(thresholds: AlarmThresholds, pattern: BuzzerPattern, buzzer_enabled: bool) -> Self {
        // ---
        Self {
            state: AlarmState::Idle,
            thresholds,
            pattern,
            buzzer_enabled,
            muted: false,
        }
    }

    pub fn from_config(config: &Thresholds, pattern: BuzzerPattern) -> Self {
        // ---
        Self::new(
            AlarmThresholds::from_trigger(config.alerts.critical_risk_threshold),
            pattern,
            config.alerts.buzzer_enabled,
        )
    }

    /// Pick up new thresholds without touching the current state.
    pub fn reconfigure(&mut self, config: &Thresholds) {
        // ---
        self.thresholds = AlarmThresholds::from_trigger(config.alerts.critical_risk_threshold);
        self.buzzer_enabled = config.alerts.buzzer_enabled;
    }

    pub fn state(&self) -> AlarmState {
        self.state
    }

    pub fn thresholds(&self) -> AlarmThresholds {
        self.thresholds
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Feed one risk score; returns the transition, if any.
    pub fn update(&mut self, risk: f64, now: DateTime<Utc>) -> Option<AlarmTransition> {
        // ---
        match self.state {
            AlarmState::Idle if self.thresholds.should_activate(risk) => {
                self.state = AlarmState::Active { activated_at: now };
                Some(AlarmTransition::Activated)
            }
            AlarmState::Active { .. } if self.thresholds.should_clear(risk) => {
                self.state = AlarmState::Idle;
                Some(AlarmTransition::Cleared)
            }
            _ => None,
        }
    }

    /// Whether the audible signal should sound at `now`.
    pub fn buzzer_on(&self, now: DateTime<Utc>) -> bool {
        // ---
        match self.state {
            AlarmState::Active { activated_at } if self.buzzer_enabled && !self.muted => {
                let elapsed = (now - activated_at).num_milliseconds();
                self.pattern.is_on(elapsed)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn machine() -> AlarmMachine {
        AlarmMachine::new(AlarmThresholds::default(), BuzzerPattern::default(), true)
    }

    #[test]
    fn test_default_dead_band() {
        // ---
        let th = AlarmThresholds::default();
        assert_eq!(th.trigger, 70.0);
        assert_eq!(th.stop, 50.0);
        assert!(!th.should_activate(70.0));
        assert!(th.should_activate(70.1));
        assert!(th.should_clear(50.0));
        assert!(!th.should_clear(50.1));
    }

    #[test]
    fn test_no_chatter_inside_dead_band() {
        // ---
        let mut m = machine();
        assert_eq!(m.update(72.0, t0()), Some(AlarmTransition::Activated));
        for risk in [60.0, 55.0, 65.0, 58.0] {
            assert_eq!(m.update(risk, t0()), None);
            assert!(m.state().is_active());
        }
    }

    #[test]
    fn test_clear_and_immediate_rearm() {
        // ---
        let mut m = machine();
        m.update(80.0, t0());
        assert_eq!(m.update(50.0, t0()), Some(AlarmTransition::Cleared));
        assert_eq!(m.state(), AlarmState::Idle);

        // Rising through the band again does nothing until the trigger
        assert_eq!(m.update(65.0, t0()), None);
        let later = t0() + Duration::seconds(30);
        assert_eq!(m.update(71.0, later), Some(AlarmTransition::Activated));
        assert_eq!(m.state(), AlarmState::Active { activated_at: later });
    }

    #[test]
    fn test_buzzer_duty_cycle() {
        // ---
        let mut m = machine();
        assert!(!m.buzzer_on(t0()));

        m.update(90.0, t0());
        assert!(m.buzzer_on(t0()));
        assert!(m.buzzer_on(t0() + Duration::milliseconds(499)));
        assert!(!m.buzzer_on(t0() + Duration::milliseconds(500)));
        assert!(!m.buzzer_on(t0() + Duration::milliseconds(999)));
        assert!(m.buzzer_on(t0() + Duration::milliseconds(1000)));
    }

    #[test]
    fn test_mute_silences_but_stays_active() {
        // ---
        let mut m = machine();
        m.update(90.0, t0());
        m.set_muted(true);
        assert!(m.is_muted());
        assert!(!m.buzzer_on(t0()));
        assert!(m.state().is_active());
    }

    #[test]
    fn test_reconfigure_moves_thresholds() {
        // ---
        let mut config = Thresholds::default();
        let mut m = AlarmMachine::from_config(&config, BuzzerPattern::default());
        m.update(75.0, t0());

        config.alerts.critical_risk_threshold = 80.0;
        config.alerts.buzzer_enabled = false;
        m.reconfigure(&config);

        assert_eq!(m.thresholds().stop, 60.0);
        assert!(m.state().is_active());
        assert!(!m.buzzer_on(t0()));
    }

    #[test]
    fn test_state_serializes_with_tag() {
        // ---
        let json = serde_json::to_value(AlarmState::Active { activated_at: t0() }).unwrap();
        assert_eq!(json["state"], "ACTIVE");
        assert_eq!(json["activatedAt"], "2025-06-01T12:00:00Z");
    }
}
