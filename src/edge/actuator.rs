//! Alarm actuator for the edge agent.

use tracing::{info, warn};

use crate::engine::alarm::AlarmState;

// ---

pub trait Actuator {
    /// Reflect the logical alarm state (indicator light, relay).
    fn set_alarm(&mut self, state: AlarmState, muted: bool);

    /// Drive the audible signal for the current slice of the duty cycle.
    fn set_buzzer(&mut self, on: bool);
}

/// Actuator that reports changes through `tracing` instead of GPIO.
#[derive(Debug, Default)]
pub struct LogActuator {
    // ---
    buzzer_on: bool,
}

impl Actuator for LogActuator {
    fn set_alarm(&mut self, state: AlarmState, muted: bool) {
        // ---
        match state {
            AlarmState::Active { activated_at } if muted => {
                warn!("ALARM active since {} (muted)", activated_at);
            }
            AlarmState::Active { activated_at } => {
                warn!("ALARM active since {}", activated_at);
            }
            AlarmState::Idle => info!("Alarm idle"),
        }
    }

    fn set_buzzer(&mut self, on: bool) {
        // ---
        if on != self.buzzer_on {
            tracing::trace!("buzzer {}", if on { "on" } else { "off" });
            self.buzzer_on = on;
        }
    }
}
