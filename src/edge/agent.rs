//! The edge agent's cooperative sampling loop.
//!
//! One cycle runs to completion before the next begins: sample, derive,
//! append to the ring window, update the alarm, evaluate locally, queue for
//! delivery, flush a bounded number of deliveries. Only the delivery flush
//! and the periodic configuration pull touch the network, and both are
//! bounded by the uplink's timeout.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::actuator::Actuator;
use super::outbox::{FlushReport, Outbox, RetryPolicy};
use super::sensor::Sensor;
use super::uplink::Uplink;
use crate::engine::alarm::{AlarmMachine, AlarmTransition, BuzzerPattern};
use crate::engine::window::HistoryWindow;
use crate::engine::{self, Analysis};
use crate::models::Reading;
use crate::thresholds::{ThresholdStore, Thresholds};

/// Upper bound on delivery calls per cycle so sampling is never starved.
pub const MAX_DELIVERIES_PER_CYCLE: usize = 8;

/// Granularity of the buzzer duty-cycle rendering.
const BUZZER_TICK: Duration = Duration::from_millis(100);

// ---

pub struct EdgeAgent<S, A, U> {
    // ---
    device_id: String,
    sensor: S,
    actuator: A,
    uplink: U,
    thresholds: ThresholdStore,
    window: HistoryWindow<Reading>,
    alarm: AlarmMachine,
    outbox: Outbox,
}

/// What one sampling cycle produced.
#[derive(Debug)]
pub struct CycleOutcome {
    // ---
    pub reading: Reading,
    pub transition: Option<AlarmTransition>,
    pub analysis: Analysis,
    pub flush: FlushReport,
}

impl<S, A, U> EdgeAgent<S, A, U>
where
    S: Sensor,
    A: Actuator,
    U: Uplink,
{
    // ---
    pub fn new(
        device_id: impl Into<String>,
        sensor: S,
        actuator: A,
        uplink: U,
        initial: Thresholds,
        outbox_capacity: usize,
        pattern: BuzzerPattern,
    ) -> Self {
        // ---
        let window = HistoryWindow::new(initial.data_collection.history_size);
        let alarm = AlarmMachine::from_config(&initial, pattern);

        Self {
            device_id: device_id.into(),
            sensor,
            actuator,
            uplink,
            thresholds: ThresholdStore::new(initial),
            window,
            alarm,
            outbox: Outbox::new(outbox_capacity, RetryPolicy::default()),
        }
    }

    pub fn thresholds(&self) -> Arc<Thresholds> {
        self.thresholds.current()
    }

    pub fn window(&self) -> &HistoryWindow<Reading> {
        &self.window
    }

    pub fn alarm(&self) -> &AlarmMachine {
        &self.alarm
    }

    pub fn pending_deliveries(&self) -> usize {
        self.outbox.len()
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    fn sample_period(&self) -> Duration {
        Duration::from_secs(self.thresholds.current().data_collection.sample_interval)
    }

    /// Operator mute: silences the buzzer, the alarm stays logically active.
    pub fn set_muted(&mut self, muted: bool) {
        // ---
        self.alarm.set_muted(muted);
        self.actuator.set_alarm(self.alarm.state(), muted);
        self.actuator.set_buzzer(false);
    }

    /// Run one sampling cycle. A sensor failure skips the cycle and leaves
    /// the history untouched.
    pub async fn run_cycle(&mut self, now: DateTime<Utc>, clock: Instant) -> Option<CycleOutcome> {
        // ---
        let mut outcome = self.evaluate_cycle(now, clock)?;
        outcome.flush = self
            .outbox
            .flush(&self.uplink, clock, MAX_DELIVERIES_PER_CYCLE)
            .await;
        self.note_flush(&outcome.flush);
        Some(outcome)
    }

    /// Everything in a cycle up to queueing the reading; no network I/O.
    fn evaluate_cycle(&mut self, now: DateTime<Utc>, clock: Instant) -> Option<CycleOutcome> {
        // ---
        let sample = match self.sensor.sample() {
            Ok(sample) => sample,
            Err(e) => {
                warn!("Sensor read failed, skipping cycle: {}", e);
                return None;
            }
        };

        let thresholds = self.thresholds.current();
        let reading = Reading::derive(self.device_id.clone(), now, sample, &thresholds);
        self.window.push(reading.clone());

        let transition = self.alarm.update(reading.spoilage_risk, now);
        if let Some(t) = transition {
            info!("Alarm {:?} at risk {:.1}", t, reading.spoilage_risk);
            self.actuator.set_alarm(self.alarm.state(), self.alarm.is_muted());
        }

        let analysis = engine::analyze(&self.window.snapshot(), &thresholds);
        debug!(
            risk = reading.spoilage_risk,
            health = reading.health_class.as_str(),
            trend = ?analysis.trends.risk.trend,
            "Cycle evaluated over {} readings",
            analysis.sample_count
        );
        if let Some(top) = analysis.recommendations.first() {
            debug!("Top recommendation [{:?}]: {}", top.priority, top.message);
        }

        self.outbox.push(reading.clone(), clock);

        Some(CycleOutcome {
            reading,
            transition,
            analysis,
            flush: FlushReport::default(),
        })
    }

    /// Flush the outbox while still rendering the buzzer duty cycle.
    /// Deliveries can take several uplink timeouts.
    async fn flush_with_buzzer(
        &mut self,
        clock: Instant,
        buzzer_tick: &mut Interval,
    ) -> FlushReport {
        // ---
        let flush = self
            .outbox
            .flush(&self.uplink, clock, MAX_DELIVERIES_PER_CYCLE);
        tokio::pin!(flush);

        loop {
            tokio::select! {
                report = &mut flush => return report,
                _ = buzzer_tick.tick() => {
                    let on = self.alarm.buzzer_on(Utc::now());
                    self.actuator.set_buzzer(on);
                }
            }
        }
    }

    fn note_flush(&self, report: &FlushReport) {
        // ---
        if report.failed > 0 {
            warn!("Delivery failing, {} reading(s) waiting in outbox", self.outbox.len());
        }
    }

    /// Pull a fresh threshold document. On failure the cached copy stays in
    /// use until the next scheduled pull. Returns whether anything changed.
    pub async fn refresh_config(&mut self) -> bool {
        // ---
        let fetched = match self.uplink.fetch_thresholds().await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!("Configuration pull failed, keeping cached copy: {}", e);
                return false;
            }
        };

        if *self.thresholds.current() == fetched {
            return false;
        }

        match self.thresholds.replace(fetched) {
            Ok(next) => {
                info!("Thresholds updated to v{}", next.version);
                self.window.resize(next.data_collection.history_size);
                self.alarm.reconfigure(&next);
                true
            }
            Err(e) => {
                warn!("Ignoring invalid configuration: {}", e);
                false
            }
        }
    }

    /// Render the current slice of the buzzer duty cycle.
    pub fn tick_buzzer(&mut self, now: DateTime<Utc>) {
        // ---
        let on = self.alarm.buzzer_on(now);
        self.actuator.set_buzzer(on);
    }

    /// Drive the agent until Ctrl-C.
    pub async fn run(mut self, config_pull: Duration) -> Result<()> {
        // ---
        self.refresh_config().await;

        let mut period = self.sample_period();
        let mut sample_tick = interval(period);
        sample_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut config_tick = interval(config_pull);
        config_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; the pull above already covered it
        config_tick.tick().await;
        let mut buzzer_tick = interval(BUZZER_TICK);
        buzzer_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Edge agent {} sampling every {:?}", self.device_id, period);

        loop {
            tokio::select! {
                _ = sample_tick.tick() => {
                    let clock = Instant::now();
                    if self.evaluate_cycle(Utc::now(), clock).is_some() {
                        let report = self.flush_with_buzzer(clock, &mut buzzer_tick).await;
                        self.note_flush(&report);
                    }
                }
                _ = config_tick.tick() => {
                    if self.refresh_config().await {
                        let next = self.sample_period();
                        if next != period {
                            info!("Sample interval changed to {:?}", next);
                            period = next;
                            sample_tick = interval(period);
                            sample_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
                        }
                    }
                }
                _ = buzzer_tick.tick() => {
                    self.tick_buzzer(Utc::now());
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutting down, {} reading(s) undelivered", self.outbox.len());
                    self.actuator.set_buzzer(false);
                    return Ok(());
                }
            }
        }
    }
}
