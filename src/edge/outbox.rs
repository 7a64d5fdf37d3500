//! Bounded delivery queue with capped exponential backoff.
//!
//! Readings are delivered in the order they were taken. When the head of the
//! queue fails, the flush stops and the head waits out its backoff, so a
//! connectivity outage costs one timed-out call per cycle rather than one
//! per queued reading. The queue never blocks sampling: a full queue evicts
//! its oldest entry, and a reading that exhausts its retries is dropped.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::uplink::Uplink;
use crate::models::Reading;

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    // ---
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Failed attempts tolerated before a reading is dropped.
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        // ---
        Self {
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(300),
            max_retries: 5,
        }
    }
}

impl RetryPolicy {
    // ---
    /// Delay after the `attempts`-th consecutive failure (1-based).
    pub fn backoff(&self, attempts: u32) -> Duration {
        // ---
        let exponent = attempts.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

#[derive(Debug, Clone)]
struct Pending {
    // ---
    reading: Reading,
    attempts: u32,
    next_attempt: Instant,
}

/// Result of one flush pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
    // ---
    pub delivered: usize,
    pub failed: usize,
    pub dropped: usize,
}

#[derive(Debug)]
pub struct Outbox {
    // ---
    queue: VecDeque<Pending>,
    capacity: usize,
    policy: RetryPolicy,
}

impl Outbox {
    // ---
    pub fn new(capacity: usize, policy: RetryPolicy) -> Self {
        // ---
        let capacity = capacity.max(1);
        Self {
            queue: VecDeque::with_capacity(capacity),
            capacity,
            policy,
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queue a reading for delivery. Returns the evicted oldest reading
    /// when the queue was full.
    pub fn push(&mut self, reading: Reading, now: Instant) -> Option<Reading> {
        // ---
        let evicted = if self.queue.len() == self.capacity {
            self.queue.pop_front().map(|p| p.reading)
        } else {
            None
        };
        if let Some(old) = &evicted {
            warn!(
                "Outbox full ({}), dropping reading from {}",
                self.capacity, old.timestamp
            );
        }

        self.queue.push_back(Pending {
            reading,
            attempts: 0,
            next_attempt: now,
        });
        evicted
    }

    /// Deliver due readings in order, making at most `max_attempts` calls.
    pub async fn flush<U>(&mut self, uplink: &U, now: Instant, max_attempts: usize) -> FlushReport
    where
        U: Uplink + ?Sized,
    {
        // ---
        let mut report = FlushReport::default();

        for _ in 0..max_attempts {
            let Some(head) = self.queue.front_mut() else {
                break;
            };
            if head.next_attempt > now {
                break;
            }

            match uplink.deliver(&head.reading).await {
                Ok(()) => {
                    self.queue.pop_front();
                    report.delivered += 1;
                }
                Err(e) => {
                    head.attempts += 1;
                    report.failed += 1;

                    if head.attempts > self.policy.max_retries {
                        warn!(
                            "Dropping reading from {} after {} failed attempts: {}",
                            head.reading.timestamp, head.attempts, e
                        );
                        self.queue.pop_front();
                        report.dropped += 1;
                        continue;
                    }

                    let delay = self.policy.backoff(head.attempts);
                    debug!(
                        "Delivery failed ({}), attempt {}, retrying in {:?}",
                        e, head.attempts, delay
                    );
                    head.next_attempt = now + delay;
                    break;
                }
            }
        }

        report
    }
}
