//! Helpers a sequence host uses to time instructions around the selected event.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::core::Event;

/// Baseline added before and after a transit.
pub const TRANSIT_BASELINE_HOURS: i64 = 1;

/// Span during which the event should be imaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ObservationWindow {
    /// Transits get one hour of baseline on each side; periodic and
    /// all-night events are observed from start to end.
    pub fn for_event(event: &Event) -> Self {
        if event.is_transit() {
            let baseline = Duration::hours(TRANSIT_BASELINE_HOURS);
            Self {
                start: event.start_utc() - baseline,
                end: event.end_utc() + baseline,
            }
        } else {
            Self {
                start: event.start_utc(),
                end: event.end_utc(),
            }
        }
    }

    /// When imaging can start: the window start, or `now` if that has passed.
    pub fn observation_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.start.max(now)
    }

    pub fn observation_end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Time left to wait before the window opens, never negative.
    pub fn wait_duration(&self, now: DateTime<Utc>) -> Duration {
        (self.start - now).max(Duration::zero())
    }

    /// Loop-until condition: keep looping while the next item still fits.
    pub fn should_continue(&self, now: DateTime<Utc>, next_item: Duration) -> bool {
        now + next_item <= self.end
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now < self.end
    }
}

/// Loop condition bounded by an iteration count and the event end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuringTransitCondition {
    event_end: DateTime<Utc>,
    max_iterations: u32,
    completed: u32,
}

impl DuringTransitCondition {
    pub fn new(event: &Event, max_iterations: u32) -> Self {
        Self {
            event_end: event.end_utc(),
            max_iterations,
            completed: 0,
        }
    }

    pub fn completed_iterations(&self) -> u32 {
        self.completed
    }

    /// Whether another iteration may run at `now`.
    pub fn check(&self, now: DateTime<Utc>) -> bool {
        self.completed < self.max_iterations && now < self.event_end
    }

    /// Records one finished iteration.
    pub fn advance(&mut self) {
        self.completed = self.completed.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.completed = 0;
    }
}
