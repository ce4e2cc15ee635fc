//! The canonical observable event.
//!
//! Every catalog source is normalized into [`Event`] at the ingestion
//! boundary. The source-specific payload lives in the closed [`EventKind`]
//! set instead of nullable fields.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::coordinates::Coordinates;
use crate::error::EventError;
use crate::time::JulianDate;

/// Minutes per day, used for O-C and observation span arithmetic.
pub const MINUTES_PER_DAY: f64 = 1440.0;

/// Source-specific payload of an [`Event`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    /// An exoplanet transit.
    Transit {
        /// Transit depth in parts per thousand
        depth_ppt: f64,
        /// Percentage of the transit that is observable
        percent_transit: f64,
        /// Percentage of the out-of-transit baseline that is observable
        percent_baseline: f64,
    },
    /// A brightness extremum of a periodic variable star.
    Periodic {
        epoch: f64,
        period: f64,
        /// Expected O-C scatter in minutes, widens the window
        oc_range_minutes: f64,
        amplitude: f64,
        /// Observed phase offset of the extremum, in cycles
        phase: f64,
    },
    /// A variable without a usable ephemeris, observed from rise to set.
    AllNight { amplitude: f64 },
}

/// A single observable event: a transit or a variable-star extremum.
///
/// Times are stored as Julian Dates and are always ordered
/// `start <= mid <= end`. Construction and [`Event::next_occurrence`] are the
/// only ways to set them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    name: String,
    comments: Option<String>,
    magnitude: f64,
    coordinates: Coordinates,
    start: JulianDate,
    mid: JulianDate,
    end: JulianDate,
    kind: EventKind,
}

impl Event {
    /// Creates an event after checking that its times are finite and ordered.
    ///
    /// # Examples
    ///
    /// ```
    /// use exoplanets_rust::core::{Coordinates, Event, EventKind};
    /// use exoplanets_rust::time::JulianDate;
    ///
    /// let event = Event::new(
    ///     "WASP-12 b",
    ///     Coordinates::new(6.5, 29.67).unwrap(),
    ///     11.6,
    ///     [JulianDate::new(2459000.40), JulianDate::new(2459000.45), JulianDate::new(2459000.50)],
    ///     EventKind::Transit { depth_ppt: 14.0, percent_transit: 100.0, percent_baseline: 80.0 },
    /// )
    /// .unwrap();
    /// assert_eq!(event.observability_score(), 194.0);
    /// ```
    pub fn new(
        name: impl Into<String>,
        coordinates: Coordinates,
        magnitude: f64,
        times: [JulianDate; 3],
        kind: EventKind,
    ) -> Result<Self, EventError> {
        let name = name.into();
        let [start, mid, end] = times;
        check_times(&name, start, mid, end)?;
        Ok(Self {
            name,
            comments: None,
            magnitude,
            coordinates,
            start,
            mid,
            end,
            kind,
        })
    }

    /// Attaches free-text comments such as priority notes.
    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        let comments = comments.into();
        self.comments = if comments.trim().is_empty() {
            None
        } else {
            Some(comments)
        };
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comments(&self) -> Option<&str> {
        self.comments.as_deref()
    }

    /// Reference V magnitude; 0 when unknown.
    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub fn coordinates(&self) -> &Coordinates {
        &self.coordinates
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    pub fn start(&self) -> JulianDate {
        self.start
    }

    pub fn mid(&self) -> JulianDate {
        self.mid
    }

    pub fn end(&self) -> JulianDate {
        self.end
    }

    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start.to_datetime()
    }

    pub fn mid_utc(&self) -> DateTime<Utc> {
        self.mid.to_datetime()
    }

    pub fn end_utc(&self) -> DateTime<Utc> {
        self.end.to_datetime()
    }

    pub fn start_local(&self) -> DateTime<Local> {
        self.start.to_local()
    }

    pub fn mid_local(&self) -> DateTime<Local> {
        self.mid.to_local()
    }

    pub fn end_local(&self) -> DateTime<Local> {
        self.end.to_local()
    }

    /// Start, mid and end as UTC instants.
    pub fn boundary_instants(&self) -> [DateTime<Utc>; 3] {
        [self.start_utc(), self.mid_utc(), self.end_utc()]
    }

    pub fn is_transit(&self) -> bool {
        matches!(self.kind, EventKind::Transit { .. })
    }

    /// Whether the event comes from a known epoch and period.
    pub fn has_periodic_events(&self) -> bool {
        matches!(self.kind, EventKind::Periodic { .. })
    }

    /// Transit depth (ppt) or variable amplitude.
    pub fn depth_or_amplitude(&self) -> f64 {
        match self.kind {
            EventKind::Transit { depth_ppt, .. } => depth_ppt,
            EventKind::Periodic { amplitude, .. } | EventKind::AllNight { amplitude } => amplitude,
        }
    }

    /// Ranking key for transits: percent-transit plus percent-baseline plus depth.
    ///
    /// Variable-star events score 0.
    pub fn observability_score(&self) -> f64 {
        match self.kind {
            EventKind::Transit {
                depth_ppt,
                percent_transit,
                percent_baseline,
            } => percent_transit + percent_baseline + depth_ppt,
            _ => 0.0,
        }
    }

    /// Event duration in hours.
    pub fn duration_hours(&self) -> f64 {
        self.end.days_since(self.start) * 24.0
    }

    /// Whether the event ends strictly after `now`.
    pub fn ends_after(&self, now: DateTime<Utc>) -> bool {
        self.end.is_after(now)
    }

    /// Human-readable period, `--` when the event is not periodic.
    pub fn formatted_period(&self) -> String {
        match self.kind {
            EventKind::Periodic { period, .. } if period > 0.0 => {
                if period < 1.0 {
                    format!("{period}d ({:.2}h)", period * 24.0)
                } else {
                    format!("{period}d")
                }
            }
            _ => "--".to_string(),
        }
    }

    /// Recomputes the next extremum of a periodic variable after `reference_jd`.
    ///
    /// The window half-width is `(span_minutes + oc_range) / 1440` days.
    /// Non-periodic events are returned unchanged.
    ///
    /// # Arguments
    /// * `reference_jd` - search from this Julian Date onwards
    /// * `span_minutes` - configured observation span around the extremum
    pub fn next_occurrence(&self, reference_jd: f64, span_minutes: f64) -> Result<Self, EventError> {
        let EventKind::Periodic {
            epoch,
            period,
            oc_range_minutes,
            phase,
            ..
        } = self.kind
        else {
            return Ok(self.clone());
        };

        let shifted_epoch = epoch + period * phase;
        let cycle = ((reference_jd - shifted_epoch) / period).floor();
        let next = shifted_epoch + period * (cycle + 1.0);
        let half_width = ((span_minutes + oc_range_minutes) / MINUTES_PER_DAY).max(0.0);

        let start = JulianDate::new(next - half_width);
        let mid = JulianDate::new(next);
        let end = JulianDate::new(next + half_width);
        check_times(&self.name, start, mid, end)?;

        Ok(Self {
            start,
            mid,
            end,
            ..self.clone()
        })
    }

    /// Scheduling order: periodic events by start time, others by right
    /// ascension with wraparound; periodic events come first.
    pub fn schedule_cmp(&self, other: &Event) -> Ordering {
        match (self.has_periodic_events(), other.has_periodic_events()) {
            (true, true) => self.start.value().total_cmp(&other.start.value()),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => compare_right_ascension(
                self.coordinates.ra_hours(),
                other.coordinates.ra_hours(),
            ),
        }
    }
}

fn check_times(
    name: &str,
    start: JulianDate,
    mid: JulianDate,
    end: JulianDate,
) -> Result<(), EventError> {
    if !(start.value().is_finite() && mid.value().is_finite() && end.value().is_finite()) {
        return Err(EventError::NonFinite {
            name: name.to_string(),
        });
    }
    if start > mid || mid > end {
        return Err(EventError::UnorderedTimes {
            name: name.to_string(),
            start: start.value(),
            mid: mid.value(),
            end: end.value(),
        });
    }
    Ok(())
}

/// Pairwise right-ascension comparison with wraparound.
///
/// Values within 12h of each other compare directly. Otherwise the smaller
/// one is treated as 24h later so that objects near 0h/24h stay adjacent.
pub fn compare_right_ascension(ra: f64, other: f64) -> Ordering {
    if ra > other && ra - other > 12.0 {
        ra.total_cmp(&(other + 24.0))
    } else if other > ra && other - ra > 12.0 {
        (ra + 24.0).total_cmp(&other)
    } else {
        ra.total_cmp(&other)
    }
}

/// Sorts events into scheduling order.
///
/// Periodic events are ordered by start time. The remaining events are ordered
/// by right ascension on a circle cut at the widest gap between neighbours,
/// which agrees with [`compare_right_ascension`] for every pair that does not
/// straddle that gap while staying a total order.
pub fn sort_for_schedule(events: &mut [Event]) {
    let mut ras: Vec<f64> = events
        .iter()
        .filter(|e| !e.has_periodic_events())
        .map(|e| e.coordinates.ra_hours())
        .collect();
    ras.sort_by(f64::total_cmp);
    let pivot = widest_gap_end(&ras);

    events.sort_by(|a, b| match (a.has_periodic_events(), b.has_periodic_events()) {
        (true, true) => a.start.value().total_cmp(&b.start.value()),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => {
            let ka = (a.coordinates.ra_hours() - pivot).rem_euclid(24.0);
            let kb = (b.coordinates.ra_hours() - pivot).rem_euclid(24.0);
            ka.total_cmp(&kb)
        }
    });
}

/// Right ascension just after the widest circular gap of a sorted list.
fn widest_gap_end(sorted: &[f64]) -> f64 {
    let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
        return 0.0;
    };
    let mut pivot = *first;
    let mut widest = first + 24.0 - last;
    for pair in sorted.windows(2) {
        let gap = pair[1] - pair[0];
        if gap > widest {
            widest = gap;
            pivot = pair[1];
        }
    }
    pivot
}
