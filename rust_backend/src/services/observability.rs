//! Observability filtering of candidate events.
//!
//! The filter is a conjunction of independently toggled stages. Each stage
//! narrows the working set and never reorders it; a single explicit sort is
//! applied at the end.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::astro::{horizontal_position, meridian_transit_time, HorizonProfile, NighttimeWindows, TwilightWindow};
use crate::config::{ObservabilityConstraints, TargetList};
use crate::core::{sort_for_schedule, Event, GeographicLocation};

/// Final ordering of the filtered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Descending transit observability score
    ByScore,
    /// Ascending start time
    ByStartTime,
    /// Periodic events by start, the rest by wrapped right ascension
    Schedule,
}

impl SortOrder {
    /// Default ordering for a target list.
    pub fn for_target_list(list: TargetList) -> Self {
        match list {
            TargetList::TransitPredictor => SortOrder::ByScore,
            TargetList::EphemerisDatabase => SortOrder::ByStartTime,
            TargetList::VariableStarFile => SortOrder::Schedule,
        }
    }
}

/// Where and when the events are observed.
#[derive(Debug, Clone, Copy)]
pub struct ObservingContext<'a> {
    pub location: &'a GeographicLocation,
    pub horizon: &'a HorizonProfile,
    pub nighttime: &'a NighttimeWindows,
    pub now: DateTime<Utc>,
}

/// Filtered list plus counts for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub events: Vec<Event>,
    pub retrieved: usize,
    pub removed: usize,
}

/// Applies observability constraints to a list of events.
///
/// # Examples
///
/// ```
/// use exoplanets_rust::astro::{HorizonProfile, NighttimeWindows};
/// use exoplanets_rust::config::ObservabilityConstraints;
/// use exoplanets_rust::core::GeographicLocation;
/// use exoplanets_rust::services::observability::{ObservabilityFilter, ObservingContext, SortOrder};
///
/// let location = GeographicLocation::new(50.0, 7.0, 0.0);
/// let horizon = HorizonProfile::flat();
/// let nighttime = NighttimeWindows::default();
/// let context = ObservingContext { location: &location, horizon: &horizon, nighttime: &nighttime, now: chrono::Utc::now() };
///
/// let constraints = ObservabilityConstraints::default();
/// let filter = ObservabilityFilter::new(&constraints, context);
/// let outcome = filter.apply(Vec::new(), SortOrder::ByScore);
/// assert_eq!(outcome.removed, 0);
/// ```
pub struct ObservabilityFilter<'a> {
    constraints: &'a ObservabilityConstraints,
    context: ObservingContext<'a>,
}

impl<'a> ObservabilityFilter<'a> {
    pub fn new(constraints: &'a ObservabilityConstraints, context: ObservingContext<'a>) -> Self {
        Self {
            constraints,
            context,
        }
    }

    /// Runs every enabled stage and sorts the survivors.
    pub fn apply(&self, events: Vec<Event>, order: SortOrder) -> FilterOutcome {
        let retrieved = events.len();
        let c = self.constraints;

        let mut working: Vec<Event> = events
            .into_iter()
            .filter(|e| e.ends_after(self.context.now))
            .collect();
        log::debug!("{} of {} events have not ended yet", working.len(), retrieved);

        if c.check_magnitude {
            working.retain(|e| e.magnitude() < c.max_magnitude);
            log::debug!("{} events brighter than {}", working.len(), c.max_magnitude);
        }

        if c.within_twilight {
            working = self.within_window(working, self.context.nighttime.civil, "civil");
        }

        if c.within_nautical {
            working = self.within_window(working, self.context.nighttime.nautical, "nautical");
        }

        if c.above_horizon {
            working.retain(|e| self.satisfies(e, |instant| self.is_above_horizon(e, instant)));
            log::debug!("{} events above the horizon", working.len());
        }

        if c.without_meridian_flip {
            working.retain(|e| !self.crosses_meridian(e));
            log::debug!("{} events without meridian flip", working.len());
        }

        sort_events(&mut working, order);

        let removed = retrieved - working.len();
        log::info!(
            "Observability filter kept {} of {} events ({} removed)",
            working.len(),
            retrieved,
            removed
        );
        FilterOutcome {
            events: working,
            retrieved,
            removed,
        }
    }

    fn within_window(
        &self,
        events: Vec<Event>,
        window: Option<TwilightWindow>,
        label: &str,
    ) -> Vec<Event> {
        let Some(window) = window else {
            log::warn!("No {} twilight window tonight, removing all {} events", label, events.len());
            return Vec::new();
        };
        let kept: Vec<Event> = events
            .into_iter()
            .filter(|e| self.satisfies(e, |instant| window.contains(instant)))
            .collect();
        log::debug!("{} events within {} twilight", kept.len(), label);
        kept
    }

    /// Partial policy: any boundary instant passes. Full policy: all pass.
    fn satisfies(&self, event: &Event, check: impl Fn(DateTime<Utc>) -> bool) -> bool {
        let instants = event.boundary_instants();
        if self.constraints.partial_events {
            instants.into_iter().any(check)
        } else {
            instants.into_iter().all(check)
        }
    }

    fn is_above_horizon(&self, event: &Event, instant: DateTime<Utc>) -> bool {
        let position = horizontal_position(event.coordinates(), self.context.location, instant);
        self.context.horizon.altitude_at(position.azimuth) < position.altitude
    }

    /// Whether upper culmination falls strictly inside the event.
    fn crosses_meridian(&self, event: &Event) -> bool {
        let start = event.start_utc();
        let meridian = meridian_transit_time(
            event.coordinates(),
            self.context.location,
            start - Duration::hours(1),
        );
        start < meridian && meridian < event.end_utc()
    }
}

/// Sorts events in place.
pub fn sort_events(events: &mut [Event], order: SortOrder) {
    match order {
        SortOrder::ByScore => events.sort_by(|a, b| {
            b.observability_score()
                .total_cmp(&a.observability_score())
        }),
        SortOrder::ByStartTime => {
            events.sort_by(|a, b| a.start().value().total_cmp(&b.start().value()))
        }
        SortOrder::Schedule => sort_for_schedule(events),
    }
}
