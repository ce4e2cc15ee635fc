//! Local variable-star catalog.
//!
//! Rows with an epoch and a period become the next extremum after the
//! reference time. Rows without become an all-night target covering the part
//! of tonight's civil dark window during which the star is above the horizon.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use super::sources::{CatalogContext, CatalogSource};
use crate::astro::{next_rise_time, next_set_time, HorizonProfile, TwilightWindow};
use crate::config::{CatalogSettings, VariableCatalogFormat};
use crate::core::{Coordinates, Event, GeographicLocation};
use crate::error::{CatalogError, CatalogResult};
use crate::parsing::variable_catalog::{parse_variable_catalog, VariableStarRecord};
use crate::time::JulianDate;

/// Margin kept inside the rise-to-set window.
const ALL_NIGHT_MARGIN_MINUTES: i64 = 5;

/// Offset after rising before searching for the set time.
const SET_SEARCH_OFFSET_MINUTES: i64 = 10;

/// Start, mid and end of an all-night target within `window`.
///
/// The star's rise is searched from dark-window start and the set after
/// that, each capped at the window end. Returns `None` when the star does
/// not rise before the window closes. A window longer than twice the margin
/// is shrunk by the margin on both sides.
pub fn all_night_window(
    coords: &Coordinates,
    location: &GeographicLocation,
    horizon: &HorizonProfile,
    window: TwilightWindow,
) -> Option<[DateTime<Utc>; 3]> {
    let rise = next_rise_time(coords, location, horizon, window.set)?;
    if rise >= window.rise {
        return None;
    }
    let set = next_set_time(
        coords,
        location,
        horizon,
        rise + Duration::minutes(SET_SEARCH_OFFSET_MINUTES),
    )
    .map_or(window.rise, |set| set.min(window.rise));

    let margin = Duration::minutes(ALL_NIGHT_MARGIN_MINUTES);
    let (start, end) = if set - rise > margin * 2 {
        (rise + margin, set - margin)
    } else {
        (rise, set)
    };
    Some([start, start + (end - start) / 2, end])
}

/// Variable stars read from a CSV file on disk.
pub struct LocalVariableCatalogSource {
    path: PathBuf,
    format: VariableCatalogFormat,
    span_minutes: f64,
}

impl LocalVariableCatalogSource {
    pub fn new(path: impl Into<PathBuf>, format: VariableCatalogFormat, span_minutes: f64) -> Self {
        Self {
            path: path.into(),
            format,
            span_minutes,
        }
    }

    /// Returns `None` when no catalog file is configured.
    pub fn from_settings(settings: &CatalogSettings) -> Option<Self> {
        settings.variable_star_catalog.as_ref().map(|path| {
            Self::new(
                path.clone(),
                settings.variable_catalog_format,
                settings.observation_span_minutes,
            )
        })
    }

    /// Converts parsed rows into events for the night described by `context`.
    pub fn events_for_night(&self, records: &[VariableStarRecord], context: &CatalogContext) -> Vec<Event> {
        let civil = context.nighttime.civil;
        let reference = civil
            .map_or(context.now, |window| window.set.max(context.now));
        let reference_jd = JulianDate::from_datetime(reference).value();

        let mut events = Vec::with_capacity(records.len());
        for record in records {
            let event = if record.has_events() {
                record.periodic_event(reference_jd, self.span_minutes)
            } else {
                let Some(window) = civil else {
                    log::warn!("No dark window tonight, skipping all-night target {}", record.name);
                    continue;
                };
                let Some(times) =
                    all_night_window(&record.coordinates, &context.location, &context.horizon, window)
                else {
                    log::debug!("{} does not rise before dawn", record.name);
                    continue;
                };
                record.all_night_event(times.map(JulianDate::from_datetime))
            };

            match event {
                Ok(event) => events.push(event),
                Err(e) => log::warn!("Skipping variable star {}: {}", record.name, e),
            }
        }
        events
    }
}

#[async_trait]
impl CatalogSource for LocalVariableCatalogSource {
    fn name(&self) -> &str {
        "variable star catalog"
    }

    async fn fetch(
        &self,
        context: &CatalogContext,
        cancel: &CancellationToken,
    ) -> CatalogResult<Vec<Event>> {
        if !self.path.exists() {
            return Err(CatalogError::FileNotFound(self.path.clone()));
        }
        let text = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CatalogError::Cancelled),
            text = tokio::fs::read_to_string(&self.path) => text?,
        };
        let records = parse_variable_catalog(&text, self.format)?;
        let events = self.events_for_night(&records, context);
        log::info!(
            "Loaded {} variable star events from {}",
            events.len(),
            self.path.display()
        );
        Ok(events)
    }
}
