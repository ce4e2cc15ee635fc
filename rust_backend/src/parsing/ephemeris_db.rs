//! Ephemeris database records.
//!
//! The database is a JSON object keyed by planet name. Each value carries a
//! linear ephemeris (reference mid-time and period in days), the transit
//! duration and the latest observed O-C offset. Only the fields used here are
//! deserialized; everything else in a record is ignored.

use serde::Deserialize;
use serde_json::Value;

use crate::core::{Coordinates, Event, EventKind, MINUTES_PER_DAY};
use crate::error::{CatalogError, CatalogResult};
use crate::parsing::fields::{lenient_f64, lenient_string};
use crate::time::JulianDate;

/// O-C offsets at or below this many minutes are ignored.
pub const OC_THRESHOLD_MINUTES: f64 = 10.0;

const MM_PER_INCH: f64 = 25.4;

/// One planet from the ephemeris database.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EphemerisRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_observations: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_observations_recent: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub current_oc_min: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub depth_r_mmag: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub duration_hours: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub ephem_mid_time: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub ephem_period: Option<f64>,
    #[serde(default)]
    pub ra_j2000: String,
    #[serde(default)]
    pub dec_j2000: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub v_mag: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub min_telescope_inches: Option<f64>,
}

impl EphemerisRecord {
    fn ephemeris(&self) -> Result<(f64, f64), String> {
        let epoch = self
            .ephem_mid_time
            .ok_or_else(|| format!("{}: missing ephem_mid_time", self.name))?;
        let period = self
            .ephem_period
            .filter(|p| *p > 0.0)
            .ok_or_else(|| format!("{}: missing or non-positive ephem_period", self.name))?;
        Ok((epoch, period))
    }

    /// Whole periods elapsed since the reference epoch, rounded half away
    /// from zero.
    pub fn iterations(&self, now_jd: f64) -> Result<f64, String> {
        let (epoch, period) = self.ephemeris()?;
        Ok(((now_jd - epoch) / period).round())
    }

    /// Predicted mid-transit JD nearest to `now_jd`, corrected by the
    /// observed O-C when it exceeds the threshold.
    pub fn transit_midpoint(&self, now_jd: f64) -> Result<f64, String> {
        let (epoch, period) = self.ephemeris()?;
        let iterations = self.iterations(now_jd)?;
        let oc_minutes = self.current_oc_min.unwrap_or(0.0);
        let correction = if oc_minutes.abs() > OC_THRESHOLD_MINUTES {
            oc_minutes / MINUTES_PER_DAY
        } else {
            0.0
        };
        Ok(epoch + iterations * period + correction)
    }

    /// Start, mid and end JD of the predicted transit.
    pub fn transit_times(&self, now_jd: f64) -> Result<[f64; 3], String> {
        let mid = self.transit_midpoint(now_jd)?;
        let half = self.duration_hours.unwrap_or(0.0).max(0.0) / 2.0 / 24.0;
        Ok([mid - half, mid, mid + half])
    }

    /// Priority, minimum aperture and observation counts, one per line.
    pub fn comments(&self) -> String {
        let priority = self.priority.as_deref().unwrap_or("").to_uppercase();
        let inches = self.min_telescope_inches.unwrap_or(0.0);
        format!(
            "Priority:  {}\nMin. aperture:  {:.1}mm / {:.1}\"\nTotal obs/Recent:  {} / {}",
            priority,
            inches * MM_PER_INCH,
            inches,
            self.total_observations.unwrap_or(0.0),
            self.total_observations_recent.unwrap_or(0.0),
        )
    }

    pub fn coordinates(&self) -> Result<Coordinates, String> {
        Coordinates::parse_sexagesimal(&self.ra_j2000, &self.dec_j2000)
            .map_err(|e| format!("{}: {}", self.name, e))
    }

    /// Converts the record into the transit nearest to `now_jd`.
    pub fn to_event(&self, now_jd: f64) -> Result<Event, String> {
        let [start, mid, end] = self.transit_times(now_jd)?;
        let kind = EventKind::Transit {
            depth_ppt: self.depth_r_mmag.unwrap_or(0.0),
            percent_transit: 0.0,
            percent_baseline: 0.0,
        };
        let event = Event::new(
            self.name.clone(),
            self.coordinates()?,
            self.v_mag.unwrap_or(0.0),
            [JulianDate::new(start), JulianDate::new(mid), JulianDate::new(end)],
            kind,
        )
        .map_err(|e| e.to_string())?;
        Ok(event.with_comments(self.comments()))
    }
}

/// Parses the keyed JSON dictionary into records.
///
/// A record whose shape does not deserialize is logged with its JSON path
/// and skipped. An empty `name` is replaced by the dictionary key.
pub fn parse_ephemeris_records(text: &str) -> CatalogResult<Vec<EphemerisRecord>> {
    let root: Value = serde_json::from_str(text)?;
    let Value::Object(entries) = root else {
        return Err(CatalogError::Parse(
            "ephemeris database must be a JSON object keyed by planet".to_string(),
        ));
    };

    let mut records = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        match serde_path_to_error::deserialize::<_, EphemerisRecord>(value) {
            Ok(mut record) => {
                if record.name.trim().is_empty() {
                    record.name = key;
                }
                records.push(record);
            }
            Err(e) => log::warn!("Skipping ephemeris entry '{}' at {}: {}", key, e.path(), e.inner()),
        }
    }
    Ok(records)
}

/// Parses the database and predicts each planet's transit nearest `now_jd`.
pub fn parse_ephemeris_json(text: &str, now_jd: f64) -> CatalogResult<Vec<Event>> {
    let records = parse_ephemeris_records(text)?;
    let total = records.len();
    let events: Vec<Event> = records
        .iter()
        .filter_map(|record| match record.to_event(now_jd) {
            Ok(event) => Some(event),
            Err(reason) => {
                log::warn!("Skipping ephemeris entry: {}", reason);
                None
            }
        })
        .collect();
    log::debug!("Predicted {} of {} ephemeris transits", events.len(), total);
    Ok(events)
}
