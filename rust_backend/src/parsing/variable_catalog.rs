//! User-supplied variable-star catalogs.
//!
//! Two shapes are accepted:
//!
//! - manual: `name, comments, v, ra, dec, epoch, period, amplitude, ocrange, phase`
//! - AAVSO target tool export: `Star Name, Notes, Max Mag, Min Mag,
//!   RA (J2000.0), Dec (J2000.0), Period (d)`
//!
//! Headers are matched case-insensitively. Missing optional numbers take
//! their defaults (magnitude 0, epoch 0, period 0, amplitude 1, O-C range 0,
//! phase 0). A row with an epoch and a period defines a periodic extremum;
//! every other row becomes an all-night target.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::config::VariableCatalogFormat;
use crate::core::{Coordinates, Event, EventKind};
use crate::error::{CatalogError, CatalogResult, EventError};
use crate::parsing::fields::{csv_reader, ColumnIndex};
use crate::time::JulianDate;

const DEFAULT_AMPLITUDE: f64 = 1.0;

/// One catalog row after defaults are applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableStarRecord {
    pub name: String,
    pub comments: Option<String>,
    pub magnitude: f64,
    pub coordinates: Coordinates,
    pub epoch: f64,
    pub period: f64,
    pub amplitude: f64,
    pub oc_range_minutes: f64,
    pub phase: f64,
}

impl VariableStarRecord {
    /// Whether the row describes a discrete periodic extremum.
    pub fn has_events(&self) -> bool {
        self.epoch > 0.0 && self.period > 0.0
    }

    fn with_comments(&self, event: Event) -> Event {
        match &self.comments {
            Some(comments) => event.with_comments(comments.clone()),
            None => event,
        }
    }

    /// The next extremum after `reference_jd`.
    ///
    /// Only meaningful when [`has_events`](Self::has_events) is true.
    pub fn periodic_event(&self, reference_jd: f64, span_minutes: f64) -> Result<Event, EventError> {
        let anchor = JulianDate::new(self.epoch);
        let template = Event::new(
            self.name.clone(),
            self.coordinates,
            self.magnitude,
            [anchor, anchor, anchor],
            EventKind::Periodic {
                epoch: self.epoch,
                period: self.period,
                oc_range_minutes: self.oc_range_minutes,
                amplitude: self.amplitude,
                phase: self.phase,
            },
        )?;
        Ok(self.with_comments(template.next_occurrence(reference_jd, span_minutes)?))
    }

    /// An all-night event over the given window.
    pub fn all_night_event(&self, times: [JulianDate; 3]) -> Result<Event, EventError> {
        let event = Event::new(
            self.name.clone(),
            self.coordinates,
            self.magnitude,
            times,
            EventKind::AllNight {
                amplitude: self.amplitude,
            },
        )?;
        Ok(self.with_comments(event))
    }
}

/// Chooses the row shape from the header names.
pub fn detect_format(columns: &ColumnIndex) -> Option<VariableCatalogFormat> {
    if columns.contains("star name") && columns.contains("ra (j2000.0)") {
        Some(VariableCatalogFormat::Aavso)
    } else if columns.contains("name") && columns.contains("ra") && columns.contains("dec") {
        Some(VariableCatalogFormat::Manual)
    } else {
        None
    }
}

/// Parses catalog text in the given (or detected) shape.
pub fn parse_variable_catalog(
    text: &str,
    format: VariableCatalogFormat,
) -> CatalogResult<Vec<VariableStarRecord>> {
    let mut reader = csv_reader(text);
    let headers = reader.headers()?.clone();
    let columns = ColumnIndex::new(&headers);

    let format = match format {
        VariableCatalogFormat::Auto => detect_format(&columns).ok_or_else(|| {
            CatalogError::Parse(format!(
                "unrecognized variable star catalog header: {}",
                headers.iter().collect::<Vec<_>>().join(",")
            ))
        })?,
        explicit => explicit,
    };

    let mut records = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let parsed = match record {
            Ok(record) => match format {
                VariableCatalogFormat::Aavso => aavso_row(&columns, &record),
                _ => manual_row(&columns, &record),
            },
            Err(e) => Err(e.to_string()),
        };
        match parsed {
            Ok(star) => records.push(star),
            Err(reason) => log::warn!("Skipping variable star row {}: {}", line + 1, reason),
        }
    }

    log::debug!("Loaded {} variable stars ({:?} format)", records.len(), format);
    Ok(records)
}

/// Reads and parses a catalog file.
pub fn read_variable_catalog(
    path: &Path,
    format: VariableCatalogFormat,
) -> CatalogResult<Vec<VariableStarRecord>> {
    if !path.exists() {
        return Err(CatalogError::FileNotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    parse_variable_catalog(&text, format)
}

fn coordinates(
    columns: &ColumnIndex,
    record: &csv::StringRecord,
    ra_column: &str,
    dec_column: &str,
    name: &str,
) -> Result<Coordinates, String> {
    let ra = columns
        .get(record, ra_column)
        .ok_or_else(|| format!("{name}: missing {ra_column}"))?;
    let dec = columns
        .get(record, dec_column)
        .ok_or_else(|| format!("{name}: missing {dec_column}"))?;
    Coordinates::parse_sexagesimal(ra, dec).map_err(|e| format!("{name}: {e}"))
}

fn manual_row(columns: &ColumnIndex, record: &csv::StringRecord) -> Result<VariableStarRecord, String> {
    let name = columns
        .get(record, "name")
        .ok_or_else(|| "missing name".to_string())?;
    Ok(VariableStarRecord {
        name: name.to_string(),
        comments: columns.get(record, "comments").map(str::to_string),
        magnitude: columns.number(record, "v").unwrap_or(0.0),
        coordinates: coordinates(columns, record, "ra", "dec", name)?,
        epoch: columns.number(record, "epoch").unwrap_or(0.0),
        period: columns.number(record, "period").unwrap_or(0.0),
        amplitude: columns.number(record, "amplitude").unwrap_or(DEFAULT_AMPLITUDE),
        oc_range_minutes: columns.number(record, "ocrange").unwrap_or(0.0),
        phase: columns.number(record, "phase").unwrap_or(0.0),
    })
}

fn aavso_row(columns: &ColumnIndex, record: &csv::StringRecord) -> Result<VariableStarRecord, String> {
    let name = columns
        .get(record, "star name")
        .ok_or_else(|| "missing star name".to_string())?;
    let max_mag = columns.number(record, "max mag");
    let min_mag = columns.number(record, "min mag");
    let amplitude = match (max_mag, min_mag) {
        (Some(max), Some(min)) if min != max => (min - max).abs(),
        _ => DEFAULT_AMPLITUDE,
    };
    Ok(VariableStarRecord {
        name: name.to_string(),
        comments: columns.get(record, "notes").map(str::to_string),
        magnitude: max_mag.unwrap_or(0.0),
        coordinates: coordinates(columns, record, "ra (j2000.0)", "dec (j2000.0)", name)?,
        epoch: 0.0,
        period: columns.number(record, "period (d)").unwrap_or(0.0),
        amplitude,
        oc_range_minutes: 0.0,
        phase: 0.0,
    })
}
