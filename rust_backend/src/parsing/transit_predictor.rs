//! Transit predictor CSV rows.
//!
//! The predictor reports Julian Dates relative to 2450000 and a combined
//! `coords(J2000)` column holding sexagesimal RA and Dec separated by a
//! space. The JD columns are authoritative; the civil time columns are
//! ignored.

use crate::core::{Coordinates, Event, EventKind};
use crate::error::CatalogResult;
use crate::parsing::fields::{csv_reader, ColumnIndex};
use crate::time::JulianDate;

/// Offset added to the predictor's relative Julian Dates.
pub const TRANSIT_PREDICTOR_JD_OFFSET: f64 = 2_450_000.0;

const NAME: &str = "Name";
const COMMENTS: &str = "comments";
const MAGNITUDE: &str = "V";
const JD_START: &str = "jd_start";
const JD_MID: &str = "jd_mid";
const JD_END: &str = "jd_end";
const COORDINATES: &str = "coords(J2000)";
const DEPTH: &str = "depth(ppt)";
const PERCENT_TRANSIT: &str = "percent_transit_observable";
const PERCENT_BASELINE: &str = "percent_baseline_observable";

/// Parses a transit predictor table into transit events.
///
/// Rows without a name, coordinates or the three JD columns are skipped.
/// A missing magnitude, depth or percentage defaults to 0.
pub fn parse_transit_predictor_csv(text: &str) -> CatalogResult<Vec<Event>> {
    let mut reader = csv_reader(text);
    let headers = reader.headers()?.clone();
    let columns = ColumnIndex::new(&headers);

    let mut events = Vec::new();
    let mut skipped = 0usize;
    for (line, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Skipping unreadable transit row {}: {}", line + 1, e);
                skipped += 1;
                continue;
            }
        };
        match row_to_event(&columns, &record) {
            Ok(event) => events.push(event),
            Err(reason) => {
                log::warn!("Skipping transit row {}: {}", line + 1, reason);
                skipped += 1;
            }
        }
    }

    log::debug!(
        "Parsed {} transits from predictor table ({} skipped)",
        events.len(),
        skipped
    );
    Ok(events)
}

fn row_to_event(columns: &ColumnIndex, record: &csv::StringRecord) -> Result<Event, String> {
    let name = columns
        .get(record, NAME)
        .ok_or_else(|| "missing name".to_string())?;

    let coords_text = columns
        .get(record, COORDINATES)
        .ok_or_else(|| format!("{name}: missing coordinates"))?;
    let coordinates = split_coordinates(coords_text)
        .ok_or_else(|| format!("{name}: unreadable coordinates '{coords_text}'"))?;

    let jd = |column: &str| {
        columns
            .number(record, column)
            .map(|value| JulianDate::new(value + TRANSIT_PREDICTOR_JD_OFFSET))
            .ok_or_else(|| format!("{name}: missing {column}"))
    };
    let times = [jd(JD_START)?, jd(JD_MID)?, jd(JD_END)?];

    let kind = EventKind::Transit {
        depth_ppt: columns.number(record, DEPTH).unwrap_or(0.0),
        percent_transit: columns.number(record, PERCENT_TRANSIT).unwrap_or(0.0),
        percent_baseline: columns.number(record, PERCENT_BASELINE).unwrap_or(0.0),
    };
    let magnitude = columns.number(record, MAGNITUDE).unwrap_or(0.0);

    let event = Event::new(name, coordinates, magnitude, times, kind).map_err(|e| e.to_string())?;
    Ok(match columns.get(record, COMMENTS) {
        Some(comments) => event.with_comments(comments),
        None => event,
    })
}

/// Splits `"HH:MM:SS.s +DD:MM:SS"` into coordinates.
fn split_coordinates(text: &str) -> Option<Coordinates> {
    let mut parts = text.split_whitespace();
    let ra = parts.next()?;
    let dec = parts.next()?;
    Coordinates::parse_sexagesimal(ra, dec).ok()
}
