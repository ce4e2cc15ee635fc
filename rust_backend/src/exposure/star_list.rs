//! CSV export of the stars matched on the final frame.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::algorithms::{MatchedStar, StarField};
use crate::error::{ExposureError, ExposureResult};

#[derive(Debug, Serialize)]
struct StarListRow<'a> {
    #[serde(rename = "type")]
    class: &'a str,
    name: &'a str,
    hfr: f64,
    x: f64,
    y: f64,
    avg_brightness: f64,
    max_brightness: f64,
    background: f64,
    ra: Option<f64>,
    dec: Option<f64>,
}

impl<'a> From<&'a MatchedStar> for StarListRow<'a> {
    fn from(matched: &'a MatchedStar) -> Self {
        StarListRow {
            class: matched.class.label(),
            name: &matched.name,
            hfr: matched.star.hfr,
            x: matched.star.position.x,
            y: matched.star.position.y,
            avg_brightness: matched.star.average_brightness,
            max_brightness: matched.star.max_brightness,
            background: matched.star.background,
            ra: matched.coordinates.map(|c| c.ra_degrees()),
            dec: matched.coordinates.map(|c| c.dec_degrees()),
        }
    }
}

/// File name for a star list: the target name with anything unsafe in a
/// path replaced by `_`, and a UTC timestamp.
pub fn star_list_file_name(target: &str, at: DateTime<Utc>) -> String {
    let safe: String = target
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{}_{}.csv", safe, at.format("%Y%m%dT%H%M%SZ"))
}

/// Writes every star of `field` in priority order to a new CSV file in
/// `directory`.
///
/// # Returns
/// The path of the written file
pub fn write_star_list(
    directory: &Path,
    target: &str,
    field: &StarField,
    at: DateTime<Utc>,
) -> ExposureResult<PathBuf> {
    let path = directory.join(star_list_file_name(target, at));
    let mut writer =
        csv::Writer::from_path(&path).map_err(|e| ExposureError::StarList(e.to_string()))?;
    for star in field.stars() {
        writer
            .serialize(StarListRow::from(star))
            .map_err(|e| ExposureError::StarList(e.to_string()))?;
    }
    writer
        .flush()
        .map_err(|e| ExposureError::StarList(e.to_string()))?;
    log::info!("Saved {} stars to {}", field.stars().count(), path.display());
    Ok(path)
}
