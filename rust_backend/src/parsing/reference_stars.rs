//! Reference-star payloads: catalogued variables, chart comparison stars and
//! colour-matched comparison stars from a TAP service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::Coordinates;
use crate::error::CatalogResult;
use crate::parsing::fields::{lenient_f64, lenient_string};

/// A catalogued star near the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceStar {
    pub name: String,
    pub coordinates: Coordinates,
    pub magnitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct VsxRoot {
    #[serde(rename = "VSXObjects", default)]
    objects: Option<VsxObjects>,
}

#[derive(Debug, Deserialize)]
struct VsxObjects {
    #[serde(rename = "VSXObject", default)]
    object: OneOrMany<VsxObject>,
}

#[derive(Debug, Deserialize)]
struct VsxObject {
    #[serde(rename = "Name", default, deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(rename = "RA2000", default, deserialize_with = "lenient_f64")]
    ra_degrees: Option<f64>,
    #[serde(rename = "Declination2000", default, deserialize_with = "lenient_f64")]
    dec_degrees: Option<f64>,
    #[serde(rename = "MaxMag", default, deserialize_with = "lenient_f64")]
    max_mag: Option<f64>,
}

/// The variable-star list returns a bare object instead of an array when
/// only one star matches.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

/// Parses the variable-star list (`VSXObjects.VSXObject[]`, degrees as strings).
pub fn parse_vsx_variable_stars(text: &str) -> CatalogResult<Vec<ReferenceStar>> {
    let root: VsxRoot = serde_json::from_str(text)?;
    let objects = root
        .objects
        .map(|o| o.object.into_vec())
        .unwrap_or_default();

    Ok(objects
        .into_iter()
        .filter_map(|object| {
            let name = object.name?;
            let coordinates = Coordinates::from_degrees(object.ra_degrees?, object.dec_degrees?).ok()?;
            Some(ReferenceStar {
                name,
                coordinates,
                magnitude: object.max_mag,
            })
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct ChartRoot {
    #[serde(default)]
    photometry: Vec<ChartStar>,
}

#[derive(Debug, Deserialize)]
struct ChartStar {
    #[serde(default)]
    auid: Option<String>,
    #[serde(default)]
    ra: String,
    #[serde(default)]
    dec: String,
    #[serde(default)]
    bands: Vec<ChartBand>,
}

#[derive(Debug, Deserialize)]
struct ChartBand {
    #[serde(default)]
    band: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    mag: Option<f64>,
}

/// Parses chart comparison stars (`photometry[]` with sexagesimal positions).
///
/// The magnitude is the V band when present.
pub fn parse_chart_comparison_stars(text: &str) -> CatalogResult<Vec<ReferenceStar>> {
    let root: ChartRoot = serde_json::from_str(text)?;
    Ok(root
        .photometry
        .into_iter()
        .filter_map(|star| {
            let coordinates = Coordinates::parse_sexagesimal(&star.ra, &star.dec).ok()?;
            let magnitude = star
                .bands
                .iter()
                .find(|b| b.band.eq_ignore_ascii_case("V"))
                .and_then(|b| b.mag);
            Some(ReferenceStar {
                name: star.auid.unwrap_or_default(),
                coordinates,
                magnitude,
            })
        })
        .collect())
}

/// Rows of a TAP JSON response.
fn tap_rows(text: &str) -> CatalogResult<Vec<Vec<Value>>> {
    #[derive(Deserialize)]
    struct TapResponse {
        #[serde(default)]
        data: Vec<Vec<Value>>,
    }
    let response: TapResponse = serde_json::from_str(text)?;
    Ok(response.data)
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// First cell of the first row of the identifier lookup, if any.
pub fn parse_simbad_oid(text: &str) -> CatalogResult<Option<i64>> {
    let rows = tap_rows(text)?;
    Ok(rows
        .first()
        .and_then(|row| number(row.first()))
        .map(|oid| oid as i64))
}

/// Colour-matched comparison stars: rows of `main_id, B, V, R, ra, dec`.
pub fn parse_simbad_comparison_stars(text: &str) -> CatalogResult<Vec<ReferenceStar>> {
    let rows = tap_rows(text)?;
    Ok(rows
        .iter()
        .filter_map(|row| {
            let name = match row.first()? {
                Value::String(s) => s.trim().to_string(),
                other => other.to_string(),
            };
            let coordinates = Coordinates::from_degrees(number(row.get(4))?, number(row.get(5))?).ok()?;
            Some(ReferenceStar {
                name,
                coordinates,
                magnitude: number(row.get(2)),
            })
        })
        .collect())
}
