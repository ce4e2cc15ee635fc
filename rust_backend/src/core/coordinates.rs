//! Equatorial coordinates, observer location and sexagesimal text handling.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference epoch of a coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Epoch {
    #[default]
    J2000,
    JNow,
}

/// Right ascension / declination pair.
///
/// Right ascension is kept in hours `[0, 24)` and declination in degrees
/// `[-90, 90]`. Values are validated on construction and never change
/// afterwards; altitude and azimuth are derived on demand in
/// [`crate::astro::position`].
///
/// # Examples
///
/// ```
/// use exoplanets_rust::core::Coordinates;
///
/// let coords = Coordinates::parse_sexagesimal("20:13:31.62", "+65:09:43.5").unwrap();
/// assert!((coords.ra_hours() - 20.2254500).abs() < 1e-6);
/// assert!((coords.dec_degrees() - 65.1620833).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    ra_hours: f64,
    dec_degrees: f64,
    epoch: Epoch,
}

impl Coordinates {
    /// Creates J2000 coordinates from right ascension in hours and declination in degrees.
    ///
    /// Right ascension is wrapped into `[0, 24)`. Declination outside
    /// `[-90, 90]` or non-finite input is rejected.
    pub fn new(ra_hours: f64, dec_degrees: f64) -> Result<Self, String> {
        if !ra_hours.is_finite() || !dec_degrees.is_finite() {
            return Err(format!(
                "Coordinates must be finite (ra={ra_hours}, dec={dec_degrees})"
            ));
        }
        if !(-90.0..=90.0).contains(&dec_degrees) {
            return Err(format!("Declination {dec_degrees} is outside [-90, 90]"));
        }
        Ok(Self {
            ra_hours: ra_hours.rem_euclid(24.0),
            dec_degrees,
            epoch: Epoch::J2000,
        })
    }

    /// Builds coordinates from values already known to be in range.
    pub(crate) fn from_raw(ra_hours: f64, dec_degrees: f64) -> Self {
        Self {
            ra_hours: ra_hours.rem_euclid(24.0),
            dec_degrees: dec_degrees.clamp(-90.0, 90.0),
            epoch: Epoch::J2000,
        }
    }

    /// Creates J2000 coordinates from right ascension and declination both in degrees.
    pub fn from_degrees(ra_degrees: f64, dec_degrees: f64) -> Result<Self, String> {
        Self::new(ra_degrees / 15.0, dec_degrees)
    }

    /// Parses sexagesimal strings such as `"12:34:56.7"` and `"-05 06 07"`.
    pub fn parse_sexagesimal(ra: &str, dec: &str) -> Result<Self, String> {
        let ra_deg =
            hms_to_degrees(ra).ok_or_else(|| format!("Invalid right ascension '{ra}'"))?;
        let dec_deg = dms_to_degrees(dec).ok_or_else(|| format!("Invalid declination '{dec}'"))?;
        Self::from_degrees(ra_deg, dec_deg)
    }

    /// Returns a copy tagged with another epoch. No precession is applied.
    pub fn with_epoch(mut self, epoch: Epoch) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn ra_hours(&self) -> f64 {
        self.ra_hours
    }

    pub fn ra_degrees(&self) -> f64 {
        self.ra_hours * 15.0
    }

    pub fn dec_degrees(&self) -> f64 {
        self.dec_degrees
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Right ascension as `HH:MM:SS.ss`.
    pub fn ra_string(&self) -> String {
        format_hms(self.ra_hours)
    }

    /// Declination as `+DD:MM:SS.s`.
    pub fn dec_string(&self) -> String {
        format_dms(self.dec_degrees)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ra_string(), self.dec_string())
    }
}

/// Observer position on Earth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeographicLocation {
    /// Latitude in degrees, north positive
    pub latitude: f64,
    /// Longitude in degrees, east positive
    pub longitude: f64,
    /// Elevation above sea level in meters
    #[serde(default)]
    pub elevation: f64,
}

impl GeographicLocation {
    pub fn new(latitude: f64, longitude: f64, elevation: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation,
        }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=360.0).contains(&self.longitude)
    }
}

impl Default for GeographicLocation {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

fn sexagesimal_parts(text: &str) -> Option<(f64, Vec<f64>)> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let (sign, body) = match trimmed.chars().next() {
        Some('-') => (-1.0, &trimmed[1..]),
        Some('+') => (1.0, &trimmed[1..]),
        _ => (1.0, trimmed),
    };
    let parts = body
        .split(|c: char| c.is_whitespace() || matches!(c, ':' | 'h' | 'm' | 's' | 'd' | '°' | '\'' | '"'))
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<f64>().ok())
        .collect::<Option<Vec<f64>>>()?;
    if parts.is_empty() || parts.len() > 3 || parts.iter().any(|v| *v < 0.0) {
        return None;
    }
    Some((sign, parts))
}

fn sexagesimal_value(parts: &[f64]) -> f64 {
    parts
        .iter()
        .zip([1.0, 60.0, 3600.0])
        .map(|(value, divisor)| value / divisor)
        .sum()
}

/// Converts an hours-minutes-seconds string to degrees.
///
/// # Example
/// ```
/// use exoplanets_rust::core::coordinates::hms_to_degrees;
///
/// assert_eq!(hms_to_degrees("06:00:00"), Some(90.0));
/// assert_eq!(hms_to_degrees("garbage"), None);
/// ```
pub fn hms_to_degrees(text: &str) -> Option<f64> {
    let (sign, parts) = sexagesimal_parts(text)?;
    Some(sign * sexagesimal_value(&parts) * 15.0)
}

/// Converts a degrees-minutes-seconds string to degrees, honouring a
/// leading sign even when the degree field is zero (`"-00:30:00"`).
pub fn dms_to_degrees(text: &str) -> Option<f64> {
    let (sign, parts) = sexagesimal_parts(text)?;
    Some(sign * sexagesimal_value(&parts))
}

/// Formats hours as `HH:MM:SS.ss`.
pub fn format_hms(hours: f64) -> String {
    let centiseconds = (hours.rem_euclid(24.0) * 360_000.0).round() as i64 % (24 * 360_000);
    let h = centiseconds / 360_000;
    let m = (centiseconds % 360_000) / 6_000;
    let s = (centiseconds % 6_000) as f64 / 100.0;
    format!("{h:02}:{m:02}:{s:05.2}")
}

/// Formats degrees as `+DD:MM:SS.s`.
pub fn format_dms(degrees: f64) -> String {
    let sign = if degrees < 0.0 { '-' } else { '+' };
    let deciseconds = (degrees.abs() * 36_000.0).round() as i64;
    let d = deciseconds / 36_000;
    let m = (deciseconds % 36_000) / 600;
    let s = (deciseconds % 600) as f64 / 10.0;
    format!("{sign}{d:02}:{m:02}:{s:04.1}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variants() {
        assert_eq!(hms_to_degrees("12 00 00"), Some(180.0));
        assert_eq!(hms_to_degrees("12h30m00s"), Some(187.5));
        assert_eq!(dms_to_degrees("-45:30:00"), Some(-45.5));
        assert_eq!(dms_to_degrees("+10"), Some(10.0));
        assert_eq!(dms_to_degrees("-00:30:00"), Some(-0.5));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(hms_to_degrees(""), None);
        assert_eq!(hms_to_degrees("12:xx:00"), None);
        assert_eq!(dms_to_degrees("1:2:3:4"), None);
        assert_eq!(dms_to_degrees("10:-5:00"), None);
    }

    #[test]
    fn test_new_validates_and_wraps() {
        let c = Coordinates::new(25.0, 10.0).unwrap();
        assert!((c.ra_hours() - 1.0).abs() < 1e-12);
        assert!(Coordinates::new(1.0, 91.0).is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
        assert_eq!(c.epoch(), Epoch::J2000);
    }

    #[test]
    fn test_format_round_trip() {
        let c = Coordinates::parse_sexagesimal("05:35:17.30", "-05:23:28.0").unwrap();
        assert_eq!(c.ra_string(), "05:35:17.30");
        assert_eq!(c.dec_string(), "-05:23:28.0");
    }

    #[test]
    fn test_format_carries_rounding() {
        assert_eq!(format_hms(23.999_999_999), "00:00:00.00");
        assert_eq!(format_dms(9.999_999_99), "+10:00:00.0");
    }
}
