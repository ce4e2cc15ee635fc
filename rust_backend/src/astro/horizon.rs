//! Custom horizon profiles.
//!
//! A profile is a list of `(azimuth, altitude)` points. Altitudes between
//! points are linearly interpolated, wrapping across north. A custom profile
//! needs at least two distinct azimuths; the flat 0° horizon has no points.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HorizonProfile {
    points: Vec<(f64, f64)>,
}

impl HorizonProfile {
    /// The flat mathematical horizon.
    pub fn flat() -> Self {
        Self::default()
    }

    /// Builds a profile from `(azimuth, altitude)` points in any order.
    ///
    /// Azimuths are normalized to [0, 360). At least two distinct azimuths
    /// must remain, and two points landing on the same azimuth are rejected.
    pub fn from_points(points: Vec<(f64, f64)>) -> ConfigResult<Self> {
        let mut normalized = Vec::with_capacity(points.len());
        for (az, alt) in points {
            if !az.is_finite() || !alt.is_finite() {
                return Err(ConfigError::Horizon(format!("point ({az}, {alt}) is not finite")));
            }
            if !(-90.0..=90.0).contains(&alt) {
                return Err(ConfigError::Horizon(format!("altitude {alt} is outside [-90, 90]")));
            }
            normalized.push((az.rem_euclid(360.0), alt));
        }
        normalized.sort_by(|a, b| a.0.total_cmp(&b.0));
        if let Some(pair) = normalized.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(ConfigError::Horizon(format!(
                "azimuth {} is given more than once",
                pair[0].0
            )));
        }
        if normalized.len() < 2 {
            return Err(ConfigError::Horizon(format!(
                "at least two points are required, got {}",
                normalized.len()
            )));
        }
        Ok(Self { points: normalized })
    }

    /// Parses whitespace separated `azimuth altitude` lines.
    ///
    /// Blank lines and lines starting with `#` are ignored.
    ///
    /// # Example
    /// ```
    /// use exoplanets_rust::astro::HorizonProfile;
    ///
    /// let profile = HorizonProfile::parse("# az alt\n0 10\n180 30\n").unwrap();
    /// assert_eq!(profile.altitude_at(90.0), 20.0);
    /// ```
    pub fn parse(text: &str) -> ConfigResult<Self> {
        let mut points = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            let parsed = match fields.as_slice() {
                [az, alt] => az.parse::<f64>().ok().zip(alt.parse::<f64>().ok()),
                _ => None,
            };
            match parsed {
                Some(point) => points.push(point),
                None => {
                    return Err(ConfigError::Horizon(format!(
                        "line {}: expected 'azimuth altitude', got '{}'",
                        idx + 1,
                        line
                    )))
                }
            }
        }
        Self::from_points(points)
    }

    /// Loads a horizon file from disk.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn is_flat(&self) -> bool {
        self.points.is_empty()
    }

    /// Horizon altitude in degrees at `azimuth`.
    pub fn altitude_at(&self, azimuth: f64) -> f64 {
        let az = azimuth.rem_euclid(360.0);
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return 0.0,
        };
        let (lower, upper) = match self.points.iter().position(|p| p.0 > az) {
            Some(0) | None => {
                // wrap segment between the last and first point
                (last, (first.0 + 360.0, first.1))
            }
            Some(i) => (self.points[i - 1], self.points[i]),
        };
        let az = if az < lower.0 { az + 360.0 } else { az };
        let span = upper.0 - lower.0;
        if span <= 0.0 {
            return lower.1;
        }
        lower.1 + (upper.1 - lower.1) * (az - lower.0) / span
    }
}
