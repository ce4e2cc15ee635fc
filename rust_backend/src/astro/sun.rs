//! Solar position and twilight windows.
//!
//! Twilight windows are the dark intervals during which the Sun's center is
//! below a threshold altitude: civil (-6°), nautical (-12°) and astronomical
//! (-18°). The solar position uses the low-precision almanac formulae, good
//! to about 0.01° between 1950 and 2050, which is far below the minute-level
//! resolution the filter needs.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::position::horizontal_position;
use crate::core::{Coordinates, GeographicLocation};
use crate::time::{JulianDate, J2000_JD};

/// Twilight threshold altitudes in degrees.
pub mod twilight {
    pub const CIVIL: f64 = -6.0;
    pub const NAUTICAL: f64 = -12.0;
    pub const ASTRONOMICAL: f64 = -18.0;
}

const SEARCH_STEP_MINUTES: i64 = 1;
const SEARCH_SPAN_MINUTES: i64 = 24 * 60;
const REFINE_ITERATIONS: usize = 20;

/// Apparent equatorial coordinates of the Sun at `jd`.
pub fn sun_coordinates(jd: JulianDate) -> Coordinates {
    let n = jd.value() - J2000_JD;
    let mean_longitude = (280.460 + 0.985_647_4 * n).rem_euclid(360.0);
    let mean_anomaly = (357.528 + 0.985_600_3 * n).rem_euclid(360.0).to_radians();
    let ecliptic_longitude = (mean_longitude
        + 1.915 * mean_anomaly.sin()
        + 0.020 * (2.0 * mean_anomaly).sin())
    .to_radians();
    let obliquity = (23.439 - 0.000_000_4 * n).to_radians();

    let ra = (obliquity.cos() * ecliptic_longitude.sin())
        .atan2(ecliptic_longitude.cos())
        .to_degrees();
    let dec = (obliquity.sin() * ecliptic_longitude.sin()).asin().to_degrees();

    Coordinates::from_raw(ra.rem_euclid(360.0) / 15.0, dec)
}

/// Altitude of the Sun's center in degrees.
pub fn sun_altitude(location: &GeographicLocation, instant: DateTime<Utc>) -> f64 {
    let sun = sun_coordinates(JulianDate::from_datetime(instant));
    horizontal_position(&sun, location, instant).altitude
}

/// A dark interval between the Sun setting below a threshold and rising above it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TwilightWindow {
    pub set: DateTime<Utc>,
    pub rise: DateTime<Utc>,
}

impl TwilightWindow {
    /// Whether `instant` lies strictly between set and rise.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.set < instant && instant < self.rise
    }

    pub fn duration(&self) -> Duration {
        self.rise - self.set
    }
}

/// Twilight windows for one night. `None` means the Sun never gets below
/// the threshold (for example midnight sun).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NighttimeWindows {
    pub civil: Option<TwilightWindow>,
    pub nautical: Option<TwilightWindow>,
    pub astronomical: Option<TwilightWindow>,
}

/// Computes twilight windows for an observer.
#[derive(Debug, Clone, Copy)]
pub struct NighttimeCalculator {
    location: GeographicLocation,
}

impl NighttimeCalculator {
    pub fn new(location: GeographicLocation) -> Self {
        Self { location }
    }

    /// Most recent local mean solar noon at or before `now`.
    ///
    /// A night is always searched from the preceding noon, so running the
    /// search after midnight still finds the night in progress.
    pub fn reference_noon(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let offset = Duration::seconds((self.location.longitude / 15.0 * 3600.0).round() as i64);
        let solar = now + offset;
        let noon = solar
            .date_naive()
            .and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default())
            .and_utc();
        let noon = if noon > solar {
            noon - Duration::days(1)
        } else {
            noon
        };
        noon - offset
    }

    /// Twilight windows of the night following the noon before `now`.
    ///
    /// # Example
    /// ```
    /// use exoplanets_rust::astro::NighttimeCalculator;
    /// use exoplanets_rust::core::GeographicLocation;
    /// use chrono::{TimeZone, Utc};
    ///
    /// let calculator = NighttimeCalculator::new(GeographicLocation::new(28.76, -17.89, 2396.0));
    /// let night = calculator.calculate(Utc.with_ymd_and_hms(2026, 1, 15, 20, 0, 0).unwrap());
    /// let civil = night.civil.unwrap();
    /// let nautical = night.nautical.unwrap();
    /// assert!(civil.set < nautical.set && nautical.rise < civil.rise);
    /// ```
    pub fn calculate(&self, now: DateTime<Utc>) -> NighttimeWindows {
        let from = self.reference_noon(now);
        let windows = NighttimeWindows {
            civil: self.twilight_window(from, twilight::CIVIL),
            nautical: self.twilight_window(from, twilight::NAUTICAL),
            astronomical: self.twilight_window(from, twilight::ASTRONOMICAL),
        };
        log::debug!(
            "Twilight windows from {}: civil={:?} nautical={:?} astronomical={:?}",
            from,
            windows.civil,
            windows.nautical,
            windows.astronomical
        );
        windows
    }

    /// Dark window below `threshold` within 24 hours after `from`.
    ///
    /// If the Sun is already below the threshold at `from` the window starts
    /// there; if it does not come back up within 24 hours the window ends
    /// 24 hours after `from`.
    pub fn twilight_window(&self, from: DateTime<Utc>, threshold: f64) -> Option<TwilightWindow> {
        let below = |t: DateTime<Utc>| sun_altitude(&self.location, t) < threshold;
        let step = Duration::minutes(SEARCH_STEP_MINUTES);
        let end = from + Duration::minutes(SEARCH_SPAN_MINUTES);

        let set = if below(from) {
            from
        } else {
            self.find_transition(from, end, step, &below, true)?
        };
        let rise = self
            .find_transition(set, end, step, &below, false)
            .unwrap_or(end);
        Some(TwilightWindow { set, rise })
    }

    /// First instant in `[from, end]` at which `below` switches to `to_below`.
    fn find_transition(
        &self,
        from: DateTime<Utc>,
        end: DateTime<Utc>,
        step: Duration,
        below: &impl Fn(DateTime<Utc>) -> bool,
        to_below: bool,
    ) -> Option<DateTime<Utc>> {
        let mut previous = from;
        let mut previous_below = below(from);
        let mut current = from + step;
        while current <= end {
            let current_below = below(current);
            if current_below == to_below && previous_below != to_below {
                return Some(self.refine(previous, current, below, to_below));
            }
            previous = current;
            previous_below = current_below;
            current += step;
        }
        None
    }

    fn refine(
        &self,
        mut before: DateTime<Utc>,
        mut after: DateTime<Utc>,
        below: &impl Fn(DateTime<Utc>) -> bool,
        to_below: bool,
    ) -> DateTime<Utc> {
        for _ in 0..REFINE_ITERATIONS {
            let mid = before + (after - before) / 2;
            if below(mid) == to_below {
                after = mid;
            } else {
                before = mid;
            }
        }
        after
    }
}
