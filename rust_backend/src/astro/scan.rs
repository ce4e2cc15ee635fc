//! Fixed-step altitude scans.
//!
//! Each scan starts at the object's hour angle for the given instant and
//! walks 24 hours forward in 0.1 h hour-angle steps. The instant attached to
//! step `k` is `from + k * 6 min`.

use chrono::{DateTime, Duration, Utc};

use super::horizon::HorizonProfile;
use super::position::{altitude, azimuth};
use crate::core::{Coordinates, GeographicLocation};
use crate::time::{hour_angle, local_sidereal_time};

/// Hour-angle step of every scan, in hours.
pub const SCAN_STEP_HOURS: f64 = 0.1;

/// Number of steps covering 24 hours.
pub const SCAN_STEPS: usize = 240;

struct ScanPoint {
    instant: DateTime<Utc>,
    altitude: f64,
    azimuth: f64,
}

fn scan(
    coords: &Coordinates,
    location: &GeographicLocation,
    from: DateTime<Utc>,
) -> impl Iterator<Item = ScanPoint> {
    let lst = local_sidereal_time(from, location.longitude);
    let start_ha = hour_angle(lst, coords.ra_hours());
    let latitude = location.latitude;
    let dec = coords.dec_degrees();
    (0..SCAN_STEPS).map(move |k| {
        let ha_deg = (start_ha + k as f64 * SCAN_STEP_HOURS) * 15.0;
        let alt = altitude(ha_deg, latitude, dec);
        ScanPoint {
            instant: from + Duration::minutes(6 * k as i64),
            altitude: alt,
            azimuth: azimuth(ha_deg, alt, latitude, dec),
        }
    })
}

/// Time of upper culmination within 24 hours after `from`.
///
/// This is the step with the highest altitude; ties keep the earliest step.
pub fn meridian_transit_time(
    coords: &Coordinates,
    location: &GeographicLocation,
    from: DateTime<Utc>,
) -> DateTime<Utc> {
    let mut best: Option<ScanPoint> = None;
    for point in scan(coords, location, from) {
        match &best {
            Some(b) if point.altitude <= b.altitude => {}
            _ => best = Some(point),
        }
    }
    best.map(|p| p.instant).unwrap_or(from)
}

/// First scan step at or after `from` where the object is above `horizon`.
///
/// Returns `None` if the object stays below the horizon for 24 hours.
pub fn next_rise_time(
    coords: &Coordinates,
    location: &GeographicLocation,
    horizon: &HorizonProfile,
    from: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    scan(coords, location, from)
        .find(|p| p.altitude > horizon.altitude_at(p.azimuth))
        .map(|p| p.instant)
}

/// First scan step at or after `from` where the object is below `horizon`.
///
/// Returns `None` for objects that never set within 24 hours.
pub fn next_set_time(
    coords: &Coordinates,
    location: &GeographicLocation,
    horizon: &HorizonProfile,
    from: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    scan(coords, location, from)
        .find(|p| p.altitude < horizon.altitude_at(p.azimuth))
        .map(|p| p.instant)
}
