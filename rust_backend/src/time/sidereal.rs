//! Mean sidereal time and hour angles.
//!
//! All results are in hours and wrapped into `[0, 24)`.

use chrono::{DateTime, Utc};

use super::julian::{JulianDate, J2000_JD};

/// Greenwich mean sidereal time in hours for a Julian Date (UT).
///
/// Uses the IAU 1982 polynomial in Julian centuries since J2000.
pub fn greenwich_sidereal_time(jd: JulianDate) -> f64 {
    let d = jd.value() - J2000_JD;
    let t = d / 36_525.0;
    let degrees = 280.460_618_37 + 360.985_647_366_29 * d + 0.000_387_933 * t * t
        - t * t * t / 38_710_000.0;
    degrees.rem_euclid(360.0) / 15.0
}

/// Local mean sidereal time in hours.
///
/// # Arguments
/// * `instant` - UTC instant
/// * `longitude_deg` - observer longitude, east positive
///
/// # Example
/// ```
/// use exoplanets_rust::time::local_sidereal_time;
/// use chrono::{TimeZone, Utc};
///
/// let lst = local_sidereal_time(Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap(), 0.0);
/// assert!((0.0..24.0).contains(&lst));
/// ```
pub fn local_sidereal_time(instant: DateTime<Utc>, longitude_deg: f64) -> f64 {
    let gmst = greenwich_sidereal_time(JulianDate::from_datetime(instant));
    (gmst + longitude_deg / 15.0).rem_euclid(24.0)
}

/// Hour angle in hours, wrapped into `[0, 24)`.
///
/// Zero means the object is on the local meridian; values just below 24 mean
/// it is about to cross it.
pub fn hour_angle(sidereal_time_hours: f64, ra_hours: f64) -> f64 {
    (sidereal_time_hours - ra_hours).rem_euclid(24.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_gmst_reference_value() {
        // 1987-04-10 19:21:00 UT has GMST 8h34m57.0896s
        let instant = Utc.with_ymd_and_hms(1987, 4, 10, 19, 21, 0).unwrap();
        let gmst = greenwich_sidereal_time(JulianDate::from_datetime(instant));
        let expected = 8.0 + 34.0 / 60.0 + 57.0896 / 3600.0;
        assert!((gmst - expected).abs() < 1e-4, "gmst = {gmst}");
    }

    #[test]
    fn test_local_sidereal_time_shifts_with_longitude() {
        let instant = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        let greenwich = local_sidereal_time(instant, 0.0);
        let east = local_sidereal_time(instant, 90.0);
        assert!(((east - greenwich).rem_euclid(24.0) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_hour_angle_wraps() {
        assert!((hour_angle(1.0, 23.0) - 2.0).abs() < 1e-12);
        assert!((hour_angle(23.0, 1.0) - 22.0).abs() < 1e-12);
        assert_eq!(hour_angle(5.0, 5.0), 0.0);
    }
}
