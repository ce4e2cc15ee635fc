use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Julian Date of the Unix epoch, 1970-01-01 00:00:00 UTC.
pub const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Julian Date of the J2000.0 reference epoch, 2000-01-01 12:00:00 TT.
pub const J2000_JD: f64 = 2_451_545.0;

/// Number of SI seconds in a day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Julian Date representation.
/// JD 0 = 4713-01-01 12:00:00 BC on the proleptic Julian calendar.
///
/// # Examples
///
/// ```
/// use exoplanets_rust::time::JulianDate;
/// use chrono::{TimeZone, Utc};
///
/// let jd = JulianDate::from_datetime(Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap());
/// assert!((jd.value() - 2451545.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct JulianDate(f64);

impl JulianDate {
    /// Create a new JD value.
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    /// Raw JD value as f64.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Convert to Unix timestamp (seconds since 1970-01-01 00:00:00 UTC).
    pub fn to_unix_timestamp(&self) -> f64 {
        (self.0 - UNIX_EPOCH_JD) * SECONDS_PER_DAY
    }

    /// Create from Unix timestamp (seconds since 1970-01-01 00:00:00 UTC).
    pub fn from_unix_timestamp(timestamp: f64) -> Self {
        Self(timestamp / SECONDS_PER_DAY + UNIX_EPOCH_JD)
    }

    /// Convert to chrono `DateTime<Utc>`.
    ///
    /// The result is rounded to the millisecond, which is coarser than the
    /// resolution of an f64 JD. Values outside chrono's representable range
    /// collapse to the Unix epoch.
    pub fn to_datetime(&self) -> DateTime<Utc> {
        let millis = (self.to_unix_timestamp() * 1000.0).round() as i64;
        DateTime::from_timestamp_millis(millis).unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// Create from any timezone-aware chrono `DateTime`.
    pub fn from_datetime<Tz: TimeZone>(dt: DateTime<Tz>) -> Self {
        Self::from_unix_timestamp(
            dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) / 1e9,
        )
    }

    /// Convert to the host's local civil time.
    pub fn to_local(&self) -> DateTime<Local> {
        self.to_datetime().with_timezone(&Local)
    }

    /// Returns a new date shifted by a fractional number of days.
    pub fn add_days(self, days: f64) -> Self {
        Self(self.0 + days)
    }

    /// Returns a new date shifted by a chrono duration.
    pub fn add_duration(self, duration: Duration) -> Self {
        let seconds = duration.num_milliseconds() as f64 / 1000.0;
        Self(self.0 + seconds / SECONDS_PER_DAY)
    }

    /// Signed number of days from `earlier` to `self`.
    pub fn days_since(&self, earlier: JulianDate) -> f64 {
        self.0 - earlier.0
    }

    /// Whether this instant lies strictly after `instant`.
    pub fn is_after(&self, instant: DateTime<Utc>) -> bool {
        self.0 > JulianDate::from_datetime(instant).0
    }
}

impl From<f64> for JulianDate {
    fn from(value: f64) -> Self {
        JulianDate::new(value)
    }
}

impl From<DateTime<Utc>> for JulianDate {
    fn from(dt: DateTime<Utc>) -> Self {
        JulianDate::from_datetime(dt)
    }
}

impl fmt::Display for JulianDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JD {:.5}", self.0)
    }
}

/// Convert a Julian Date to a UTC timestamp.
///
/// # Arguments
/// * `jd` - Julian Date value
///
/// # Returns
/// * `DateTime<Utc>` - the same instant in UTC
pub fn julian_to_utc(jd: f64) -> DateTime<Utc> {
    JulianDate::new(jd).to_datetime()
}

/// Convert a Julian Date to the host's local civil time.
///
/// # Example
/// ```
/// use exoplanets_rust::time::{julian_to_local, datetime_to_julian};
///
/// let local = julian_to_local(2459016.3);
/// assert!((datetime_to_julian(&local) - 2459016.3).abs() < 1e-6);
/// ```
pub fn julian_to_local(jd: f64) -> DateTime<Local> {
    JulianDate::new(jd).to_local()
}

/// Convert any timezone-aware timestamp to a Julian Date.
pub fn datetime_to_julian<Tz: TimeZone>(dt: &DateTime<Tz>) -> f64 {
    JulianDate::from_datetime(dt.clone()).value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, FixedOffset};
    use proptest::prelude::*;

    #[test]
    fn test_unix_epoch() {
        let epoch = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(JulianDate::from_datetime(epoch).value(), UNIX_EPOCH_JD);
        assert_eq!(JulianDate::new(UNIX_EPOCH_JD).to_datetime(), epoch);
    }

    #[test]
    fn test_j2000() {
        let j2000 = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert!((datetime_to_julian(&j2000) - J2000_JD).abs() < 1e-9);
    }

    #[test]
    fn test_known_dates_across_leap_rules() {
        // 1600 and 2000 are leap years, 1900 and 2100 are not
        let cases = [
            (1600, 3, 1, 2_305_507.5),
            (1858, 11, 17, 2_400_000.5),
            (1900, 3, 1, 2_415_079.5),
            (2000, 2, 29, 2_451_603.5),
            (2100, 3, 1, 2_488_128.5),
        ];
        for (y, m, d, expected) in cases {
            let dt = Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap();
            let jd = datetime_to_julian(&dt);
            assert!((jd - expected).abs() < 1e-9, "{y}-{m}-{d}: {jd} != {expected}");
        }
    }

    #[test]
    fn test_to_datetime_components() {
        let dt = julian_to_utc(2_459_016.3);
        assert_eq!((dt.year(), dt.month(), dt.day()), (2020, 6, 15));
        let expected = Utc.with_ymd_and_hms(2020, 6, 15, 19, 12, 0).unwrap();
        assert!((dt - expected).num_milliseconds().abs() < 1);
    }

    #[test]
    fn test_whole_minutes_survive_round_trip() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 1, 19, 0, 0).unwrap();
        let back = JulianDate::from_datetime(instant).to_datetime();
        assert_eq!(back, instant);
        let later = JulianDate::from_datetime(instant).add_duration(Duration::hours(4));
        assert_eq!(later.to_datetime(), Utc.with_ymd_and_hms(2024, 3, 1, 23, 0, 0).unwrap());
    }

    #[test]
    fn test_offset_timezone_is_same_instant() {
        let utc = Utc.with_ymd_and_hms(2024, 5, 1, 22, 30, 0).unwrap();
        let cet = utc.with_timezone(&FixedOffset::east_opt(3600).unwrap());
        assert_eq!(datetime_to_julian(&utc), datetime_to_julian(&cet));
    }

    #[test]
    fn test_add_duration_and_days() {
        let jd = JulianDate::new(2_459_000.5);
        assert_eq!(jd.add_days(0.25).value(), 2_459_000.75);
        let shifted = jd.add_duration(Duration::hours(6));
        assert!((shifted.value() - 2_459_000.75).abs() < 1e-12);
        assert!((shifted.days_since(jd) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_ordering_and_display() {
        assert!(JulianDate::new(1.0) < JulianDate::new(2.0));
        assert_eq!(JulianDate::new(2_459_000.5).to_string(), "JD 2459000.50000");
    }

    proptest! {
        #[test]
        fn prop_round_trip_within_microday(jd in 2_000_000.0f64..2_600_000.0) {
            let back = datetime_to_julian(&julian_to_utc(jd));
            prop_assert!((back - jd).abs() < 1e-6);
        }

        #[test]
        fn prop_local_round_trip(jd in 2_400_000.0f64..2_500_000.0) {
            let back = datetime_to_julian(&julian_to_local(jd));
            prop_assert!((back - jd).abs() < 1e-6);
        }
    }
}
