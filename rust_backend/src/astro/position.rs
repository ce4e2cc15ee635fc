use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{Coordinates, GeographicLocation};
use crate::time::{hour_angle, local_sidereal_time};

/// Altitude in degrees above the mathematical horizon.
///
/// # Arguments
/// * `hour_angle_deg` - hour angle in degrees
/// * `latitude_deg` - observer latitude
/// * `dec_deg` - object declination
///
/// # Example
/// ```
/// use exoplanets_rust::astro::altitude;
///
/// // An object on the meridian culminates at 90 - |lat - dec|
/// assert!((altitude(0.0, 50.0, 20.0) - 60.0).abs() < 1e-9);
/// ```
pub fn altitude(hour_angle_deg: f64, latitude_deg: f64, dec_deg: f64) -> f64 {
    let ha = hour_angle_deg.to_radians();
    let lat = latitude_deg.to_radians();
    let dec = dec_deg.to_radians();
    let sin_alt = lat.sin() * dec.sin() + lat.cos() * dec.cos() * ha.cos();
    sin_alt.clamp(-1.0, 1.0).asin().to_degrees()
}

/// Azimuth in degrees, measured from north through east, in [0, 360).
///
/// `altitude_deg` only guards the zenith and pole cases, where the azimuth
/// is undefined and 0 is returned.
pub fn azimuth(hour_angle_deg: f64, altitude_deg: f64, latitude_deg: f64, dec_deg: f64) -> f64 {
    let ha = hour_angle_deg.to_radians();
    let alt = altitude_deg.to_radians();
    let lat = latitude_deg.to_radians();
    let dec = dec_deg.to_radians();

    if (alt.cos() * lat.cos()).abs() < 1e-12 {
        return 0.0;
    }
    // atan2 stays well conditioned on the meridian, unlike acos
    let y = ha.sin() * dec.cos();
    let x = ha.cos() * dec.cos() * lat.sin() - dec.sin() * lat.cos();
    (y.atan2(x).to_degrees() + 180.0).rem_euclid(360.0)
}

/// Altitude/azimuth pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizontalPosition {
    pub altitude: f64,
    pub azimuth: f64,
}

/// Horizontal position of `coords` seen from `location` at `instant`.
pub fn horizontal_position(
    coords: &Coordinates,
    location: &GeographicLocation,
    instant: DateTime<Utc>,
) -> HorizontalPosition {
    let lst = local_sidereal_time(instant, location.longitude);
    let ha_deg = hour_angle(lst, coords.ra_hours()) * 15.0;
    let alt = altitude(ha_deg, location.latitude, coords.dec_degrees());
    HorizontalPosition {
        altitude: alt,
        azimuth: azimuth(ha_deg, alt, location.latitude, coords.dec_degrees()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_altitude_on_meridian_and_anti_meridian() {
        assert!((altitude(0.0, 50.0, 20.0) - 60.0).abs() < 1e-9);
        // lower culmination of a circumpolar star
        assert!((altitude(180.0, 50.0, 80.0) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_azimuth_quadrants() {
        // south of zenith on the meridian
        let alt = altitude(0.0, 50.0, 20.0);
        assert!((azimuth(0.0, alt, 50.0, 20.0) - 180.0).abs() < 1e-6);

        // rising objects are east, setting ones west
        let alt = altitude(-60.0, 50.0, 0.0);
        let east = azimuth(-60.0, alt, 50.0, 0.0);
        assert!(east > 90.0 && east < 180.0, "east = {east}");
        let alt = altitude(60.0, 50.0, 0.0);
        let west = azimuth(60.0, alt, 50.0, 0.0);
        assert!(west > 180.0 && west < 270.0, "west = {west}");
    }

    #[test]
    fn test_azimuth_near_meridian_is_continuous() {
        // north of zenith: lower culmination of a circumpolar star
        let alt = altitude(180.0, 50.0, 80.0);
        let north = azimuth(180.0, alt, 50.0, 80.0);
        assert!(north.min(360.0 - north) < 1e-6, "north = {north}");

        let alt = altitude(-1e-4, 50.0, 20.0);
        let before = azimuth(-1e-4, alt, 50.0, 20.0);
        let alt = altitude(1e-4, 50.0, 20.0);
        let after = azimuth(1e-4, alt, 50.0, 20.0);
        assert!(before < 180.0 && after > 180.0);
        assert!(after - before < 1e-3, "jump of {} degrees", after - before);

        for ha in [-170.0, -90.0, -10.0, 10.0, 90.0, 170.0] {
            let alt = altitude(ha, -33.0, -60.0);
            let az = azimuth(ha, alt, -33.0, -60.0);
            assert!((0.0..360.0).contains(&az), "ha {ha}: {az}");
        }
    }

    #[test]
    fn test_azimuth_at_pole_is_finite() {
        assert_eq!(azimuth(30.0, 90.0, 90.0, 90.0), 0.0);
    }
}
