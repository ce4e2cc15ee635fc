//! Positional astronomy for visibility checks.
//!
//! - [`position`]: altitude and azimuth from hour angle, latitude and declination
//! - [`horizon`]: azimuth-dependent custom horizon profiles
//! - [`scan`]: fixed-step scans for meridian crossing, rise and set
//! - [`sun`]: low-precision solar position and twilight windows

pub mod horizon;
pub mod position;
pub mod scan;
pub mod sun;

pub use horizon::HorizonProfile;
pub use position::{altitude, azimuth, horizontal_position, HorizontalPosition};
pub use scan::{meridian_transit_time, next_rise_time, next_set_time};
pub use sun::{NighttimeCalculator, NighttimeWindows, TwilightWindow};
