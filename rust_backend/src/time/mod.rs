//! Time scales used by the scheduler.
//!
//! - [`julian`]: Julian Date newtype and conversions to civil time
//! - [`sidereal`]: Greenwich/local mean sidereal time and hour angles

pub mod julian;
pub mod sidereal;

pub use julian::{
    datetime_to_julian, julian_to_local, julian_to_utc, JulianDate, J2000_JD, SECONDS_PER_DAY,
    UNIX_EPOCH_JD,
};
pub use sidereal::{greenwich_sidereal_time, hour_angle, local_sidereal_time};
