//! Core domain types: coordinates, locations and observable events.

pub mod coordinates;
pub mod event;


pub use coordinates::{Coordinates, Epoch, GeographicLocation};
pub use event::{compare_right_ascension, sort_for_schedule, Event, EventKind, MINUTES_PER_DAY};
