//! Services built on the core model.
//!
//! - [`observability`]: staged observability filter and final sort
//! - [`conditions`]: observation windows and sequencing checks for a selected event
//! - [`light_curve`]: expected light-curve outline of an event

pub mod conditions;
pub mod light_curve;
pub mod observability;


pub use observability::{FilterOutcome, ObservabilityFilter, ObservingContext, SortOrder};
pub use conditions::{DuringTransitCondition, ObservationWindow};
pub use light_curve::{expected_outline, CurvePoint};
