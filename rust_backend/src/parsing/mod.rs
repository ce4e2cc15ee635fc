//! Tolerant parsers for catalog and reference-star payloads.
//!
//! Every parser works on text already fetched by the caller. A malformed
//! record is logged and skipped; only an unreadable payload as a whole is an
//! error.
//!
//! # Parsers
//!
//! - [`transit_predictor`]: CSV transit table with offset Julian Dates
//! - [`ephemeris_db`]: keyed JSON dictionary of linear ephemerides
//! - [`variable_catalog`]: user-supplied variable-star CSV in two shapes
//! - [`reference_stars`]: variable-star, chart and colour-matched comparison star payloads
//!
//! # Example
//!
//! ```
//! use exoplanets_rust::parsing::transit_predictor::parse_transit_predictor_csv;
//!
//! let csv = "Name,comments,V,jd_start,jd_mid,jd_end,coords(J2000),depth(ppt),percent_transit_observable,percent_baseline_observable\n\
//!            HAT-P-32 b,,11.3,10000.40,10000.45,10000.50,02:04:10.3 +46:41:16,21.0,100,100\n";
//! let events = parse_transit_predictor_csv(csv).unwrap();
//! assert_eq!(events.len(), 1);
//! ```

pub mod ephemeris_db;
pub mod fields;
pub mod reference_stars;
pub mod transit_predictor;
pub mod variable_catalog;

#[cfg(test)]
mod variable_catalog_tests;

pub use ephemeris_db::{parse_ephemeris_json, EphemerisRecord};
pub use reference_stars::{
    parse_chart_comparison_stars, parse_simbad_comparison_stars, parse_simbad_oid,
    parse_vsx_variable_stars, ReferenceStar,
};
pub use transit_predictor::{parse_transit_predictor_csv, TRANSIT_PREDICTOR_JD_OFFSET};
pub use variable_catalog::{parse_variable_catalog, read_variable_catalog, VariableStarRecord};
