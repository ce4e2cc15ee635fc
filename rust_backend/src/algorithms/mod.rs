//! Numerical building blocks of the exposure search.
//!
//! - [`regression`]: least-squares line fit
//! - [`projection`]: stereographic sky to pixel mapping
//! - [`matching`]: nearest-centroid star correspondence and class de-duplication

pub mod matching;
pub mod projection;
pub mod regression;

#[cfg(test)]
mod matching_tests;

pub use matching::{
    correlate, match_star, nearest_star, DetectedStar, MatchedStar, ReferenceStars, StarClass, StarField,
};
pub use projection::{arcsec_per_pixel, PixelPoint, SkyProjection};
pub use regression::{separate_duplicates, LinearFit};
