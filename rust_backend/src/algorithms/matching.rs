//! Correspondence between catalogued stars and detected star centroids.
//!
//! Every catalog position is projected onto the image and paired with the
//! detected star whose centroid is nearest. Paired centroids are rounded to
//! whole pixels; a rounded position claimed by one star class is not offered
//! to a lower-priority class. Priority runs target, variable, colour-matched
//! comparison, chart comparison, similar brightness.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::projection::{PixelPoint, SkyProjection};
use crate::core::Coordinates;
use crate::parsing::ReferenceStar;

/// Fractional average-brightness tolerance for similar-brightness stars.
pub const SIMILAR_BRIGHTNESS_TOLERANCE: f64 = 0.05;

/// A star found by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectedStar {
    pub position: PixelPoint,
    pub average_brightness: f64,
    pub max_brightness: f64,
    pub background: f64,
    pub hfr: f64,
}

impl DetectedStar {
    /// Copy with the centroid rounded to whole pixels.
    pub fn rounded(&self) -> DetectedStar {
        DetectedStar {
            position: self.position.rounded(),
            ..*self
        }
    }
}

/// Detected star nearest to `point` by squared distance; ties keep the
/// earliest star.
pub fn nearest_star<'a>(point: &PixelPoint, stars: &'a [DetectedStar]) -> Option<&'a DetectedStar> {
    let mut best: Option<(&DetectedStar, f64)> = None;
    for star in stars {
        let distance = point.squared_distance(&star.position);
        match best {
            Some((_, d)) if distance >= d => {}
            _ => best = Some((star, distance)),
        }
    }
    best.map(|(star, _)| star)
}

/// Projects `coords` and pairs it with the nearest detected star, rounded.
///
/// Returns `None` if the projection falls outside the image or nothing was
/// detected.
pub fn match_star(
    coords: &Coordinates,
    projection: &SkyProjection,
    stars: &[DetectedStar],
) -> Option<DetectedStar> {
    let point = projection.project_within(coords)?;
    nearest_star(&point, stars).map(DetectedStar::rounded)
}

/// Role of a matched star.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StarClass {
    Target,
    Variable,
    SimbadComparison,
    ChartComparison,
    SimilarBrightness,
}

impl StarClass {
    pub fn label(&self) -> &'static str {
        match self {
            StarClass::Target => "target",
            StarClass::Variable => "variable",
            StarClass::SimbadComparison => "simbad_comparison",
            StarClass::ChartComparison => "chart_comparison",
            StarClass::SimilarBrightness => "similar_brightness",
        }
    }
}

impl fmt::Display for StarClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A detected star with its role and, when known, its catalog identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedStar {
    pub class: StarClass,
    pub name: String,
    pub coordinates: Option<Coordinates>,
    pub star: DetectedStar,
}

/// Catalogued stars around the target, grouped by class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceStars {
    pub variables: Vec<ReferenceStar>,
    pub simbad_comparisons: Vec<ReferenceStar>,
    pub chart_comparisons: Vec<ReferenceStar>,
}

/// All correspondences found on one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarField {
    pub target: MatchedStar,
    pub variables: Vec<MatchedStar>,
    pub simbad_comparisons: Vec<MatchedStar>,
    pub chart_comparisons: Vec<MatchedStar>,
    pub similar_brightness: Vec<MatchedStar>,
}

impl StarField {
    /// Comparison stars from both catalogs.
    pub fn comparison_count(&self) -> usize {
        self.simbad_comparisons.len() + self.chart_comparisons.len()
    }

    /// Every matched star in priority order.
    pub fn stars(&self) -> impl Iterator<Item = &MatchedStar> {
        std::iter::once(&self.target)
            .chain(&self.variables)
            .chain(&self.simbad_comparisons)
            .chain(&self.chart_comparisons)
            .chain(&self.similar_brightness)
    }
}

struct Claims(Vec<PixelPoint>);

impl Claims {
    fn is_claimed(&self, position: &PixelPoint) -> bool {
        self.0.iter().any(|p| p == position)
    }

    fn claim(&mut self, position: PixelPoint) {
        self.0.push(position);
    }
}

fn match_class(
    class: StarClass,
    references: &[ReferenceStar],
    projection: &SkyProjection,
    detected: &[DetectedStar],
    claims: &mut Claims,
) -> Vec<MatchedStar> {
    let mut matched = Vec::new();
    for reference in references {
        let Some(star) = match_star(&reference.coordinates, projection, detected) else {
            continue;
        };
        if claims.is_claimed(&star.position) {
            log::debug!("{} {} resolves to an already claimed star", class, reference.name);
            continue;
        }
        claims.claim(star.position);
        matched.push(MatchedStar {
            class,
            name: reference.name.clone(),
            coordinates: Some(reference.coordinates),
            star,
        });
    }
    matched
}

/// Identifies the target and the reference stars on a frame.
///
/// Returns `None` when the target cannot be paired with a detected star.
pub fn correlate(
    target_name: &str,
    target: &Coordinates,
    projection: &SkyProjection,
    detected: &[DetectedStar],
    references: &ReferenceStars,
) -> Option<StarField> {
    let target_star = match_star(target, projection, detected)?;
    let mut claims = Claims(vec![target_star.position]);

    let variables = match_class(StarClass::Variable, &references.variables, projection, detected, &mut claims);
    let simbad_comparisons = match_class(
        StarClass::SimbadComparison,
        &references.simbad_comparisons,
        projection,
        detected,
        &mut claims,
    );
    let chart_comparisons = match_class(
        StarClass::ChartComparison,
        &references.chart_comparisons,
        projection,
        detected,
        &mut claims,
    );

    let tolerance = target_star.average_brightness * SIMILAR_BRIGHTNESS_TOLERANCE;
    let mut similar_brightness = Vec::new();
    for star in detected.iter().map(DetectedStar::rounded) {
        if (star.average_brightness - target_star.average_brightness).abs() >= tolerance {
            continue;
        }
        if claims.is_claimed(&star.position) {
            continue;
        }
        claims.claim(star.position);
        similar_brightness.push(MatchedStar {
            class: StarClass::SimilarBrightness,
            name: String::new(),
            coordinates: None,
            star,
        });
    }

    Some(StarField {
        target: MatchedStar {
            class: StarClass::Target,
            name: target_name.to_string(),
            coordinates: Some(*target),
            star: target_star,
        },
        variables,
        simbad_comparisons,
        chart_comparisons,
        similar_brightness,
    })
}
