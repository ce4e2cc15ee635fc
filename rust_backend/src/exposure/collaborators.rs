//! Contracts for the equipment and services the exposure search drives.
//!
//! The engine never talks to hardware directly. A host provides a camera, a
//! plate solver, a star detector and optionally reference-star catalogs
//! through the traits below; every call accepts a cancellation token and
//! must return promptly once it fires.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::algorithms::DetectedStar;
use crate::core::{Coordinates, Event};
use crate::error::{CatalogResult, ExposureResult};
use crate::parsing::ReferenceStar;

/// Camera state reported before a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraInfo {
    pub connected: bool,
    pub bit_depth: u32,
    pub can_set_gain: bool,
    pub gain_min: i32,
    pub gain_max: i32,
    pub can_set_offset: bool,
    pub offset_min: i32,
    pub offset_max: i32,
}

impl CameraInfo {
    /// Saturation level in ADU, `2^bit_depth`.
    pub fn saturation_level(&self) -> f64 {
        2f64.powi(self.bit_depth.min(32) as i32)
    }
}

/// The star whose peak brightness the search tunes for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureTarget {
    pub name: String,
    pub coordinates: Coordinates,
    pub magnitude: f64,
}

impl ExposureTarget {
    pub fn new(name: impl Into<String>, coordinates: Coordinates, magnitude: f64) -> Self {
        Self {
            name: name.into(),
            coordinates,
            magnitude,
        }
    }

    pub fn from_event(event: &Event) -> Self {
        Self::new(event.name(), *event.coordinates(), event.magnitude())
    }
}

/// Parameters of one light frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureRequest {
    pub exposure_seconds: f64,
    pub gain: Option<i32>,
    pub offset: Option<i32>,
    pub binning: u16,
}

/// Handle to a captured image, as understood by the plate solver and the
/// star detector of the same host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedFrame {
    pub id: u64,
    pub width: u32,
    pub height: u32,
    pub exposure_seconds: f64,
}

/// Hints handed to the plate solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateSolveRequest {
    pub coordinates: Coordinates,
    pub pixel_size_um: f64,
    pub binning: u16,
    pub focal_length_mm: f64,
    pub search_radius_deg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateSolveResult {
    pub success: bool,
    /// Solved image center
    pub coordinates: Coordinates,
    /// Position angle in degrees, east of north
    pub position_angle: f64,
}

/// Detection sensitivity tier. Lower tiers pick up fewer faint stars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StarSensitivity {
    Normal,
    High,
    Highest,
}

impl StarSensitivity {
    /// Tier for a target of `magnitude` on the given (1-based) iteration.
    ///
    /// Bright targets and later iterations saturate sooner, so they get a
    /// less sensitive detector.
    pub fn for_iteration(magnitude: f64, iteration: u32) -> Self {
        if magnitude < 9.0 || iteration > 2 {
            StarSensitivity::Normal
        } else if magnitude < 12.0 || iteration > 1 {
            StarSensitivity::High
        } else {
            StarSensitivity::Highest
        }
    }
}

#[async_trait]
pub trait Camera: Send + Sync {
    fn info(&self) -> CameraInfo;

    async fn capture(
        &self,
        request: &CaptureRequest,
        cancel: &CancellationToken,
    ) -> ExposureResult<CapturedFrame>;
}

#[async_trait]
pub trait PlateSolver: Send + Sync {
    /// Solves `frame`. An unsolvable image is `Ok` with `success == false`;
    /// `Err` is reserved for the solver itself failing.
    async fn solve(
        &self,
        frame: &CapturedFrame,
        request: &PlateSolveRequest,
        cancel: &CancellationToken,
    ) -> ExposureResult<PlateSolveResult>;
}

#[async_trait]
pub trait StarDetector: Send + Sync {
    async fn detect(
        &self,
        frame: &CapturedFrame,
        sensitivity: StarSensitivity,
        cancel: &CancellationToken,
    ) -> ExposureResult<Vec<DetectedStar>>;
}

/// Where to look for reference stars.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceQuery {
    pub target_name: String,
    pub target: Coordinates,
    /// Plate-solved center of the frame
    pub field_center: Coordinates,
}

/// A listing of catalogued stars around a target.
#[async_trait]
pub trait ReferenceCatalog: Send + Sync {
    fn name(&self) -> &str;

    async fn stars_near(
        &self,
        query: &ReferenceQuery,
        cancel: &CancellationToken,
    ) -> CatalogResult<Vec<ReferenceStar>>;
}
