//! The exposure-time search.
//!
//! One [`ExposureEngine`] run captures a short series of frames of the
//! target. Each frame is plate solved, its stars detected and the target
//! identified among them; the target's peak brightness is compared with the
//! wanted fraction of the camera's saturation level. The first two frames
//! use configured exposure times. Later ones come from a straight-line fit
//! of exposure time against peak brightness over every frame so far.

use chrono::Utc;
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::collaborators::{
    Camera, CaptureRequest, ExposureTarget, PlateSolveRequest, PlateSolver, ReferenceCatalog,
    ReferenceQuery, StarDetector, StarSensitivity,
};
use super::instructions::SequenceContainer;
use super::reference_catalogs::{ReferenceCatalogs, REFERENCE_FETCH_TIMEOUT};
use super::star_list::write_star_list;
use crate::algorithms::{
    arcsec_per_pixel, correlate, separate_duplicates, LinearFit, ReferenceStars, SkyProjection,
    StarField,
};
use crate::config::{ExposureSettings, OpticsSettings};
use crate::core::Coordinates;
use crate::error::{ExposureError, ExposureResult};
use crate::parsing::ReferenceStar;
use crate::validation::validate_exposure_run;

/// Frames captured before the search gives up and keeps its latest estimate.
pub const MAX_ITERATIONS: u32 = 9;

/// Peak brightness, as a fraction of saturation, treated as blown out.
const BLOWN_OUT_FRACTION: f64 = 0.9;

/// Half-width of the accepted band around the target fraction.
const CONVERGENCE_TOLERANCE: f64 = 0.1;

/// One captured frame of the search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureTrial {
    pub iteration: u32,
    pub exposure_seconds: f64,
    pub max_brightness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceStatus {
    /// The peak landed inside the band, or the fit stopped moving.
    Converged,
    /// [`MAX_ITERATIONS`] frames were taken without converging.
    IterationLimit,
}

#[derive(Debug, Clone)]
pub struct ExposureOutcome {
    pub exposure_seconds: f64,
    pub status: ConvergenceStatus,
    pub trials: Vec<ExposureTrial>,
    /// Stars matched on the last frame
    pub star_field: StarField,
    pub star_list: Option<PathBuf>,
    pub updated_light_frames: usize,
}

/// Nearest entry of `list` to `value`, skipping `exclude`. Ties keep the
/// earlier entry.
pub fn snap_to_list(value: f64, list: &[f64], exclude: Option<f64>) -> Option<f64> {
    let mut best: Option<f64> = None;
    for &candidate in list {
        if Some(candidate) == exclude {
            continue;
        }
        match best {
            Some(b) if (value - candidate).abs() >= (value - b).abs() => {}
            _ => best = Some(candidate),
        }
    }
    best
}

/// Exposure that the fit of `trials` predicts reaches `target_level`,
/// rounded to whole seconds and capped at `max_seconds`.
///
/// Repeated brightness readings are separated before fitting so the fit
/// stays defined.
pub fn predict_exposure(
    trials: &[ExposureTrial],
    target_level: f64,
    max_seconds: f64,
) -> ExposureResult<f64> {
    let brightness: Vec<f64> = trials.iter().map(|t| t.max_brightness).collect();
    let exposures: Vec<f64> = trials.iter().map(|t| t.exposure_seconds).collect();
    let fit = LinearFit::fit(&separate_duplicates(&brightness), &exposures)
        .ok_or(ExposureError::DegenerateRegression(trials.len()))?;
    Ok(fit.predict(target_level).round().min(max_seconds))
}

/// Reference stars already retrieved for one target. `None` means not yet
/// retrieved successfully.
#[derive(Debug, Clone, Default)]
struct CachedReferences {
    variables: Option<Vec<ReferenceStar>>,
    colour_comparisons: Option<Vec<ReferenceStar>>,
    chart_comparisons: Option<Vec<ReferenceStar>>,
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    work: impl Future<Output = ExposureResult<T>>,
) -> ExposureResult<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ExposureError::Cancelled),
        result = work => result,
    }
}

async fn lookup(
    catalog: Option<Arc<dyn ReferenceCatalog>>,
    cached: Option<Vec<ReferenceStar>>,
    query: &ReferenceQuery,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Option<Vec<ReferenceStar>> {
    if cached.is_some() {
        return cached;
    }
    let catalog = catalog?;
    let token = cancel.child_token();
    match tokio::time::timeout(timeout, catalog.stars_near(query, &token)).await {
        Ok(Ok(stars)) => {
            log::info!("Retrieved {} {} for {}", stars.len(), catalog.name(), query.target_name);
            Some(stars)
        }
        Ok(Err(e)) => {
            log::warn!("Could not retrieve {}: {}", catalog.name(), e);
            None
        }
        Err(_) => {
            token.cancel();
            log::warn!(
                "Retrieving {} timed out after {}s",
                catalog.name(),
                timeout.as_secs()
            );
            None
        }
    }
}

/// Exposure-time search bound to one set of equipment.
///
/// The engine owns its trial history for the duration of a run; the only
/// state kept between runs is the reference-star cache.
pub struct ExposureEngine {
    camera: Arc<dyn Camera>,
    solver: Arc<dyn PlateSolver>,
    detector: Arc<dyn StarDetector>,
    catalogs: ReferenceCatalogs,
    settings: ExposureSettings,
    optics: OpticsSettings,
    reference_timeout: Duration,
    reference_cache: HashMap<String, CachedReferences>,
}

impl ExposureEngine {
    pub fn new(
        camera: Arc<dyn Camera>,
        solver: Arc<dyn PlateSolver>,
        detector: Arc<dyn StarDetector>,
        settings: ExposureSettings,
        optics: OpticsSettings,
    ) -> Self {
        Self {
            camera,
            solver,
            detector,
            catalogs: ReferenceCatalogs::none(),
            settings,
            optics,
            reference_timeout: REFERENCE_FETCH_TIMEOUT,
            reference_cache: HashMap::new(),
        }
    }

    pub fn with_catalogs(mut self, catalogs: ReferenceCatalogs) -> Self {
        self.catalogs = catalogs;
        self
    }

    /// Overrides the per-catalog retrieval limit.
    pub fn with_reference_timeout(mut self, timeout: Duration) -> Self {
        self.reference_timeout = timeout;
        self
    }

    pub fn settings(&self) -> &ExposureSettings {
        &self.settings
    }

    /// Runs the search and, when enabled, writes the new exposure time into
    /// every light-frame capture of `sequence`.
    pub async fn run_and_apply(
        &mut self,
        target: &ExposureTarget,
        sequence: &mut SequenceContainer,
        cancel: &CancellationToken,
    ) -> ExposureResult<ExposureOutcome> {
        let mut outcome = self.run(target, cancel).await?;
        if self.settings.update_light_frames {
            outcome.updated_light_frames = sequence.propagate_exposure_time(outcome.exposure_seconds);
            log::info!(
                "Set {}s on {} light frame instructions",
                outcome.exposure_seconds,
                outcome.updated_light_frames
            );
        }
        Ok(outcome)
    }

    /// Searches for the exposure time that puts the target's peak at the
    /// configured fraction of saturation.
    ///
    /// # Errors
    /// * [`ExposureError::Skipped`] when the pre-flight checks fail
    /// * [`ExposureError::Cancelled`] when `cancel` fires
    /// * a fatal error when the frame cannot be solved, the target is not
    ///   found, the image stays blown out or the fit goes negative
    pub async fn run(
        &mut self,
        target: &ExposureTarget,
        cancel: &CancellationToken,
    ) -> ExposureResult<ExposureOutcome> {
        let camera = self.camera.info();
        validate_exposure_run(&self.settings, &camera, Some(target)).into_exposure_result()?;

        let saturation = camera.saturation_level();
        let target_level = saturation * self.settings.target_adu;
        let snapping = self.settings.snapping_list();
        let snap = |value: f64, exclude: Option<f64>| match &snapping {
            Some(list) => snap_to_list(value, list, exclude).unwrap_or(value),
            None => value,
        };

        let mut first = self.settings.first_seconds;
        let mut second = self.settings.second_seconds;
        let mut exposure = first;
        let mut trials: Vec<ExposureTrial> = Vec::new();
        let mut last_field: Option<StarField> = None;
        let mut status = ConvergenceStatus::IterationLimit;
        let mut iteration = 1;

        log::info!(
            "Searching exposure time for {} (target peak {:.0} ADU)",
            target.name,
            target_level
        );

        while iteration <= MAX_ITERATIONS {
            if cancel.is_cancelled() {
                return Err(ExposureError::Cancelled);
            }
            match iteration {
                1 => exposure = snap(first, None),
                2 => exposure = snap(second, Some(exposure)),
                _ => {}
            }

            let field = self.measure(target, exposure, iteration, cancel).await?;
            let peak = field.target.star.max_brightness;
            log::info!(
                "Iteration {}: {}s gives peak {:.0} ADU ({} comparison stars)",
                iteration,
                exposure,
                peak,
                field.comparison_count()
            );
            last_field = Some(field);

            if iteration <= 2 && peak >= saturation * BLOWN_OUT_FRACTION {
                first /= 2.0;
                second /= 2.0;
                log::warn!(
                    "Target star blown out, retrying with {}s and {}s",
                    first,
                    second
                );
                if second - first < 1.0 {
                    return Err(ExposureError::BlownOut { first, second });
                }
                iteration = 1;
                continue;
            }

            trials.push(ExposureTrial {
                iteration,
                exposure_seconds: exposure,
                max_brightness: peak,
            });

            let low = saturation * (self.settings.target_adu - CONVERGENCE_TOLERANCE);
            let high = saturation * (self.settings.target_adu + CONVERGENCE_TOLERANCE);
            if peak > low && peak < high {
                status = ConvergenceStatus::Converged;
                break;
            }

            if iteration >= 2 {
                let predicted = predict_exposure(&trials, target_level, self.settings.max_seconds)?;
                if predicted < 0.0 {
                    return Err(ExposureError::NegativeExposure(predicted));
                }
                let next = snap(predicted, None);
                log::debug!("Fit predicts {}s, using {}s", predicted, next);
                if next == exposure {
                    log::info!("Next exposure time equals the previous one, stopping");
                    status = ConvergenceStatus::Converged;
                    break;
                }
                exposure = next;
            }
            iteration += 1;
        }

        let star_field = last_field.ok_or(ExposureError::TargetStarNotFound)?;
        if status == ConvergenceStatus::IterationLimit {
            log::warn!(
                "No convergence after {} frames, keeping {}s",
                MAX_ITERATIONS,
                exposure
            );
        } else {
            log::info!("Exposure time for {} is {}s", target.name, exposure);
        }

        let star_list = match (&self.settings.output_directory, self.settings.save_star_list) {
            (Some(dir), true) => Some(write_star_list(dir, &target.name, &star_field, Utc::now())?),
            _ => None,
        };

        Ok(ExposureOutcome {
            exposure_seconds: exposure,
            status,
            trials,
            star_field,
            star_list,
            updated_light_frames: 0,
        })
    }

    /// Capture, solve, detect and correlate one frame.
    async fn measure(
        &mut self,
        target: &ExposureTarget,
        exposure: f64,
        iteration: u32,
        cancel: &CancellationToken,
    ) -> ExposureResult<StarField> {
        let capture = CaptureRequest {
            exposure_seconds: exposure,
            gain: self.settings.gain,
            offset: self.settings.offset,
            binning: self.settings.binning,
        };
        let frame = cancellable(cancel, self.camera.capture(&capture, cancel)).await?;

        let solve_request = PlateSolveRequest {
            coordinates: target.coordinates,
            pixel_size_um: self.optics.pixel_size_um,
            binning: self.settings.binning,
            focal_length_mm: self.optics.focal_length_mm,
            search_radius_deg: self.optics.search_radius_deg,
        };
        let solution = cancellable(cancel, self.solver.solve(&frame, &solve_request, cancel)).await?;
        if !solution.success {
            return Err(ExposureError::PlateSolveFailed(format!(
                "no solution for frame {} near {} {}",
                frame.id,
                target.coordinates.ra_string(),
                target.coordinates.dec_string()
            )));
        }

        let sensitivity = StarSensitivity::for_iteration(target.magnitude, iteration);
        let detected = cancellable(cancel, self.detector.detect(&frame, sensitivity, cancel)).await?;
        log::debug!("Detected {} stars at {:?} sensitivity", detected.len(), sensitivity);

        let references = self.reference_stars(target, solution.coordinates, cancel).await;
        if cancel.is_cancelled() {
            return Err(ExposureError::Cancelled);
        }

        let projection = SkyProjection::new(
            solution.coordinates,
            -solution.position_angle,
            arcsec_per_pixel(self.optics.pixel_size_um, self.settings.binning, self.optics.focal_length_mm),
            frame.width,
            frame.height,
        );
        correlate(&target.name, &target.coordinates, &projection, &detected, &references)
            .ok_or(ExposureError::TargetStarNotFound)
    }

    /// Reference stars for `target`, retrieved once per target name.
    ///
    /// A catalog that fails or times out contributes nothing and is asked
    /// again on the next frame.
    async fn reference_stars(
        &mut self,
        target: &ExposureTarget,
        field_center: Coordinates,
        cancel: &CancellationToken,
    ) -> ReferenceStars {
        let key = target.name.trim().to_string();
        let cached = if key.is_empty() {
            CachedReferences::default()
        } else {
            self.reference_cache.get(&key).cloned().unwrap_or_default()
        };

        let query = ReferenceQuery {
            target_name: target.name.clone(),
            target: target.coordinates,
            field_center,
        };
        let timeout = self.reference_timeout;
        let (variables, colour_comparisons, chart_comparisons) = futures::join!(
            lookup(self.catalogs.variables.clone(), cached.variables, &query, timeout, cancel),
            lookup(
                self.catalogs.colour_comparisons.clone(),
                cached.colour_comparisons,
                &query,
                timeout,
                cancel
            ),
            lookup(
                self.catalogs.chart_comparisons.clone(),
                cached.chart_comparisons,
                &query,
                timeout,
                cancel
            ),
        );

        let references = ReferenceStars {
            variables: variables.clone().unwrap_or_default(),
            simbad_comparisons: colour_comparisons.clone().unwrap_or_default(),
            chart_comparisons: chart_comparisons.clone().unwrap_or_default(),
        };
        if !key.is_empty() {
            self.reference_cache.insert(
                key,
                CachedReferences {
                    variables,
                    colour_comparisons,
                    chart_comparisons,
                },
            );
        }
        references
    }
}
