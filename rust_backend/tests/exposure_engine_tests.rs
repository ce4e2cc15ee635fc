//! End-to-end tests of the exposure search against in-memory equipment.
//!
//! The fake camera records every exposure it is asked for, the fake solver
//! always centers the frame on the target, and the fake detector derives
//! the target's peak brightness from the exposure time through a model
//! chosen per test.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use exoplanets_rust::algorithms::{arcsec_per_pixel, DetectedStar, PixelPoint};
use exoplanets_rust::config::{ExposureSettings, OpticsSettings};
use exoplanets_rust::core::Coordinates;
use exoplanets_rust::error::{CatalogError, CatalogResult, ExposureError, ExposureResult, Severity};
use exoplanets_rust::exposure::{
    Camera, CameraInfo, CaptureRequest, CapturedFrame, ConvergenceStatus, ExposureEngine,
    ExposureInstruction, ExposureTarget, ImageType, Instruction, PlateSolveRequest,
    PlateSolveResult, PlateSolver, ReferenceCatalog, ReferenceCatalogs, ReferenceQuery,
    SequenceContainer, StarDetector, StarSensitivity,
};
use exoplanets_rust::parsing::ReferenceStar;

const WIDTH: u32 = 2000;
const HEIGHT: u32 = 1000;

// ==================== Fakes ====================

type BrightnessModel = Box<dyn Fn(f64) -> f64 + Send + Sync>;

struct FakeCamera {
    connected: bool,
    hang: bool,
    exposures: Mutex<Vec<f64>>,
}

impl FakeCamera {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            connected: true,
            hang: false,
            exposures: Mutex::new(Vec::new()),
        })
    }

    fn exposures(&self) -> Vec<f64> {
        self.exposures.lock().unwrap().clone()
    }
}

#[async_trait]
impl Camera for FakeCamera {
    fn info(&self) -> CameraInfo {
        CameraInfo {
            connected: self.connected,
            bit_depth: 16,
            can_set_gain: true,
            gain_min: 0,
            gain_max: 300,
            can_set_offset: true,
            offset_min: 0,
            offset_max: 100,
        }
    }

    async fn capture(
        &self,
        request: &CaptureRequest,
        _cancel: &CancellationToken,
    ) -> ExposureResult<CapturedFrame> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        let mut exposures = self.exposures.lock().unwrap();
        exposures.push(request.exposure_seconds);
        Ok(CapturedFrame {
            id: exposures.len() as u64,
            width: WIDTH,
            height: HEIGHT,
            exposure_seconds: request.exposure_seconds,
        })
    }
}

struct FakeSolver {
    success: bool,
}

#[async_trait]
impl PlateSolver for FakeSolver {
    async fn solve(
        &self,
        _frame: &CapturedFrame,
        request: &PlateSolveRequest,
        _cancel: &CancellationToken,
    ) -> ExposureResult<PlateSolveResult> {
        Ok(PlateSolveResult {
            success: self.success,
            coordinates: request.coordinates,
            position_angle: 0.0,
        })
    }
}

struct FakeDetector {
    model: BrightnessModel,
    find_target: bool,
    sensitivities: Mutex<Vec<StarSensitivity>>,
}

impl FakeDetector {
    fn new(model: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            model: Box::new(model),
            find_target: true,
            sensitivities: Mutex::new(Vec::new()),
        })
    }
}

fn star(x: f64, y: f64, average: f64, peak: f64) -> DetectedStar {
    DetectedStar {
        position: PixelPoint::new(x, y),
        average_brightness: average,
        max_brightness: peak,
        background: 1000.0,
        hfr: 2.4,
    }
}

#[async_trait]
impl StarDetector for FakeDetector {
    async fn detect(
        &self,
        frame: &CapturedFrame,
        sensitivity: StarSensitivity,
        _cancel: &CancellationToken,
    ) -> ExposureResult<Vec<DetectedStar>> {
        self.sensitivities.lock().unwrap().push(sensitivity);
        if !self.find_target {
            return Ok(Vec::new());
        }
        let peak = (self.model)(frame.exposure_seconds).min(65_535.0);
        Ok(vec![
            star(1000.3, 499.8, peak / 4.0, peak),
            star(1300.2, 200.4, 10.0, 40.0),
        ])
    }
}

struct CountingCatalog {
    calls: AtomicUsize,
    stars: Vec<ReferenceStar>,
    fail: bool,
}

#[async_trait]
impl ReferenceCatalog for CountingCatalog {
    fn name(&self) -> &str {
        "counting"
    }

    async fn stars_near(
        &self,
        _query: &ReferenceQuery,
        _cancel: &CancellationToken,
    ) -> CatalogResult<Vec<ReferenceStar>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CatalogError::Http("503 Service Unavailable".into()));
        }
        Ok(self.stars.clone())
    }
}

// ==================== Helper Functions ====================

fn target() -> ExposureTarget {
    ExposureTarget::new("HAT-P-7 b", Coordinates::new(19.4727, 47.9689).unwrap(), 10.5)
}

/// Sky position of the companion star the detector reports at (1300, 200).
fn companion() -> ReferenceStar {
    let scale = arcsec_per_pixel(3.76, 1, 800.0) / 3600.0;
    let center = target().coordinates;
    let dec = center.dec_degrees() + 300.0 * scale;
    let ra_hours = center.ra_hours() - 300.0 * scale / 15.0 / dec.to_radians().cos();
    ReferenceStar {
        name: "V0532 Cyg".into(),
        coordinates: Coordinates::new(ra_hours, dec).unwrap(),
        magnitude: Some(13.1),
    }
}

fn settings(first: f64, second: f64, max: f64) -> ExposureSettings {
    ExposureSettings {
        first_seconds: first,
        second_seconds: second,
        max_seconds: max,
        ..Default::default()
    }
}

fn optics() -> OpticsSettings {
    OpticsSettings {
        pixel_size_um: 3.76,
        focal_length_mm: 800.0,
        search_radius_deg: 5.0,
    }
}

fn engine(
    camera: Arc<FakeCamera>,
    detector: Arc<FakeDetector>,
    settings: ExposureSettings,
) -> ExposureEngine {
    ExposureEngine::new(
        camera,
        Arc::new(FakeSolver { success: true }),
        detector,
        settings,
        optics(),
    )
}

fn linear(gain: f64, offset: f64) -> impl Fn(f64) -> f64 + Send + Sync + 'static {
    move |t| gain * t + offset
}

// ==================== Convergence ====================

#[tokio::test]
async fn test_converges_through_regression() {
    let camera = FakeCamera::new();
    let detector = FakeDetector::new(linear(1000.0, 500.0));
    let mut engine = engine(camera.clone(), detector.clone(), settings(10.0, 20.0, 300.0));

    let outcome = engine.run(&target(), &CancellationToken::new()).await.unwrap();

    // (0.66 * 65536 - 500) / 1000 = 42.75 rounds to 43, which lands in the band
    assert_eq!(outcome.status, ConvergenceStatus::Converged);
    assert_eq!(outcome.exposure_seconds, 43.0);
    assert_eq!(camera.exposures(), vec![10.0, 20.0, 43.0]);
    assert_eq!(outcome.trials.len(), 3);
    assert_eq!(outcome.trials[2].max_brightness, 43_500.0);
    assert_eq!(outcome.star_field.target.name, "HAT-P-7 b");
    assert_eq!(outcome.star_field.target.star.position, PixelPoint::new(1000.0, 500.0));
    assert_eq!(
        *detector.sensitivities.lock().unwrap(),
        vec![StarSensitivity::High, StarSensitivity::High, StarSensitivity::Normal]
    );
}

#[tokio::test]
async fn test_converges_on_first_frame() {
    let camera = FakeCamera::new();
    let mut engine = engine(camera.clone(), FakeDetector::new(linear(4000.0, 500.0)), settings(10.0, 20.0, 300.0));

    let outcome = engine.run(&target(), &CancellationToken::new()).await.unwrap();
    assert_eq!(outcome.status, ConvergenceStatus::Converged);
    assert_eq!(outcome.exposure_seconds, 10.0);
    assert_eq!(camera.exposures(), vec![10.0]);
}

#[tokio::test]
async fn test_snaps_to_exposure_list() {
    let camera = FakeCamera::new();
    let settings = ExposureSettings {
        use_exposure_list: true,
        exposure_list: "5,10,30,60".into(),
        ..settings(8.0, 12.0, 300.0)
    };
    let mut engine = engine(camera.clone(), FakeDetector::new(linear(1000.0, 500.0)), settings);

    let outcome = engine.run(&target(), &CancellationToken::new()).await.unwrap();

    // 8 -> 10; 12 -> 5 because 10 is taken; the fit asks for 43 -> 30 twice
    assert_eq!(camera.exposures(), vec![10.0, 5.0, 30.0]);
    assert_eq!(outcome.status, ConvergenceStatus::Converged);
    assert_eq!(outcome.exposure_seconds, 30.0);
}

#[tokio::test]
async fn test_iteration_limit_keeps_last_estimate() {
    let camera = FakeCamera::new();
    let detector = FakeDetector::new(|t: f64| 5000.0 * t.powf(0.2));
    let mut engine = engine(camera.clone(), detector, settings(10.0, 20.0, 100_000.0));

    let outcome = engine.run(&target(), &CancellationToken::new()).await.unwrap();

    let exposures = camera.exposures();
    assert_eq!(outcome.status, ConvergenceStatus::IterationLimit);
    assert_eq!(exposures.len(), 9);
    assert_eq!(outcome.trials.len(), 9);
    assert!(exposures.windows(2).all(|w| w[1] > w[0]));
    assert!(outcome.exposure_seconds > exposures[8]);
}

// ==================== Failures ====================

#[tokio::test]
async fn test_saturation_collapse_after_one_frame() {
    let camera = FakeCamera::new();
    let mut engine = engine(camera.clone(), FakeDetector::new(linear(100_000.0, 0.0)), settings(2.0, 3.0, 10.0));

    let err = engine.run(&target(), &CancellationToken::new()).await.unwrap_err();
    match err {
        ExposureError::BlownOut { first, second } => {
            assert_eq!(first, 1.0);
            assert_eq!(second, 1.5);
        }
        other => panic!("expected blown out, got {other:?}"),
    }
    assert_eq!(camera.exposures(), vec![2.0]);
}

#[tokio::test]
async fn test_saturation_halves_twice_before_collapse() {
    let camera = FakeCamera::new();
    let mut engine = engine(camera.clone(), FakeDetector::new(linear(100_000.0, 0.0)), settings(4.0, 6.0, 10.0));

    let err = engine.run(&target(), &CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, ExposureError::BlownOut { .. }));
    assert_eq!(err.severity(), Severity::Fatal);
    assert_eq!(camera.exposures(), vec![4.0, 2.0]);
}

#[tokio::test]
async fn test_recovers_after_halving() {
    let camera = FakeCamera::new();
    let mut engine = engine(camera.clone(), FakeDetector::new(linear(6000.0, 0.0)), settings(10.0, 20.0, 300.0));

    let outcome = engine.run(&target(), &CancellationToken::new()).await.unwrap();

    assert_eq!(camera.exposures(), vec![10.0, 5.0, 10.0, 2.5, 5.0, 7.0]);
    assert_eq!(outcome.status, ConvergenceStatus::Converged);
    assert_eq!(outcome.exposure_seconds, 7.0);
    // blown frames never enter the history
    assert!(outcome.trials.iter().all(|t| t.max_brightness < 58_982.4));
}

#[tokio::test]
async fn test_negative_exposure_is_fatal() {
    let camera = FakeCamera::new();
    let mut engine = engine(camera.clone(), FakeDetector::new(linear(-1000.0, 30_000.0)), settings(10.0, 20.0, 300.0));

    let err = engine.run(&target(), &CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, ExposureError::NegativeExposure(v) if v == -13.0));
    assert_eq!(camera.exposures().len(), 2);
}

#[tokio::test]
async fn test_plate_solve_failure() {
    let camera = FakeCamera::new();
    let mut engine = ExposureEngine::new(
        camera.clone(),
        Arc::new(FakeSolver { success: false }),
        FakeDetector::new(linear(1000.0, 0.0)),
        settings(10.0, 20.0, 300.0),
        optics(),
    );

    let err = engine.run(&target(), &CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, ExposureError::PlateSolveFailed(_)));
    assert!(err.to_string().starts_with("Plate solve failed"));
    assert_eq!(camera.exposures().len(), 1);
}

#[tokio::test]
async fn test_target_not_found() {
    let detector = Arc::new(FakeDetector {
        model: Box::new(|t: f64| t),
        find_target: false,
        sensitivities: Mutex::new(Vec::new()),
    });
    let mut engine = engine(FakeCamera::new(), detector, settings(10.0, 20.0, 300.0));

    let err = engine.run(&target(), &CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, ExposureError::TargetStarNotFound));
}

#[tokio::test]
async fn test_preflight_failure_skips_run() {
    let camera = Arc::new(FakeCamera {
        connected: false,
        hang: false,
        exposures: Mutex::new(Vec::new()),
    });
    let mut engine = engine(camera.clone(), FakeDetector::new(linear(1000.0, 0.0)), settings(10.0, 20.0, 300.0));

    let err = engine.run(&target(), &CancellationToken::new()).await.unwrap_err();
    assert_eq!(err.severity(), Severity::Skipped);
    assert!(camera.exposures().is_empty());
}

// ==================== Cancellation ====================

#[tokio::test]
async fn test_cancel_during_capture() {
    let camera = Arc::new(FakeCamera {
        connected: true,
        hang: true,
        exposures: Mutex::new(Vec::new()),
    });
    let mut engine = engine(camera, FakeDetector::new(linear(1000.0, 0.0)), settings(10.0, 20.0, 300.0));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let result = tokio::time::timeout(Duration::from_secs(5), engine.run(&target(), &cancel))
        .await
        .expect("run did not unwind after cancellation");
    let err = result.unwrap_err();
    assert!(matches!(err, ExposureError::Cancelled));
    assert_eq!(err.severity(), Severity::Cancelled);
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let camera = FakeCamera::new();
    let mut engine = engine(camera.clone(), FakeDetector::new(linear(1000.0, 0.0)), settings(10.0, 20.0, 300.0));

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = engine.run(&target(), &cancel).await.unwrap_err();
    assert!(matches!(err, ExposureError::Cancelled));
    assert!(camera.exposures().is_empty());
}

// ==================== Reference stars and outputs ====================

#[tokio::test]
async fn test_reference_stars_fetched_once_per_target() {
    let catalog = Arc::new(CountingCatalog {
        calls: AtomicUsize::new(0),
        stars: vec![companion()],
        fail: false,
    });
    let catalogs = ReferenceCatalogs {
        variables: Some(catalog.clone()),
        ..ReferenceCatalogs::none()
    };
    let mut engine = engine(FakeCamera::new(), FakeDetector::new(linear(1000.0, 500.0)), settings(10.0, 20.0, 300.0))
        .with_catalogs(catalogs);

    let outcome = engine.run(&target(), &CancellationToken::new()).await.unwrap();
    assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.star_field.variables.len(), 1);
    assert_eq!(outcome.star_field.variables[0].name, "V0532 Cyg");
    assert_eq!(
        outcome.star_field.variables[0].star.position,
        PixelPoint::new(1300.0, 200.0)
    );

    engine.run(&target(), &CancellationToken::new()).await.unwrap();
    assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failing_catalog_yields_no_stars() {
    let catalog = Arc::new(CountingCatalog {
        calls: AtomicUsize::new(0),
        stars: Vec::new(),
        fail: true,
    });
    let catalogs = ReferenceCatalogs {
        chart_comparisons: Some(catalog.clone()),
        ..ReferenceCatalogs::none()
    };
    let mut engine = engine(FakeCamera::new(), FakeDetector::new(linear(1000.0, 500.0)), settings(10.0, 20.0, 300.0))
        .with_catalogs(catalogs);

    let outcome = engine.run(&target(), &CancellationToken::new()).await.unwrap();
    assert_eq!(outcome.status, ConvergenceStatus::Converged);
    assert!(outcome.star_field.chart_comparisons.is_empty());
    // failures are not cached, so every frame asks again
    assert_eq!(catalog.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_propagates_to_light_frames_and_saves_star_list() {
    let dir = tempfile::tempdir().unwrap();
    let settings = ExposureSettings {
        update_light_frames: true,
        save_star_list: true,
        output_directory: Some(dir.path().to_path_buf()),
        ..settings(10.0, 20.0, 300.0)
    };
    let mut engine = engine(FakeCamera::new(), FakeDetector::new(linear(1000.0, 500.0)), settings);

    let mut sequence = SequenceContainer::new("HAT-P-7 b")
        .with(Instruction::TakeExposure(ExposureInstruction::light(60.0)))
        .with(Instruction::Container(
            SequenceContainer::new("loop")
                .with(Instruction::TakeExposure(ExposureInstruction::light(60.0)))
                .with(Instruction::TakeExposure(ExposureInstruction::new(ImageType::Dark, 60.0))),
        ));

    let outcome = engine
        .run_and_apply(&target(), &mut sequence, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.updated_light_frames, 2);
    assert_eq!(sequence.light_exposure_times(), vec![43.0, 43.0]);

    let path = outcome.star_list.expect("star list path");
    assert!(path.starts_with(dir.path()));
    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.lines().nth(1).unwrap().starts_with("target,HAT-P-7 b,"));
}
