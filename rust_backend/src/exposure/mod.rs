//! Adaptive exposure-time search and its collaborators.
//!
//! [`ExposureEngine`] drives a [`Camera`], a [`PlateSolver`] and a
//! [`StarDetector`] supplied by the host, optionally consults
//! [`ReferenceCatalog`]s for variable and comparison stars, and reports the
//! exposure time that brings the target close to the wanted peak level.

pub mod collaborators;
pub mod engine;
pub mod instructions;
pub mod reference_catalogs;
pub mod star_list;

pub use crate::algorithms::DetectedStar;
pub use collaborators::{
    Camera, CameraInfo, CaptureRequest, CapturedFrame, ExposureTarget, PlateSolveRequest,
    PlateSolveResult, PlateSolver, ReferenceCatalog, ReferenceQuery, StarDetector, StarSensitivity,
};
pub use engine::{
    predict_exposure, snap_to_list, ConvergenceStatus, ExposureEngine, ExposureOutcome,
    ExposureTrial, MAX_ITERATIONS,
};
pub use instructions::{ExposureInstruction, ImageType, Instruction, SequenceContainer};
pub use reference_catalogs::{
    ChartComparisonCatalog, ColourComparisonCatalog, ReferenceCatalogs, VariableStarCatalog,
    REFERENCE_FETCH_TIMEOUT,
};
pub use star_list::{star_list_file_name, write_star_list};
