//! Pre-flight validation with error and warning reporting.
//!
//! Problems found here are reported as a list of human-readable issues and
//! the guarded operation is skipped, never attempted.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::ExposureSettings;
use crate::core::Event;
use crate::error::ExposureError;
use crate::exposure::{CameraInfo, ExposureTarget};

/// Validation outcome with categorized issues.
///
/// Errors make `is_valid` false, while warnings are informational.
///
/// # Examples
///
/// ```
/// use exoplanets_rust::validation::ValidationResult;
///
/// let mut result = ValidationResult::new();
/// assert!(result.is_valid);
///
/// result.add_error("Camera not connected".to_string());
/// assert!(!result.is_valid);
/// assert_eq!(result.errors.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Creates a new validation result with valid status and no issues.
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Adds a critical error and marks the result as invalid.
    pub fn add_error(&mut self, error: String) {
        self.is_valid = false;
        self.errors.push(error);
    }

    /// Adds a non-critical warning without invalidating the result.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Appends all issues of `other`.
    pub fn merge(&mut self, other: ValidationResult) {
        self.is_valid &= other.is_valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Converts a failed validation into a skip signal for the host.
    pub fn into_exposure_result(self) -> Result<(), ExposureError> {
        if self.is_valid {
            Ok(())
        } else {
            Err(ExposureError::Skipped(self.errors))
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks that a target event was selected before a condition or wait
/// instruction runs.
pub fn validate_target_selection(event: Option<&Event>) -> ValidationResult {
    let mut result = ValidationResult::new();
    if event.is_none() {
        result.add_error("You must select a target from the list.".to_string());
    }
    result
}

/// Camera connection and gain/offset range checks.
pub fn validate_camera(info: &CameraInfo, gain: Option<i32>, offset: Option<i32>) -> ValidationResult {
    let mut result = ValidationResult::new();
    if !info.connected {
        result.add_error("Camera is not connected".to_string());
        return result;
    }
    if let Some(gain) = gain {
        if info.can_set_gain && (gain < info.gain_min || gain > info.gain_max) {
            result.add_error(format!(
                "Gain must be between {} and {}, got {}",
                info.gain_min, info.gain_max, gain
            ));
        }
    }
    if let Some(offset) = offset {
        if info.can_set_offset && (offset < info.offset_min || offset > info.offset_max) {
            result.add_error(format!(
                "Offset must be between {} and {}, got {}",
                info.offset_min, info.offset_max, offset
            ));
        }
    }
    if info.bit_depth == 0 || info.bit_depth > 32 {
        result.add_error(format!("Unsupported camera bit depth {}", info.bit_depth));
    }
    result
}

/// Checks an output directory for star list files.
pub fn validate_output_directory(directory: Option<&Path>) -> ValidationResult {
    let mut result = ValidationResult::new();
    match directory {
        None => result.add_error("Output file path is empty".to_string()),
        Some(dir) if dir.as_os_str().is_empty() => {
            result.add_error("Output file path is empty".to_string())
        }
        Some(dir) if !dir.is_dir() => {
            result.add_error(format!("Output file path {} is invalid", dir.display()))
        }
        Some(_) => {}
    }
    result
}

/// Full pre-flight check for an exposure search.
///
/// # Arguments
/// * `settings` - exposure settings for this run
/// * `camera` - current camera state
/// * `target` - the selected target, if any
pub fn validate_exposure_run(
    settings: &ExposureSettings,
    camera: &CameraInfo,
    target: Option<&ExposureTarget>,
) -> ValidationResult {
    let mut result = validate_camera(camera, settings.gain, settings.offset);
    settings.validate(&mut result);

    if settings.save_star_list {
        result.merge(validate_output_directory(settings.output_directory.as_deref()));
    }

    match target {
        None => result.add_error(
            "This instruction must be used with a selected exoplanet or variable star target."
                .to_string(),
        ),
        Some(t) if t.name.trim().is_empty() => {
            result.add_warning("Target has no name, reference stars are not cached".to_string())
        }
        Some(_) => {}
    }
    result
}
