//! Plugin settings loaded from a TOML file.
//!
//! Every field has a default so a partial file (or none at all) yields a
//! usable configuration. The loaded value is immutable and is passed
//! explicitly to the filter, the catalog sources and the exposure engine.
//!
//! ```toml
//! [location]
//! latitude = 50.16
//! longitude = 6.85
//!
//! [observability]
//! within_twilight = true
//! partial_events = false
//!
//! [exposure]
//! first_seconds = 10
//! second_seconds = 20
//! use_exposure_list = true
//! exposure_list = "5,10,20,30,60"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::astro::HorizonProfile;
use crate::core::GeographicLocation;
use crate::error::{ConfigError, ConfigResult};
use crate::validation::ValidationResult;

/// Environment variable naming an explicit settings file.
pub const CONFIG_ENV_VAR: &str = "EXOPLANETS_CONFIG";

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginSettings {
    #[serde(default)]
    pub location: GeographicLocation,
    #[serde(default)]
    pub observability: ObservabilityConstraints,
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub exposure: ExposureSettings,
    #[serde(default)]
    pub optics: OpticsSettings,
    #[serde(default)]
    pub horizon: HorizonSettings,
}

/// Toggles for the observability filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservabilityConstraints {
    #[serde(default)]
    pub check_magnitude: bool,
    #[serde(default = "default_max_magnitude")]
    pub max_magnitude: f64,
    #[serde(default = "default_true")]
    pub within_twilight: bool,
    #[serde(default)]
    pub within_nautical: bool,
    /// Any of start/mid/end satisfying a check is enough when set,
    /// otherwise all three must satisfy it.
    #[serde(default = "default_true")]
    pub partial_events: bool,
    #[serde(default = "default_true")]
    pub above_horizon: bool,
    #[serde(default)]
    pub without_meridian_flip: bool,
}

/// Which list of candidate events to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TargetList {
    /// Tabular transit predictions for tonight
    #[default]
    TransitPredictor,
    /// Linear ephemerides keyed by planet
    EphemerisDatabase,
    /// Local periodic-variable catalog file
    VariableStarFile,
}

/// Record shape of the local variable-star catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VariableCatalogFormat {
    /// Detect from the header row
    #[default]
    Auto,
    /// `name,ra,dec,v,epoch,period[,amplitude,ocrange,phase,comments]`
    Manual,
    /// AAVSO target-tool export without epochs
    Aavso,
}

/// Catalog retrieval settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSettings {
    #[serde(default)]
    pub target_list: TargetList,
    /// List code passed to the transit predictor (`single_object`)
    #[serde(default)]
    pub transit_predictor_list: u8,
    #[serde(default = "default_transit_predictor_url")]
    pub transit_predictor_url: String,
    #[serde(default = "default_ephemeris_database_url")]
    pub ephemeris_database_url: String,
    #[serde(default)]
    pub variable_star_catalog: Option<PathBuf>,
    #[serde(default)]
    pub variable_catalog_format: VariableCatalogFormat,
    /// Minutes observed on each side of a variable-star extremum
    #[serde(default = "default_observation_span")]
    pub observation_span_minutes: f64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_attempts")]
    pub attempts: u32,
}

/// Exposure convergence settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureSettings {
    #[serde(default = "default_first_exposure")]
    pub first_seconds: f64,
    #[serde(default = "default_second_exposure")]
    pub second_seconds: f64,
    #[serde(default = "default_max_exposure")]
    pub max_seconds: f64,
    /// Desired peak brightness as a fraction of saturation
    #[serde(default = "default_target_adu")]
    pub target_adu: f64,
    #[serde(default)]
    pub use_exposure_list: bool,
    /// Comma separated integer seconds, matched against existing darks
    #[serde(default = "default_exposure_list")]
    pub exposure_list: String,
    /// Copy the result to every light-frame exposure instruction
    #[serde(default)]
    pub update_light_frames: bool,
    #[serde(default)]
    pub save_star_list: bool,
    #[serde(default)]
    pub output_directory: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub retrieve_comparison_stars: bool,
    #[serde(default = "default_true")]
    pub retrieve_variable_stars: bool,
    #[serde(default)]
    pub gain: Option<i32>,
    #[serde(default)]
    pub offset: Option<i32>,
    #[serde(default = "default_binning")]
    pub binning: u16,
}

/// Telescope and camera geometry used for plate solving and projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpticsSettings {
    #[serde(default = "default_pixel_size")]
    pub pixel_size_um: f64,
    #[serde(default = "default_focal_length")]
    pub focal_length_mm: f64,
    #[serde(default = "default_search_radius")]
    pub search_radius_deg: f64,
}

/// Optional custom horizon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HorizonSettings {
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_max_magnitude() -> f64 {
    14.0
}

fn default_transit_predictor_url() -> String {
    "https://astro.swarthmore.edu/transits/print_transits.cgi".to_string()
}

fn default_ephemeris_database_url() -> String {
    "https://www.exoclock.space/database/planets_json".to_string()
}

fn default_observation_span() -> f64 {
    60.0
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_attempts() -> u32 {
    3
}

fn default_first_exposure() -> f64 {
    10.0
}

fn default_second_exposure() -> f64 {
    20.0
}

fn default_max_exposure() -> f64 {
    300.0
}

fn default_target_adu() -> f64 {
    0.66
}

fn default_exposure_list() -> String {
    "1,2,5,10,15,20,30,45,60,90,120,180,240,300".to_string()
}

fn default_binning() -> u16 {
    1
}

fn default_pixel_size() -> f64 {
    3.76
}

fn default_focal_length() -> f64 {
    800.0
}

fn default_search_radius() -> f64 {
    5.0
}

impl Default for ObservabilityConstraints {
    fn default() -> Self {
        Self {
            check_magnitude: false,
            max_magnitude: default_max_magnitude(),
            within_twilight: true,
            within_nautical: false,
            partial_events: true,
            above_horizon: true,
            without_meridian_flip: false,
        }
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            target_list: TargetList::default(),
            transit_predictor_list: 0,
            transit_predictor_url: default_transit_predictor_url(),
            ephemeris_database_url: default_ephemeris_database_url(),
            variable_star_catalog: None,
            variable_catalog_format: VariableCatalogFormat::default(),
            observation_span_minutes: default_observation_span(),
            timeout_secs: default_timeout_secs(),
            attempts: default_attempts(),
        }
    }
}

impl Default for ExposureSettings {
    fn default() -> Self {
        Self {
            first_seconds: default_first_exposure(),
            second_seconds: default_second_exposure(),
            max_seconds: default_max_exposure(),
            target_adu: default_target_adu(),
            use_exposure_list: false,
            exposure_list: default_exposure_list(),
            update_light_frames: false,
            save_star_list: false,
            output_directory: None,
            retrieve_comparison_stars: true,
            retrieve_variable_stars: true,
            gain: None,
            offset: None,
            binning: default_binning(),
        }
    }
}

impl Default for OpticsSettings {
    fn default() -> Self {
        Self {
            pixel_size_um: default_pixel_size(),
            focal_length_mm: default_focal_length(),
            search_radius_deg: default_search_radius(),
        }
    }
}

impl ExposureSettings {
    /// Parses the allowed exposure list.
    ///
    /// # Returns
    /// * `Ok(Vec<u32>)` with the values in file order
    /// * `Err(String)` if any entry is not a positive integer
    ///
    /// # Example
    /// ```
    /// use exoplanets_rust::config::ExposureSettings;
    ///
    /// let settings = ExposureSettings { exposure_list: "5, 10,30".into(), ..Default::default() };
    /// assert_eq!(settings.parsed_exposure_list().unwrap(), vec![5, 10, 30]);
    /// ```
    pub fn parsed_exposure_list(&self) -> Result<Vec<u32>, String> {
        let values = self
            .exposure_list
            .split(',')
            .map(|item| {
                item.trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|v| *v > 0)
                    .ok_or_else(|| "Must be a comma separated list of integers".to_string())
            })
            .collect::<Result<Vec<u32>, String>>()?;
        Ok(values)
    }

    /// The allowed exposure list when snapping is enabled and the list parses.
    pub fn snapping_list(&self) -> Option<Vec<f64>> {
        if !self.use_exposure_list {
            return None;
        }
        self.parsed_exposure_list()
            .ok()
            .map(|values| values.into_iter().map(f64::from).collect())
    }

    /// Checks ordering and ranges of the exposure parameters.
    pub fn validate(&self, result: &mut ValidationResult) {
        if self.first_seconds <= 0.0 {
            result.add_error(format!(
                "First exposure time must be positive, got {}s",
                self.first_seconds
            ));
        }
        if self.second_seconds <= self.first_seconds {
            result.add_error(format!(
                "Second exposure time ({}s) must be greater than the first ({}s)",
                self.second_seconds, self.first_seconds
            ));
        }
        if self.second_seconds >= self.max_seconds {
            result.add_error(format!(
                "Second exposure time ({}s) must be less than the maximum ({}s)",
                self.second_seconds, self.max_seconds
            ));
        }
        if self.target_adu <= 0.1 || self.target_adu >= 1.0 {
            result.add_error(format!(
                "Target ADU fraction must be between 0.1 and 1.0, got {}",
                self.target_adu
            ));
        }
        if self.use_exposure_list {
            if let Err(e) = self.parsed_exposure_list() {
                result.add_error(format!("Exposure list '{}': {}", self.exposure_list, e));
            }
        }
        if self.binning == 0 {
            result.add_error("Binning must be at least 1".to_string());
        }
    }
}

impl PluginSettings {
    /// Load settings from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the settings file
    ///
    /// # Returns
    /// * `Ok(PluginSettings)` if successful
    /// * `Err(ConfigError)` if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse settings from TOML text.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let settings: PluginSettings = toml::from_str(content)?;
        Ok(settings)
    }

    /// Load settings from the default location.
    ///
    /// Uses the file named by `EXOPLANETS_CONFIG` if set, then searches for
    /// `exoplanets.toml` in:
    /// 1. Current directory
    /// 2. `rust_backend/` directory
    /// 3. Parent directory
    ///
    /// Falls back to defaults when nothing is found.
    pub fn from_default_location() -> ConfigResult<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::from_file(path);
        }

        let search_paths = [
            PathBuf::from("exoplanets.toml"),
            PathBuf::from("rust_backend/exoplanets.toml"),
            PathBuf::from("../exoplanets.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                log::info!("Loading settings from {}", path.display());
                return Self::from_file(&path);
            }
        }

        log::info!("No exoplanets.toml found, using default settings");
        Ok(Self::default())
    }

    /// Loads the configured custom horizon, or the flat horizon if none is set.
    pub fn horizon_profile(&self) -> ConfigResult<HorizonProfile> {
        match &self.horizon.file {
            Some(path) => HorizonProfile::from_file(path),
            None => Ok(HorizonProfile::flat()),
        }
    }

    /// Collects configuration problems.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();

        if !self.location.is_valid() {
            result.add_error(format!(
                "Observer location ({}, {}) is out of range",
                self.location.latitude, self.location.longitude
            ));
        }
        if self.observability.check_magnitude && !self.observability.max_magnitude.is_finite() {
            result.add_error("Maximum magnitude must be a number".to_string());
        }
        if self.catalog.target_list == TargetList::VariableStarFile {
            match &self.catalog.variable_star_catalog {
                None => result.add_error("No variable star catalog file configured".to_string()),
                Some(path) if !path.exists() => result.add_error(format!(
                    "Variable star list {} does not exist.",
                    path.display()
                )),
                Some(_) => {}
            }
        }
        if self.catalog.attempts == 0 {
            result.add_warning("Catalog attempts is 0, using a single attempt".to_string());
        }
        if self.optics.pixel_size_um <= 0.0 || self.optics.focal_length_mm <= 0.0 {
            result.add_error("Pixel size and focal length must be positive".to_string());
        }
        if let Some(path) = &self.horizon.file {
            if !path.exists() {
                result.add_error(format!("Horizon file {} does not exist.", path.display()));
            }
        }
        self.exposure.validate(&mut result);
        result
    }

    /// Like [`PluginSettings::validate`] but returns the first problem as an error.
    pub fn ensure_valid(&self) -> ConfigResult<()> {
        let result = self.validate();
        if result.is_valid {
            Ok(())
        } else {
            Err(ConfigError::Invalid(result.errors.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let settings = PluginSettings::from_toml_str("").unwrap();
        assert_eq!(settings, PluginSettings::default());
        assert_eq!(settings.exposure.target_adu, 0.66);
        assert_eq!(settings.catalog.timeout_secs, 30);
        assert_eq!(settings.catalog.attempts, 3);
        assert!(settings.validate().is_valid);
    }

    #[test]
    fn test_partial_sections() {
        let settings = PluginSettings::from_toml_str(
            r#"
            [location]
            latitude = 50.16
            longitude = 6.85

            [observability]
            check_magnitude = true
            max_magnitude = 12.5
            partial_events = false

            [catalog]
            target_list = "ephemeris_database"

            [exposure]
            first_seconds = 4
            second_seconds = 8
            "#,
        )
        .unwrap();

        assert_eq!(settings.location.latitude, 50.16);
        assert_eq!(settings.location.elevation, 0.0);
        assert!(settings.observability.check_magnitude);
        assert!(!settings.observability.partial_events);
        assert!(settings.observability.within_twilight);
        assert_eq!(settings.catalog.target_list, TargetList::EphemerisDatabase);
        assert_eq!(settings.exposure.first_seconds, 4.0);
        assert_eq!(settings.exposure.max_seconds, 300.0);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = PluginSettings::from_toml_str("[exposure]\nfirst_seconds = \"ten\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exoplanets.toml");
        std::fs::write(&path, "[catalog]\nobservation_span_minutes = 90\n").unwrap();
        let settings = PluginSettings::from_file(&path).unwrap();
        assert_eq!(settings.catalog.observation_span_minutes, 90.0);

        assert!(matches!(
            PluginSettings::from_file(dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_exposure_list_parsing() {
        let mut settings = ExposureSettings {
            exposure_list: "1, 2,x".to_string(),
            use_exposure_list: true,
            ..Default::default()
        };
        assert!(settings.parsed_exposure_list().is_err());
        assert_eq!(settings.snapping_list(), None);

        let mut result = ValidationResult::new();
        settings.validate(&mut result);
        assert!(!result.is_valid);

        settings.exposure_list = "0,5".to_string();
        assert!(settings.parsed_exposure_list().is_err());

        settings.exposure_list = "30,5".to_string();
        assert_eq!(settings.snapping_list(), Some(vec![30.0, 5.0]));
    }

    #[test]
    fn test_exposure_ordering_rules() {
        let settings = ExposureSettings {
            first_seconds: 20.0,
            second_seconds: 10.0,
            max_seconds: 5.0,
            ..Default::default()
        };
        let mut result = ValidationResult::new();
        settings.validate(&mut result);
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn test_missing_variable_catalog_is_reported() {
        let mut settings = PluginSettings::default();
        settings.catalog.target_list = TargetList::VariableStarFile;
        settings.catalog.variable_star_catalog = Some(PathBuf::from("/nonexistent/stars.csv"));
        let result = settings.validate();
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("does not exist"));
        assert!(settings.ensure_valid().is_err());
    }
}
