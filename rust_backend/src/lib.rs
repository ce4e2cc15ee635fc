//! Exoplanet transit and variable-star observation planning.
//!
//! The crate selects tonight's observable events from several catalogs and,
//! at the telescope, searches for the exposure time that puts the target
//! star at a chosen fraction of the camera's saturation level.
//!
//! - [`time`], [`astro`]: Julian dates, sidereal time, alt/az, twilight
//! - [`core`]: coordinates and the canonical [`core::Event`]
//! - [`parsing`], [`catalog`]: catalog payloads and their async sources
//! - [`services`]: observability filter, observation windows, light-curve outline
//! - [`algorithms`], [`exposure`]: projection, matching and the exposure search
//! - [`config`], [`validation`], [`error`]: settings, pre-flight checks, error types

pub mod algorithms;
pub mod astro;
pub mod catalog;
pub mod config;
pub mod core;
pub mod error;
pub mod exposure;
pub mod parsing;
pub mod services;
pub mod time;
pub mod validation;

pub use config::PluginSettings;
pub use core::{Coordinates, Event, EventKind, GeographicLocation};
pub use error::{CatalogError, ConfigError, ExposureError, Severity};
pub use time::JulianDate;
