//! Catalog sources that normalize remote or local listings into events.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::fetcher::{FetchRequest, TextFetcher};
use crate::astro::{HorizonProfile, NighttimeWindows};
use crate::config::CatalogSettings;
use crate::core::{Event, GeographicLocation};
use crate::error::CatalogResult;
use crate::parsing::{parse_ephemeris_json, parse_transit_predictor_csv};
use crate::time::JulianDate;

/// Everything a source needs to turn records into events for one night.
#[derive(Debug, Clone)]
pub struct CatalogContext {
    pub location: GeographicLocation,
    pub horizon: HorizonProfile,
    pub nighttime: NighttimeWindows,
    pub now: DateTime<Utc>,
}

impl CatalogContext {
    pub fn now_jd(&self) -> f64 {
        JulianDate::from_datetime(self.now).value()
    }
}

/// A provider of candidate events.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Short label used in logs and retrieval reports.
    fn name(&self) -> &str;

    /// Retrieves and normalizes the source's events.
    ///
    /// Malformed records are skipped; only a failure to obtain or read the
    /// listing as a whole is an error.
    async fn fetch(
        &self,
        context: &CatalogContext,
        cancel: &CancellationToken,
    ) -> CatalogResult<Vec<Event>>;
}

/// Remote transit predictor returning a CSV table for tonight.
pub struct TransitPredictorSource {
    fetcher: Arc<dyn TextFetcher>,
    url: String,
    list: u8,
}

impl TransitPredictorSource {
    pub fn new(fetcher: Arc<dyn TextFetcher>, url: impl Into<String>, list: u8) -> Self {
        Self {
            fetcher,
            url: url.into(),
            list,
        }
    }

    pub fn from_settings(fetcher: Arc<dyn TextFetcher>, settings: &CatalogSettings) -> Self {
        Self::new(
            fetcher,
            settings.transit_predictor_url.clone(),
            settings.transit_predictor_list,
        )
    }

    /// Query for one night of transits above 30 degrees, printed as CSV in UTC.
    pub fn request(&self, location: &GeographicLocation) -> FetchRequest {
        let latitude = location.latitude.to_string();
        let longitude = location.longitude.to_string();
        let list = self.list.to_string();
        let params: [(&str, &str); 29] = [
            ("single_object", &list),
            ("ra", ""),
            ("dec", ""),
            ("epoch", ""),
            ("period", ""),
            ("duration", ""),
            ("depth", ""),
            ("target", ""),
            ("observatory_string", "Specified_Lat_Long"),
            ("use_utc", "1"),
            ("observatory_latitude", &latitude),
            ("observatory_longitude", &longitude),
            ("timezone", "UTC"),
            ("start_date", "today"),
            ("days_to_print", "1"),
            ("days_in_past", "0"),
            ("minimum_start_elevation", "30"),
            ("and_vs_or", "or"),
            ("minimum_end_elevation", "30"),
            ("minimum_ha", "-12"),
            ("maximum_ha", "12"),
            ("baseline_hrs", "1"),
            ("show_unc", "1"),
            ("minimum_depth", "0"),
            ("maximum_V_mag", ""),
            ("target_string", ""),
            ("print_html", "2"),
            ("twilight", "-12"),
            ("max_airmass", "2.4"),
        ];
        FetchRequest::Get {
            url: self.url.clone(),
            query: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl CatalogSource for TransitPredictorSource {
    fn name(&self) -> &str {
        "transit predictor"
    }

    async fn fetch(
        &self,
        context: &CatalogContext,
        cancel: &CancellationToken,
    ) -> CatalogResult<Vec<Event>> {
        let text = self
            .fetcher
            .fetch_text(&self.request(&context.location), cancel)
            .await?;
        let events = parse_transit_predictor_csv(&text)?;
        log::info!("Retrieved {} transits from the transit predictor", events.len());
        Ok(events)
    }
}

/// Remote ephemeris database keyed by planet name.
pub struct EphemerisDatabaseSource {
    fetcher: Arc<dyn TextFetcher>,
    url: String,
}

impl EphemerisDatabaseSource {
    pub fn new(fetcher: Arc<dyn TextFetcher>, url: impl Into<String>) -> Self {
        Self {
            fetcher,
            url: url.into(),
        }
    }

    pub fn from_settings(fetcher: Arc<dyn TextFetcher>, settings: &CatalogSettings) -> Self {
        Self::new(fetcher, settings.ephemeris_database_url.clone())
    }
}

#[async_trait]
impl CatalogSource for EphemerisDatabaseSource {
    fn name(&self) -> &str {
        "ephemeris database"
    }

    async fn fetch(
        &self,
        context: &CatalogContext,
        cancel: &CancellationToken,
    ) -> CatalogResult<Vec<Event>> {
        let text = self
            .fetcher
            .fetch_text(&FetchRequest::get(self.url.clone()), cancel)
            .await?;
        let events = parse_ephemeris_json(&text, context.now_jd())?;
        log::info!("Retrieved {} transits from the ephemeris database", events.len());
        Ok(events)
    }
}
