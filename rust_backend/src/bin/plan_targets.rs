//! Tonight's observable targets.
//!
//! Loads the settings, computes the twilight windows for the configured
//! location, retrieves events from the selected target list and prints the
//! ones that pass the observability constraints.
//!
//! # Usage
//!
//! ```bash
//! EXOPLANETS_CONFIG=./exoplanets.toml cargo run --bin plan_targets
//! ```
//!
//! # Environment Variables
//!
//! - `EXOPLANETS_CONFIG`: settings file (default: ./exoplanets.toml, else built-in defaults)
//! - `RUST_LOG`: log filter (default: info)

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{Local, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use exoplanets_rust::astro::NighttimeCalculator;
use exoplanets_rust::catalog::{fetch_all, source_for_settings, CatalogContext, HttpFetcher};
use exoplanets_rust::services::{ObservabilityFilter, ObservingContext, SortOrder};
use exoplanets_rust::PluginSettings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let settings = PluginSettings::from_default_location().context("loading settings")?;
    settings.ensure_valid().context("checking settings")?;
    let horizon = settings.horizon_profile().context("loading horizon profile")?;

    let now = Utc::now();
    let nighttime = NighttimeCalculator::new(settings.location).calculate(now);
    match &nighttime.nautical {
        Some(window) => info!(
            "Nautical night {} to {}",
            window.set.with_timezone(&Local),
            window.rise.with_timezone(&Local)
        ),
        None => warn!("No nautical darkness tonight"),
    }

    let fetcher = Arc::new(HttpFetcher::from_settings(&settings.catalog)?);
    let Some(source) = source_for_settings(&settings.catalog, fetcher) else {
        error!("No variable star catalog file configured");
        return Ok(());
    };

    let context = CatalogContext {
        location: settings.location,
        horizon: horizon.clone(),
        nighttime,
        now,
    };
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    // one extra second so the fetcher's own per-attempt timeout fires first
    let limit = Duration::from_secs(
        settings.catalog.timeout_secs * u64::from(settings.catalog.attempts.max(1)) + 1,
    );
    let report = fetch_all(&[source], &context, &cancel, limit).await;
    info!("Retrieved {} events", report.events.len());

    let observing = ObservingContext {
        location: &settings.location,
        horizon: &horizon,
        nighttime: &nighttime,
        now,
    };
    let filter = ObservabilityFilter::new(&settings.observability, observing);
    let outcome = filter.apply(
        report.events,
        SortOrder::for_target_list(settings.catalog.target_list),
    );
    info!(
        "{} of {} events are observable ({} removed)",
        outcome.events.len(),
        outcome.retrieved,
        outcome.removed
    );

    for event in &outcome.events {
        println!(
            "{:<24} {:>5.1} mag  {} - {}  {} {}",
            event.name(),
            event.magnitude(),
            event.start_utc().with_timezone(&Local).format("%H:%M"),
            event.end_utc().with_timezone(&Local).format("%H:%M"),
            event.coordinates().ra_string(),
            event.coordinates().dec_string()
        );
    }
    Ok(())
}
