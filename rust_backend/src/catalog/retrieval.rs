//! Concurrent retrieval from several catalog sources.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::fetcher::TextFetcher;
use super::local::LocalVariableCatalogSource;
use super::sources::{CatalogContext, CatalogSource, EphemerisDatabaseSource, TransitPredictorSource};
use crate::config::{CatalogSettings, TargetList};
use crate::core::Event;
use crate::error::{CatalogError, CatalogResult};

/// Result of one source within a fan-out.
#[derive(Debug)]
pub struct SourceOutcome {
    pub source: String,
    pub result: CatalogResult<Vec<Event>>,
}

/// Combined result of a fan-out: every event that arrived plus the failures.
#[derive(Debug, Default)]
pub struct RetrievalReport {
    pub events: Vec<Event>,
    pub failures: Vec<(String, CatalogError)>,
}

impl RetrievalReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs every source concurrently, each under its own `timeout`.
///
/// A slow, failing or cancelled source never discards what the others
/// returned. Outcomes are reported in the order of `sources`.
pub async fn fetch_each(
    sources: &[Arc<dyn CatalogSource>],
    context: &CatalogContext,
    cancel: &CancellationToken,
    timeout: Duration,
) -> Vec<SourceOutcome> {
    let tasks = sources.iter().map(|source| {
        let token = cancel.child_token();
        async move {
            let result = match tokio::time::timeout(timeout, source.fetch(context, &token)).await {
                Ok(result) => result,
                Err(_) => {
                    token.cancel();
                    Err(CatalogError::Timeout(timeout.as_secs()))
                }
            };
            SourceOutcome {
                source: source.name().to_string(),
                result,
            }
        }
    });
    join_all(tasks).await
}

/// Like [`fetch_each`] but merges the successful event lists.
pub async fn fetch_all(
    sources: &[Arc<dyn CatalogSource>],
    context: &CatalogContext,
    cancel: &CancellationToken,
    timeout: Duration,
) -> RetrievalReport {
    let mut report = RetrievalReport::default();
    for outcome in fetch_each(sources, context, cancel, timeout).await {
        match outcome.result {
            Ok(events) => report.events.extend(events),
            Err(e) => {
                log::error!("Retrieving targets from {} failed: {}", outcome.source, e);
                report.failures.push((outcome.source, e));
            }
        }
    }
    report
}

/// Builds the source selected in the settings.
///
/// Returns `None` for the variable star list when no file is configured.
pub fn source_for_settings(
    settings: &CatalogSettings,
    fetcher: Arc<dyn TextFetcher>,
) -> Option<Arc<dyn CatalogSource>> {
    let source: Arc<dyn CatalogSource> = match settings.target_list {
        TargetList::TransitPredictor => {
            Arc::new(TransitPredictorSource::from_settings(fetcher, settings))
        }
        TargetList::EphemerisDatabase => {
            Arc::new(EphemerisDatabaseSource::from_settings(fetcher, settings))
        }
        TargetList::VariableStarFile => Arc::new(LocalVariableCatalogSource::from_settings(settings)?),
    };
    Some(source)
}
