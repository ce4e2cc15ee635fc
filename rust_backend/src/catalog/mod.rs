//! Catalog ingestion.
//!
//! Sources implement [`CatalogSource`] and share a [`TextFetcher`]; the HTTP
//! implementation applies a per-attempt timeout, a bounded number of
//! attempts and honours a [`CancellationToken`](tokio_util::sync::CancellationToken).
//! [`fetch_all`] runs several sources at once and keeps whatever arrived.

pub mod fetcher;
pub mod local;
pub mod retrieval;
pub mod sources;


pub use fetcher::{FetchRequest, HttpFetcher, TextFetcher};
pub use local::{all_night_window, LocalVariableCatalogSource};
pub use retrieval::{fetch_all, fetch_each, source_for_settings, RetrievalReport, SourceOutcome};
pub use sources::{CatalogContext, CatalogSource, EphemerisDatabaseSource, TransitPredictorSource};
