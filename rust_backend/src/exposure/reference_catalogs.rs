//! HTTP-backed reference-star catalogs.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::collaborators::{ReferenceCatalog, ReferenceQuery};
use crate::catalog::{FetchRequest, TextFetcher};
use crate::config::ExposureSettings;
use crate::core::coordinates::{format_dms, format_hms};
use crate::error::CatalogResult;
use crate::parsing::{
    parse_chart_comparison_stars, parse_simbad_comparison_stars, parse_simbad_oid,
    parse_vsx_variable_stars, ReferenceStar,
};

/// Limit for one catalog lookup, independent of the other catalogs.
pub const REFERENCE_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub const VSX_URL: &str = "https://www.aavso.org/vsx/index.php";
pub const VSP_CHART_URL: &str = "https://app.aavso.org/vsp/api/chart/";
pub const SIMBAD_TAP_URL: &str = "https://simbad.cds.unistra.fr/simbad/sim-tap/sync";

/// Catalogued variable stars within a few arcminutes of the field center.
pub struct VariableStarCatalog {
    fetcher: Arc<dyn TextFetcher>,
    url: String,
}

impl VariableStarCatalog {
    pub fn new(fetcher: Arc<dyn TextFetcher>) -> Self {
        Self::with_url(fetcher, VSX_URL)
    }

    pub fn with_url(fetcher: Arc<dyn TextFetcher>, url: impl Into<String>) -> Self {
        Self {
            fetcher,
            url: url.into(),
        }
    }

    pub fn request(&self, query: &ReferenceQuery) -> FetchRequest {
        FetchRequest::Get {
            url: self.url.clone(),
            query: vec![
                ("view".into(), "api.list".into()),
                ("ra".into(), query.field_center.ra_degrees().to_string()),
                ("dec".into(), query.field_center.dec_degrees().to_string()),
                ("radius".into(), "3".into()),
                ("tomag".into(), "18".into()),
                ("format".into(), "json".into()),
            ],
        }
    }
}

#[async_trait]
impl ReferenceCatalog for VariableStarCatalog {
    fn name(&self) -> &str {
        "variable stars"
    }

    async fn stars_near(
        &self,
        query: &ReferenceQuery,
        cancel: &CancellationToken,
    ) -> CatalogResult<Vec<ReferenceStar>> {
        let text = self.fetcher.fetch_text(&self.request(query), cancel).await?;
        parse_vsx_variable_stars(&text)
    }
}

/// Comparison stars from a variable-star chart around the field center.
pub struct ChartComparisonCatalog {
    fetcher: Arc<dyn TextFetcher>,
    url: String,
}

impl ChartComparisonCatalog {
    pub fn new(fetcher: Arc<dyn TextFetcher>) -> Self {
        Self::with_url(fetcher, VSP_CHART_URL)
    }

    pub fn with_url(fetcher: Arc<dyn TextFetcher>, url: impl Into<String>) -> Self {
        Self {
            fetcher,
            url: url.into(),
        }
    }

    pub fn request(&self, query: &ReferenceQuery) -> FetchRequest {
        let dec = format_dms(query.field_center.dec_degrees());
        FetchRequest::Get {
            url: self.url.clone(),
            query: vec![
                ("ra".into(), format_hms(query.field_center.ra_hours())),
                ("dec".into(), dec.trim_start_matches('+').to_string()),
                ("fov".into(), "35".into()),
                ("maglimit".into(), "18.5".into()),
                ("format".into(), "json".into()),
            ],
        }
    }
}

#[async_trait]
impl ReferenceCatalog for ChartComparisonCatalog {
    fn name(&self) -> &str {
        "chart comparison stars"
    }

    async fn stars_near(
        &self,
        query: &ReferenceQuery,
        cancel: &CancellationToken,
    ) -> CatalogResult<Vec<ReferenceStar>> {
        let text = self.fetcher.fetch_text(&self.request(query), cancel).await?;
        parse_chart_comparison_stars(&text)
    }
}

/// Stars of similar colour and brightness to the target, from a TAP service.
///
/// Two queries: the target's object id at its position, then stars within
/// one degree whose B−V, V−R or V lies within 10 % of the target's.
pub struct ColourComparisonCatalog {
    fetcher: Arc<dyn TextFetcher>,
    url: String,
}

impl ColourComparisonCatalog {
    pub fn new(fetcher: Arc<dyn TextFetcher>) -> Self {
        Self::with_url(fetcher, SIMBAD_TAP_URL)
    }

    pub fn with_url(fetcher: Arc<dyn TextFetcher>, url: impl Into<String>) -> Self {
        Self {
            fetcher,
            url: url.into(),
        }
    }

    fn tap_request(&self, adql: String) -> FetchRequest {
        FetchRequest::PostForm {
            url: self.url.clone(),
            form: vec![
                ("request".into(), "doQuery".into()),
                ("lang".into(), "adql".into()),
                ("format".into(), "json".into()),
                ("maxrec".into(), "100".into()),
                ("phase".into(), "run".into()),
                ("query".into(), adql),
            ],
        }
    }

    pub fn oid_request(&self, target: &crate::core::Coordinates) -> FetchRequest {
        self.tap_request(format!(
            "SELECT distinct basic.oid as oid from basic WHERE otype = '*..' and \
             CONTAINS(POINT('ICRS', basic.ra, basic.dec), CIRCLE('ICRS', {}, {}, 0.01)) = 1",
            target.ra_degrees(),
            target.dec_degrees()
        ))
    }

    pub fn comparison_request(&self, oid: i64) -> FetchRequest {
        self.tap_request(format!(
            "SELECT distinct top 100 basic.main_id as main_id, allfluxes.B as B, allfluxes.V as V, \
             allfluxes.R as R, basic.ra as ra, basic.dec as dec \
             from allfluxes JOIN ident USING(oidref) JOIN basic ON ident.oidref = basic.oid \
             join(SELECT distinct basic.oid as oid, B, V, R, (B - V) * 0.9 as bvlow, (B - V) * 1.1 as bvhigh, \
             (V - R) * 0.9 as vrlow, (V - R) * 1.1 as vrhigh, V * 0.9 as vlow, V * 1.1 as vhigh, ra, dec \
             from allfluxes JOIN ident USING(oidref) JOIN basic ON ident.oidref = basic.oid WHERE oid = {oid}) as target \
             ON CONTAINS(POINT('ICRS', basic.ra, basic.dec), CIRCLE('ICRS', target.ra, target.dec, 1.0)) = 1 \
             WHERE basic.ra IS NOT NULL and basic.dec IS NOT NULL and allfluxes.v is not null and basic.otype = '*..' \
             and((allfluxes.b is not null and allfluxes.b - allfluxes.v >= target.bvlow and allfluxes.b - allfluxes.v <= target.bvhigh) \
             or(allfluxes.r is not null and allfluxes.v - allfluxes.r >= target.vrlow and allfluxes.v - allfluxes.r <= target.vrhigh) \
             or(allfluxes.v >= target.vlow and allfluxes.v <= target.vhigh));"
        ))
    }
}

#[async_trait]
impl ReferenceCatalog for ColourComparisonCatalog {
    fn name(&self) -> &str {
        "colour-matched comparison stars"
    }

    async fn stars_near(
        &self,
        query: &ReferenceQuery,
        cancel: &CancellationToken,
    ) -> CatalogResult<Vec<ReferenceStar>> {
        let text = self
            .fetcher
            .fetch_text(&self.oid_request(&query.target), cancel)
            .await?;
        let Some(oid) = parse_simbad_oid(&text)? else {
            log::info!("No catalogue object at the position of {}", query.target_name);
            return Ok(Vec::new());
        };
        let text = self
            .fetcher
            .fetch_text(&self.comparison_request(oid), cancel)
            .await?;
        parse_simbad_comparison_stars(&text)
    }
}

/// The reference catalogs consulted during an exposure search.
#[derive(Clone, Default)]
pub struct ReferenceCatalogs {
    pub variables: Option<Arc<dyn ReferenceCatalog>>,
    pub colour_comparisons: Option<Arc<dyn ReferenceCatalog>>,
    pub chart_comparisons: Option<Arc<dyn ReferenceCatalog>>,
}

impl ReferenceCatalogs {
    /// No catalogs: only the target and similar-brightness stars are matched.
    pub fn none() -> Self {
        Self::default()
    }

    /// HTTP catalogs enabled by the retrieval toggles in `settings`.
    pub fn from_settings(settings: &ExposureSettings, fetcher: Arc<dyn TextFetcher>) -> Self {
        let mut catalogs = Self::none();
        if settings.retrieve_variable_stars {
            catalogs.variables = Some(Arc::new(VariableStarCatalog::new(fetcher.clone())));
        }
        if settings.retrieve_comparison_stars {
            catalogs.colour_comparisons = Some(Arc::new(ColourComparisonCatalog::new(fetcher.clone())));
            catalogs.chart_comparisons = Some(Arc::new(ChartComparisonCatalog::new(fetcher)));
        }
        catalogs
    }
}
