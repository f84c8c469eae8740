//! Configured ingestion plans.
//!
//! [`Ingestor`] wires the four adapters from an [`IngestConfig`] and turns
//! the configured NAICS/agency/keyword lists into fan-out branches. A list
//! left empty in config becomes a single unfiltered branch.

use std::sync::Arc;

use time::Date;
use tokio::sync::watch;
use tracing::info;

use crate::adapters::{
    CensusGeocoderAdapter, SamOpportunitiesAdapter, SbirAdapter, SbirSolicitations,
    UsaSpendingAdapter,
};
use crate::config::IngestConfig;
use crate::domain::{Award, GeocodeResult, NormalizedRecord, Opportunity, Solicitation};
use crate::error::ConfigError;
use crate::fanout::{FanOutOrchestrator, FanOutResult};
use crate::http_client::HttpClient;
use crate::outcome::FetchObserver;
use crate::pagination::{PaginationConfig, PaginationDriver};
use crate::query::{AddressQuery, QueryFilter};
use crate::throttling::RateLimiter;
use crate::ValidationError;

pub struct Ingestor {
    config: IngestConfig,
    sam: Arc<SamOpportunitiesAdapter>,
    geocoder: CensusGeocoderAdapter,
    sbir: Arc<SbirAdapter>,
    sbir_solicitations: Arc<SbirSolicitations>,
    spending: Arc<UsaSpendingAdapter>,
}

impl Ingestor {
    pub fn new(
        config: IngestConfig,
        http_client: Arc<dyn HttpClient>,
        observer: Arc<dyn FetchObserver>,
    ) -> Result<Self, ConfigError> {
        Self::build(config, http_client, observer, None)
    }

    /// Same as [`new`](Self::new), but every rate-limit wait ends early once
    /// `shutdown` turns `true`.
    pub fn with_shutdown(
        config: IngestConfig,
        http_client: Arc<dyn HttpClient>,
        observer: Arc<dyn FetchObserver>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self, ConfigError> {
        Self::build(config, http_client, observer, Some(shutdown))
    }

    fn build(
        config: IngestConfig,
        http_client: Arc<dyn HttpClient>,
        observer: Arc<dyn FetchObserver>,
        shutdown: Option<watch::Receiver<bool>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let limiter = |rate_limit_ms: u64| {
            let limiter = RateLimiter::from_millis(rate_limit_ms);
            Arc::new(match &shutdown {
                Some(shutdown) => limiter.with_shutdown(shutdown.clone()),
                None => limiter,
            })
        };

        let sam = SamOpportunitiesAdapter::new(
            &config.sam.gateway_settings(),
            config.sam.resolved_api_key(),
            Arc::clone(&http_client),
        )
        .with_limiter(limiter(config.sam.rate_limit_ms))
        .with_observer(Arc::clone(&observer));

        let geocoder =
            CensusGeocoderAdapter::new(&config.geocoder.gateway_settings(), Arc::clone(&http_client))
                .with_benchmark(config.geocoder.benchmark.as_str(), config.geocoder.vintage.as_str())
                .with_limiter(limiter(config.geocoder.rate_limit_ms))
                .with_observer(Arc::clone(&observer));

        let sbir = SbirAdapter::new(&config.sbir.gateway_settings(), Arc::clone(&http_client))
            .with_limiter(limiter(config.sbir.rate_limit_ms))
            .with_observer(Arc::clone(&observer));
        let sbir_solicitations = sbir.solicitations();

        let spending = UsaSpendingAdapter::new(&config.spending.gateway_settings(), http_client)
            .with_limiter(limiter(config.spending.rate_limit_ms))
            .with_observer(observer);

        Ok(Self {
            config,
            sam: Arc::new(sam),
            geocoder,
            sbir: Arc::new(sbir),
            sbir_solicitations: Arc::new(sbir_solicitations),
            spending: Arc::new(spending),
        })
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn sam(&self) -> &SamOpportunitiesAdapter {
        &self.sam
    }

    pub fn geocoder(&self) -> &CensusGeocoderAdapter {
        &self.geocoder
    }

    pub fn sbir(&self) -> &SbirAdapter {
        &self.sbir
    }

    pub fn spending(&self) -> &UsaSpendingAdapter {
        &self.spending
    }

    pub fn sam_filters(&self, today: Date) -> Result<Vec<QueryFilter>, ValidationError> {
        let sam = &self.config.sam;
        let base = QueryFilter::new(sam.limit)?
            .with_procurement_type(&sam.procurement_type)
            .with_set_aside(sam.set_aside.as_deref().unwrap_or_default())
            .with_lookback(today, sam.lookback_days)?;
        Ok(branches(&sam.naics_codes, base, |filter, code| filter.with_naics(code)))
    }

    pub fn sbir_award_filters(&self) -> Result<Vec<QueryFilter>, ValidationError> {
        let sbir = &self.config.sbir;
        let mut base = QueryFilter::new(sbir.max_results)?;
        if let Some(year) = sbir.year {
            base = base.with_year(year);
        }
        Ok(branches(&sbir.agencies, base, |filter, agency| {
            filter.with_agency(agency)
        }))
    }

    pub fn sbir_solicitation_filters(&self) -> Result<Vec<QueryFilter>, ValidationError> {
        let base = QueryFilter::new(self.config.sbir.max_results)?;
        Ok(branches(&self.config.sbir.keywords, base, |filter, keyword| {
            filter.with_keyword(keyword)
        }))
    }

    pub fn spending_filters(&self, today: Date) -> Result<Vec<QueryFilter>, ValidationError> {
        let spending = &self.config.spending;
        let base = QueryFilter::new(spending.max_results)?
            .with_agency(spending.agency.as_deref().unwrap_or_default())
            .with_award_type_codes(&spending.award_type_codes)
            .with_lookback(today, spending.lookback_days)?;
        Ok(branches(&spending.naics_codes, base, |filter, code| {
            filter.with_naics(code)
        }))
    }

    /// One SAM search per configured NAICS code over the lookback window.
    pub async fn sam_opportunities_by_naics(
        &self,
        today: Date,
    ) -> Result<FanOutResult<Opportunity>, ValidationError> {
        let filters = self.sam_filters(today)?;
        let limit = self.config.sam.limit;
        let orchestrator = orchestrator(limit, limit)?;
        Ok(orchestrator
            .fetch_all_reported(Arc::clone(&self.sam), filters)
            .await)
    }

    pub async fn sbir_awards_by_agency(&self) -> Result<FanOutResult<Award>, ValidationError> {
        let filters = self.sbir_award_filters()?;
        let orchestrator = orchestrator(self.config.sbir.page_size, self.config.sbir.max_results)?;
        Ok(orchestrator
            .fetch_all_reported(Arc::clone(&self.sbir), filters)
            .await)
    }

    pub async fn sbir_solicitations_by_keyword(
        &self,
    ) -> Result<FanOutResult<Solicitation>, ValidationError> {
        let filters = self.sbir_solicitation_filters()?;
        let orchestrator = orchestrator(self.config.sbir.page_size, self.config.sbir.max_results)?;
        Ok(orchestrator
            .fetch_all_reported(Arc::clone(&self.sbir_solicitations), filters)
            .await)
    }

    pub async fn spending_awards_by_naics(
        &self,
        today: Date,
    ) -> Result<FanOutResult<Award>, ValidationError> {
        let filters = self.spending_filters(today)?;
        let orchestrator = orchestrator(
            self.config.spending.page_size,
            self.config.spending.max_results,
        )?;
        Ok(orchestrator
            .fetch_all_reported(Arc::clone(&self.spending), filters)
            .await)
    }

    /// Geocodes each query in order; positions line up with `queries`.
    pub async fn geocode_all(&self, queries: &[AddressQuery]) -> Vec<Option<GeocodeResult>> {
        let mut results = Vec::with_capacity(queries.len());
        for query in queries {
            results.push(self.geocoder.geocode(query).await);
        }
        results
    }

    /// Every configured plan, SAM first, then SBIR awards, SBIR solicitations,
    /// and USAspending. Disabled sources contribute nothing.
    pub async fn run_all(&self, today: Date) -> Result<Vec<NormalizedRecord>, ValidationError> {
        let mut records = Vec::new();

        let opportunities = self.sam_opportunities_by_naics(today).await?;
        records.extend(opportunities.records.into_iter().map(NormalizedRecord::from));

        let awards = self.sbir_awards_by_agency().await?;
        records.extend(awards.records.into_iter().map(NormalizedRecord::from));

        let solicitations = self.sbir_solicitations_by_keyword().await?;
        records.extend(solicitations.records.into_iter().map(NormalizedRecord::from));

        let spending = self.spending_awards_by_naics(today).await?;
        records.extend(spending.records.into_iter().map(NormalizedRecord::from));

        info!(records = records.len(), "ingestion sweep finished");
        Ok(records)
    }
}

/// One filter per value, or the base filter alone when no values are set.
fn branches<F>(values: &[String], base: QueryFilter, apply: F) -> Vec<QueryFilter>
where
    F: Fn(QueryFilter, &str) -> QueryFilter,
{
    let values = values
        .iter()
        .filter(|value| !value.trim().is_empty())
        .collect::<Vec<_>>();
    if values.is_empty() {
        return vec![base];
    }
    values
        .into_iter()
        .map(|value| apply(base.clone(), value.as_str()))
        .collect()
}

fn orchestrator(page_size: usize, max_results: usize) -> Result<FanOutOrchestrator, ValidationError> {
    let config = PaginationConfig::new(page_size, max_results)?;
    Ok(FanOutOrchestrator::new(PaginationDriver::new(config)))
}
