//! # Govscout Core
//!
//! Rate-limited ingestion of public government-contracting data.
//!
//! ## Overview
//!
//! This crate pulls records from four separately operated public APIs and
//! normalizes them into one record model:
//!
//! - **SAM.gov** contract opportunities
//! - **Census Bureau** geocoder (address and coordinate lookups)
//! - **SBIR.gov** awards and solicitations
//! - **USAspending** award search plus recipient/agency lookups
//!
//! Every source gets its own rate limiter, its own pagination scheme, and
//! its own failure handling. Adapters never return errors: a failed call
//! yields an empty result and a [`FetchEvent`] on the configured
//! [`FetchObserver`], so callers can still tell an outage from "no data".
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | One adapter per upstream API, sharing a gateway call path |
//! | [`config`] | TOML ingestion config with per-source defaults |
//! | [`domain`] | Normalized records and lookup models |
//! | [`error`] | Validation, config, and fetch-failure errors |
//! | [`fanout`] | One logical query fanned out over many filters |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`ingest`] | Configured ingestion plans over all four sources |
//! | [`outcome`] | Per-call fetch events and observers |
//! | [`pagination`] | Multi-page fetch driver |
//! | [`query`] | Filters, cursors, and address queries |
//! | [`source`] | Source identifiers |
//! | [`throttling`] | Minimum-interval limiter and request quotas |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use govscout_core::{
//!     FanOutOrchestrator, GatewaySettings, PaginationConfig, PaginationDriver, QueryFilter,
//!     ReqwestHttpClient, SbirAdapter,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = SbirAdapter::new(
//!         &GatewaySettings::new(govscout_core::adapters::sbir::DEFAULT_BASE_URL, 1_000),
//!         Arc::new(ReqwestHttpClient::new()),
//!     );
//!
//!     let driver = PaginationDriver::new(PaginationConfig::new(100, 500)?);
//!     let filters = ["DOD", "NASA"]
//!         .iter()
//!         .map(|agency| QueryFilter::new(500).map(|filter| filter.with_agency(agency)))
//!         .collect::<Result<Vec<_>, _>>()?;
//!
//!     let awards = FanOutOrchestrator::new(driver)
//!         .fetch_all(Arc::new(adapter), filters)
//!         .await;
//!     println!("{} awards", awards.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  FanOutOrchestrator  │  one branch per NAICS / agency / keyword
//! └──────────┬───────────┘
//!            ▼
//! ┌──────────────────────┐
//! │  PaginationDriver    │  cap, short page, empty page, failure
//! └──────────┬───────────┘
//!            ▼
//! ┌──────────────────────┐     ┌──────────────────┐
//! │  Source adapter      │────▶│ FetchObserver    │
//! │  (SourceGateway)     │     └──────────────────┘
//! └──────────┬───────────┘
//!            ▼
//! ┌──────────────────────┐     ┌──────────────────┐
//! │  RateLimiter         │────▶│ HttpClient       │
//! │  (+ QuotaGuard)      │     │ (reqwest/fake)   │
//! └──────────────────────┘     └──────────────────┘
//! ```
//!
//! ## Security
//!
//! - The SAM.gov API key comes from config or the environment and is never logged

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod fanout;
pub mod http_client;
pub mod ingest;
pub mod outcome;
pub mod pagination;
pub mod query;
pub mod source;
pub mod throttling;

// Adapter implementations
pub use adapters::{
    CensusGeocoderAdapter, GatewaySettings, RecordCount, SamOpportunitiesAdapter, SbirAdapter,
    SbirSolicitations, SourceGateway, UsaSpendingAdapter,
};

// Configuration
pub use config::{load_config, IngestConfig};

// Domain models
pub use domain::{
    AgencyBudget, Award, FiscalYearBudget, GeocodeResult, NormalizedRecord, Opportunity,
    RecipientProfile, Solicitation, SolicitationTopic, ToptierAgency,
};

// Error types
pub use error::{ConfigError, FetchFailure, ValidationError};

// Fan-out
pub use fanout::{BranchOutcome, BranchReport, FanOutOrchestrator, FanOutResult};

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
};

// Ingestion plans
pub use ingest::Ingestor;

// Fetch outcomes
pub use outcome::{FetchEvent, FetchObserver, FetchOutcome, RecordingObserver, TracingObserver};

// Pagination
pub use pagination::{
    DriveResult, Page, PageStatus, PagedSource, PaginationConfig, PaginationDriver, StopReason,
};

// Query values
pub use query::{AddressComponents, AddressQuery, PageCursor, QueryFilter};

// Source identifiers
pub use source::SourceId;

// Throttling
pub use throttling::{AcquireOutcome, QuotaGuard, RateLimitState, RateLimiter};
