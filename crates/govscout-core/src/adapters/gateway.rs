use std::sync::Arc;
use std::time::Instant;

use tracing::trace;

use crate::error::FetchFailure;
use crate::http_client::{HttpClient, HttpRequest};
use crate::outcome::{FetchEvent, FetchObserver, FetchOutcome, TracingObserver};
use crate::pagination::Page;
use crate::throttling::{saturating_millis, AcquireOutcome, QuotaGuard, RateLimiter};
use crate::SourceId;

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Connection settings every adapter needs, independent of its filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySettings {
    pub enabled: bool,
    pub base_url: String,
    pub rate_limit_ms: u64,
    pub daily_quota: Option<u32>,
    pub request_timeout_ms: u64,
}

impl GatewaySettings {
    pub fn new(base_url: impl Into<String>, rate_limit_ms: u64) -> Self {
        Self {
            enabled: true,
            base_url: base_url.into(),
            rate_limit_ms,
            daily_quota: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_daily_quota(mut self, quota: u32) -> Self {
        self.daily_quota = Some(quota);
        self
    }

    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }
}

/// Number of records a parsed response contributes, used for the
/// success/no-match distinction in fetch events.
pub trait RecordCount {
    fn record_count(&self) -> usize;
}

impl<T> RecordCount for Vec<T> {
    fn record_count(&self) -> usize {
        self.len()
    }
}

impl<T> RecordCount for Option<T> {
    fn record_count(&self) -> usize {
        usize::from(self.is_some())
    }
}

impl<R> RecordCount for Page<R> {
    fn record_count(&self) -> usize {
        self.records.len()
    }
}

/// Why a gateway call produced no value. Already reported to the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CallError {
    Disabled,
    Failed,
}

/// Shared call path for one upstream source.
///
/// Order per call: enabled check, quota check, rate-limit wait, HTTP, status
/// check, parse. Every call reports exactly one [`FetchEvent`].
#[derive(Clone)]
pub struct SourceGateway {
    id: SourceId,
    enabled: bool,
    base_url: String,
    request_timeout_ms: u64,
    http_client: Arc<dyn HttpClient>,
    limiter: Arc<RateLimiter>,
    quota: Option<QuotaGuard>,
    observer: Arc<dyn FetchObserver>,
}

impl SourceGateway {
    pub fn new(id: SourceId, settings: &GatewaySettings, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            id,
            enabled: settings.enabled,
            base_url: settings.base_url.trim_end_matches('/').to_owned(),
            request_timeout_ms: settings.request_timeout_ms,
            http_client,
            limiter: Arc::new(RateLimiter::from_millis(settings.rate_limit_ms)),
            quota: settings.daily_quota.map(QuotaGuard::per_day),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replaces the limiter, e.g. with one wired to a shutdown signal.
    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn FetchObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub const fn id(&self) -> SourceId {
        self.id
    }

    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        if path.is_empty() {
            return self.base_url.clone();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn get(&self, path: &str) -> HttpRequest {
        HttpRequest::get(self.endpoint(path)).with_timeout_ms(self.request_timeout_ms)
    }

    pub(crate) fn post(&self, path: &str) -> HttpRequest {
        HttpRequest::post(self.endpoint(path)).with_timeout_ms(self.request_timeout_ms)
    }

    /// Runs one upstream call and reports it.
    ///
    /// `request` is a `Result` so adapters can hand over filter validation
    /// failures and still get them reported as `InvalidFilter`. Nothing is
    /// sent when the source is disabled or the request could not be built.
    pub(crate) async fn call<T, F>(
        &self,
        operation: &'static str,
        request: Result<HttpRequest, FetchFailure>,
        parse: F,
    ) -> Result<T, CallError>
    where
        T: RecordCount,
        F: FnOnce(&str) -> Result<T, FetchFailure>,
    {
        if !self.enabled {
            self.report(operation, FetchOutcome::Disabled, 0, 0);
            return Err(CallError::Disabled);
        }

        let started = Instant::now();
        let result = match request {
            Ok(request) => match self.send(request).await {
                Ok(body) => parse(&body),
                Err(failure) => Err(failure),
            },
            Err(failure) => Err(failure),
        };
        let elapsed_ms = saturating_millis(started.elapsed());

        match result {
            Ok(value) => {
                let records = value.record_count();
                let outcome = if records == 0 {
                    FetchOutcome::NoMatch
                } else {
                    FetchOutcome::Success
                };
                self.report(operation, outcome, records, elapsed_ms);
                Ok(value)
            }
            Err(failure) => {
                self.report(operation, failure.to_outcome(), 0, elapsed_ms);
                Err(CallError::Failed)
            }
        }
    }

    async fn send(&self, request: HttpRequest) -> Result<String, FetchFailure> {
        if let Some(quota) = &self.quota {
            quota
                .try_consume()
                .map_err(|retry_in| FetchFailure::QuotaExhausted { retry_in })?;
        }

        match self.limiter.acquire().await {
            AcquireOutcome::Waited(wait) => {
                trace!(source = %self.id, wait_ms = saturating_millis(wait), "rate limit wait");
            }
            AcquireOutcome::Interrupted => {
                trace!(source = %self.id, "rate limit wait interrupted by shutdown");
            }
            AcquireOutcome::Immediate => {}
        }

        let response = self.http_client.execute(request).await?;
        if !response.is_success() {
            return Err(FetchFailure::Status {
                status: response.status,
            });
        }
        Ok(response.body)
    }

    fn report(&self, operation: &'static str, outcome: FetchOutcome, records: usize, elapsed_ms: u64) {
        self.observer.observe(&FetchEvent {
            source: self.id,
            operation,
            outcome,
            records,
            elapsed_ms,
        });
    }
}

impl std::fmt::Debug for SourceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceGateway")
            .field("id", &self.id)
            .field("enabled", &self.enabled)
            .field("base_url", &self.base_url)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("limiter", &self.limiter)
            .field("quota", &self.quota)
            .finish_non_exhaustive()
    }
}
