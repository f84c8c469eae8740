use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::adapters::gateway::{GatewaySettings, SourceGateway};
use crate::adapters::settle_page;
use crate::domain::parse::{amount_field, date_field, text_field, year_field};
use crate::domain::{Award, Solicitation, SolicitationTopic};
use crate::error::FetchFailure;
use crate::http_client::{HttpClient, HttpRequest};
use crate::outcome::FetchObserver;
use crate::pagination::{Page, PagedSource};
use crate::query::{PageCursor, QueryFilter};
use crate::throttling::RateLimiter;
use crate::SourceId;

pub const DEFAULT_BASE_URL: &str = "https://api.www.sbir.gov/public/api";

/// SBIR.gov public API, award search.
///
/// Solicitations live on the same host and share the same limiter; reach
/// them through [`SbirAdapter::solicitations`].
#[derive(Debug, Clone)]
pub struct SbirAdapter {
    gateway: SourceGateway,
}

impl SbirAdapter {
    pub fn new(settings: &GatewaySettings, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            gateway: SourceGateway::new(SourceId::Sbir, settings, http_client),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn FetchObserver>) -> Self {
        self.gateway = self.gateway.with_observer(observer);
        self
    }

    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.gateway = self.gateway.with_limiter(limiter);
        self
    }

    pub fn gateway(&self) -> &SourceGateway {
        &self.gateway
    }

    /// Solicitation view over the same gateway, so both paths are spaced by
    /// one limiter.
    pub fn solicitations(&self) -> SbirSolicitations {
        SbirSolicitations {
            gateway: self.gateway.clone(),
        }
    }

    pub fn build_request(&self, filter: &QueryFilter, cursor: PageCursor) -> HttpRequest {
        let year = filter.year.map(|year| year.to_string());
        self.gateway
            .get("awards")
            .with_optional_query("agency", filter.agency.as_deref())
            .with_optional_query("year", year.as_deref())
            .with_optional_query("firm", filter.firm.as_deref())
            .with_query("rows", cursor.page_size.to_string())
            .with_query("start", cursor.offset.to_string())
    }
}

impl PagedSource for SbirAdapter {
    type Record = Award;

    fn id(&self) -> SourceId {
        self.gateway.id()
    }

    fn is_enabled(&self) -> bool {
        self.gateway.is_enabled()
    }

    fn fetch_page<'a>(
        &'a self,
        filter: &'a QueryFilter,
        cursor: PageCursor,
    ) -> Pin<Box<dyn Future<Output = Page<Award>> + Send + 'a>> {
        Box::pin(async move {
            let request = self.build_request(filter, cursor);
            let result = self
                .gateway
                .call("awards", Ok(request), |body| {
                    let items = parse_array(body)?;
                    let awards = items.iter().filter_map(award_from).collect::<Vec<_>>();
                    Ok(page_for(awards, items.len(), cursor))
                })
                .await;
            settle_page(result)
        })
    }
}

/// Open SBIR/STTR solicitations, optionally narrowed by keyword and agency.
#[derive(Debug, Clone)]
pub struct SbirSolicitations {
    gateway: SourceGateway,
}

impl SbirSolicitations {
    pub fn gateway(&self) -> &SourceGateway {
        &self.gateway
    }

    pub fn build_request(&self, filter: &QueryFilter, cursor: PageCursor) -> HttpRequest {
        self.gateway
            .get("solicitations")
            .with_query("open", "1")
            .with_optional_query("keyword", filter.keyword.as_deref())
            .with_optional_query("agency", filter.agency.as_deref())
            .with_query("rows", cursor.page_size.to_string())
            .with_query("start", cursor.offset.to_string())
    }
}

impl PagedSource for SbirSolicitations {
    type Record = Solicitation;

    fn id(&self) -> SourceId {
        self.gateway.id()
    }

    fn is_enabled(&self) -> bool {
        self.gateway.is_enabled()
    }

    fn fetch_page<'a>(
        &'a self,
        filter: &'a QueryFilter,
        cursor: PageCursor,
    ) -> Pin<Box<dyn Future<Output = Page<Solicitation>> + Send + 'a>> {
        Box::pin(async move {
            let request = self.build_request(filter, cursor);
            let result = self
                .gateway
                .call("solicitations", Ok(request), |body| {
                    let items = parse_array(body)?;
                    let solicitations = items
                        .iter()
                        .filter_map(solicitation_from)
                        .collect::<Vec<_>>();
                    Ok(page_for(solicitations, items.len(), cursor))
                })
                .await;
            settle_page(result)
        })
    }
}

/// A page is only "more" when the upstream filled every requested row; an
/// empty page always ends the fetch.
fn page_for<R>(records: Vec<R>, upstream_rows: usize, cursor: PageCursor) -> Page<R> {
    let page = if upstream_rows > 0 && upstream_rows >= cursor.page_size {
        Page::more(records)
    } else {
        Page::exhausted(records)
    };
    page.with_upstream_rows(upstream_rows)
}

/// SBIR.gov answers with a bare JSON array; an empty body means no rows.
fn parse_array(body: &str) -> Result<Vec<Value>, FetchFailure> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Value>(body)? {
        Value::Array(items) => Ok(items),
        _ => Err(FetchFailure::Shape(String::from("expected a JSON array"))),
    }
}

fn award_from(item: &Value) -> Option<Award> {
    let award_id = text_field(item.get("contract"))
        .or_else(|| text_field(item.get("agency_tracking_number")))?;

    Some(Award {
        source: SourceId::Sbir,
        award_id,
        title: text_field(item.get("award_title")),
        recipient_name: text_field(item.get("firm")),
        recipient_uei: text_field(item.get("uei")),
        agency: text_field(item.get("agency")),
        sub_agency: text_field(item.get("branch")),
        amount: amount_field(item.get("award_amount")),
        award_date: date_field(item.get("proposal_award_date")),
        start_date: date_field(item.get("proposal_award_date")),
        end_date: date_field(item.get("contract_end_date")),
        naics_code: None,
        program: text_field(item.get("program")),
        phase: text_field(item.get("phase")),
        state: text_field(item.get("state")),
        raw: item.clone(),
    })
}

fn solicitation_from(item: &Value) -> Option<Solicitation> {
    let title = text_field(item.get("solicitation_title"))?;
    let topics = item
        .get("solicitation_topics")
        .and_then(Value::as_array)
        .map(|topics| {
            topics
                .iter()
                .filter_map(|topic| {
                    Some(SolicitationTopic {
                        number: text_field(topic.get("topic_number")),
                        title: text_field(topic.get("topic_title"))?,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    // application_due_date is a list of cycle deadlines; the first one is used
    // when close_date is absent.
    let close_date = date_field(item.get("close_date")).or_else(|| {
        date_field(
            item.get("application_due_date")
                .and_then(Value::as_array)
                .and_then(|dates| dates.first()),
        )
    });

    Some(Solicitation {
        solicitation_number: text_field(item.get("solicitation_number")),
        title,
        agency: text_field(item.get("agency")),
        branch: text_field(item.get("branch")),
        program: text_field(item.get("program")),
        phase: text_field(item.get("phase")),
        year: year_field(item.get("solicitation_year")),
        open_date: date_field(item.get("open_date"))
            .or_else(|| date_field(item.get("release_date"))),
        close_date,
        status: text_field(item.get("current_status")),
        topics,
        url: text_field(item.get("solicitation_agency_url")),
        raw: item.clone(),
    })
}
