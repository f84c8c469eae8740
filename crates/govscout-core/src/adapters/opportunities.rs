use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::adapters::gateway::{GatewaySettings, SourceGateway};
use crate::adapters::settle_page;
use crate::domain::parse::{amount_field, date_field, format_us_date, text_field};
use crate::domain::Opportunity;
use crate::error::FetchFailure;
use crate::http_client::{HttpClient, HttpRequest};
use crate::outcome::FetchObserver;
use crate::pagination::{Page, PagedSource};
use crate::query::{PageCursor, QueryFilter};
use crate::throttling::RateLimiter;
use crate::SourceId;

pub const DEFAULT_BASE_URL: &str = "https://api.sam.gov/prod/opportunities/v2/search";
/// Largest `limit` SAM.gov accepts on one search call.
pub const MAX_PAGE_LIMIT: usize = 1_000;

/// SAM.gov Get Opportunities search.
///
/// One call returns one bounded page, so every page is reported as
/// exhausted and the driver never asks for a second one.
#[derive(Debug, Clone)]
pub struct SamOpportunitiesAdapter {
    gateway: SourceGateway,
    api_key: Option<String>,
}

impl SamOpportunitiesAdapter {
    pub fn new(
        settings: &GatewaySettings,
        api_key: Option<String>,
        http_client: Arc<dyn HttpClient>,
    ) -> Self {
        Self {
            gateway: SourceGateway::new(SourceId::SamOpportunities, settings, http_client),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
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

    /// Builds the search request for `filter`.
    ///
    /// Requires an API key, a posted-date window, and a NAICS code or
    /// procurement type.
    pub fn build_request(
        &self,
        filter: &QueryFilter,
        cursor: PageCursor,
    ) -> Result<HttpRequest, FetchFailure> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| FetchFailure::InvalidFilter(String::from("SAM.gov API key is not configured")))?;
        let (from, to) = filter.date_window().ok_or_else(|| {
            FetchFailure::InvalidFilter(String::from("postedFrom/postedTo window is required"))
        })?;
        if filter.naics_code.is_none() && filter.procurement_type.is_none() {
            return Err(FetchFailure::InvalidFilter(String::from(
                "a NAICS code or procurement type is required",
            )));
        }

        let limit = cursor.page_size.min(filter.limit).min(MAX_PAGE_LIMIT);
        Ok(self
            .gateway
            .get("")
            .with_query("api_key", api_key)
            .with_query("postedFrom", format_us_date(from))
            .with_query("postedTo", format_us_date(to))
            .with_query("limit", limit.to_string())
            .with_optional_query("ptype", filter.procurement_type.as_deref())
            .with_optional_query("ncode", filter.naics_code.as_deref())
            .with_optional_query("setaside", filter.set_aside.as_deref()))
    }

    /// Single search call bounded by `filter.limit`.
    pub async fn search(&self, filter: &QueryFilter) -> Vec<Opportunity> {
        self.fetch_page(filter, PageCursor::first(filter.limit))
            .await
            .records
    }
}

impl PagedSource for SamOpportunitiesAdapter {
    type Record = Opportunity;

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
    ) -> Pin<Box<dyn Future<Output = Page<Opportunity>> + Send + 'a>> {
        Box::pin(async move {
            let request = self.build_request(filter, cursor);
            let result = self
                .gateway
                .call("search", request, |body| {
                    parse_opportunities(body).map(Page::exhausted)
                })
                .await;
            settle_page(result)
        })
    }
}

/// An empty body is a valid "nothing posted" answer.
fn parse_opportunities(body: &str) -> Result<Vec<Opportunity>, FetchFailure> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let payload: Value = serde_json::from_str(body)?;
    if !payload.is_object() {
        return Err(FetchFailure::Shape(String::from(
            "expected a JSON object with opportunitiesData",
        )));
    }

    let Some(items) = payload.get("opportunitiesData") else {
        return Ok(Vec::new());
    };
    let items = items.as_array().ok_or_else(|| {
        FetchFailure::Shape(String::from("opportunitiesData is not an array"))
    })?;

    Ok(items.iter().filter_map(opportunity_from).collect())
}

fn opportunity_from(item: &Value) -> Option<Opportunity> {
    let notice_id = text_field(item.get("noticeId"))?;
    let award = item.get("award");
    let awardee = award.and_then(|award| award.get("awardee"));
    let place = item.get("placeOfPerformance");

    Some(Opportunity {
        notice_id,
        title: text_field(item.get("title")).unwrap_or_default(),
        solicitation_number: text_field(item.get("solicitationNumber")),
        agency: text_field(item.get("fullParentPathName"))
            .or_else(|| text_field(item.get("department"))),
        posted_date: date_field(item.get("postedDate")),
        response_deadline: date_field(item.get("responseDeadLine")),
        notice_type: text_field(item.get("type")),
        set_aside: text_field(item.get("typeOfSetAside")),
        naics_code: text_field(item.get("naicsCode")),
        classification_code: text_field(item.get("classificationCode")),
        active: is_active(item.get("active")),
        award_amount: amount_field(award.and_then(|award| award.get("amount"))),
        awardee_name: text_field(awardee.and_then(|awardee| awardee.get("name"))),
        awardee_uei: text_field(awardee.and_then(|awardee| awardee.get("ueiSAM"))),
        place_state: text_field(
            place
                .and_then(|place| place.get("state"))
                .and_then(|state| state.get("code")),
        ),
        place_zip: text_field(place.and_then(|place| place.get("zip"))),
        ui_link: text_field(item.get("uiLink")),
        raw: item.clone(),
    })
}

fn is_active(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(active)) => *active,
        Some(Value::String(text)) => text.eq_ignore_ascii_case("yes") || text.eq_ignore_ascii_case("true"),
        _ => false,
    }
}
