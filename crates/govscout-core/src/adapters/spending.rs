use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::adapters::gateway::{GatewaySettings, SourceGateway};
use crate::adapters::settle_page;
use crate::domain::parse::{amount_field, date_field, format_iso_date, text_field, year_field};
use crate::domain::{AgencyBudget, Award, FiscalYearBudget, RecipientProfile, ToptierAgency};
use crate::error::FetchFailure;
use crate::http_client::{HttpClient, HttpRequest};
use crate::outcome::FetchObserver;
use crate::pagination::{Page, PagedSource};
use crate::query::{PageCursor, QueryFilter};
use crate::throttling::RateLimiter;
use crate::SourceId;

pub const DEFAULT_BASE_URL: &str = "https://api.usaspending.gov/api/v2";
/// Largest `limit` the `spending_by_award` search accepts per page.
pub const MAX_PAGE_LIMIT: usize = 100;
/// Contract award types (definitive, purchase order, delivery order, BPA call).
pub const DEFAULT_AWARD_TYPE_CODES: [&str; 4] = ["A", "B", "C", "D"];

const AWARD_FIELDS: [&str; 13] = [
    "Award ID",
    "Recipient Name",
    "Recipient UEI",
    "Award Amount",
    "Description",
    "Start Date",
    "End Date",
    "Awarding Agency",
    "Awarding Sub Agency",
    "Award Type",
    "NAICS",
    "Place of Performance State Code",
    "generated_internal_id",
];

/// USAspending API v2: award search plus single-call lookups.
#[derive(Debug, Clone)]
pub struct UsaSpendingAdapter {
    gateway: SourceGateway,
}

impl UsaSpendingAdapter {
    pub fn new(settings: &GatewaySettings, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            gateway: SourceGateway::new(SourceId::UsaSpending, settings, http_client),
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

    /// Builds the `spending_by_award` search body. The time period is required.
    pub fn build_request(
        &self,
        filter: &QueryFilter,
        cursor: PageCursor,
    ) -> Result<HttpRequest, FetchFailure> {
        let (start, end) = filter.date_window().ok_or_else(|| {
            FetchFailure::InvalidFilter(String::from("time_period window is required"))
        })?;

        let award_type_codes = if filter.award_type_codes.is_empty() {
            DEFAULT_AWARD_TYPE_CODES.iter().map(|code| code.to_string()).collect()
        } else {
            filter.award_type_codes.clone()
        };

        let mut filters = json!({
            "award_type_codes": award_type_codes,
            "time_period": [{
                "start_date": format_iso_date(start),
                "end_date": format_iso_date(end),
            }],
        });
        if let Some(naics) = &filter.naics_code {
            filters["naics_codes"] = json!([naics]);
        }
        if let Some(agency) = &filter.agency {
            filters["agencies"] = json!([{
                "type": "awarding",
                "tier": "toptier",
                "name": agency,
            }]);
        }

        let body = json!({
            "filters": filters,
            "fields": AWARD_FIELDS,
            "page": cursor.page_number(),
            "limit": cursor.page_size,
            "sort": "Award Amount",
            "order": "desc",
        });
        Ok(self
            .gateway
            .post("search/spending_by_award/")
            .with_json_body(&body))
    }

    /// Recipient profile keyed by UEI.
    pub async fn recipient(&self, uei: &str) -> Option<RecipientProfile> {
        let uei = uei.trim();
        let request = if uei.is_empty() {
            Err(FetchFailure::InvalidFilter(String::from("recipient UEI is blank")))
        } else {
            Ok(self
                .gateway
                .get(&format!("recipient/{}/", urlencoding::encode(uei))))
        };

        self.gateway
            .call("recipient", request, parse_recipient)
            .await
            .ok()
            .flatten()
    }

    /// Budgetary resources by fiscal year for one toptier agency code.
    pub async fn agency_budgetary_resources(&self, toptier_code: &str) -> Option<AgencyBudget> {
        let code = toptier_code.trim();
        let request = if code.is_empty() {
            Err(FetchFailure::InvalidFilter(String::from("toptier code is blank")))
        } else {
            Ok(self.gateway.get(&format!(
                "agency/{}/budgetary_resources/",
                urlencoding::encode(code)
            )))
        };

        self.gateway
            .call("budgetary_resources", request, |body| {
                parse_budget(body, code)
            })
            .await
            .ok()
            .flatten()
    }

    pub async fn toptier_agencies(&self) -> Vec<ToptierAgency> {
        let request = self.gateway.get("references/toptier_agencies/");
        self.gateway
            .call("toptier_agencies", Ok(request), parse_toptier_agencies)
            .await
            .unwrap_or_default()
    }
}

impl PagedSource for UsaSpendingAdapter {
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
                .call("spending_by_award", request, parse_award_page)
                .await;
            settle_page(result)
        })
    }
}

fn parse_award_page(body: &str) -> Result<Page<Award>, FetchFailure> {
    let payload: Value = serde_json::from_str(body)?;
    let results = payload
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| FetchFailure::Shape(String::from("missing results array")))?;

    let awards = results.iter().filter_map(award_from).collect::<Vec<_>>();
    let has_next = payload
        .get("page_metadata")
        .and_then(|metadata| metadata.get("hasNext"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let page = if has_next {
        Page::more(awards)
    } else {
        Page::exhausted(awards)
    };
    Ok(page.with_upstream_rows(results.len()))
}

fn award_from(item: &Value) -> Option<Award> {
    let award_id = text_field(item.get("Award ID"))
        .or_else(|| text_field(item.get("generated_internal_id")))?;

    // NAICS arrives either as a bare code or as {code, description}.
    let naics_code = match item.get("NAICS") {
        Some(Value::Object(naics)) => text_field(naics.get("code")),
        other => text_field(other),
    };

    Some(Award {
        source: SourceId::UsaSpending,
        award_id,
        title: text_field(item.get("Description")),
        recipient_name: text_field(item.get("Recipient Name")),
        recipient_uei: text_field(item.get("Recipient UEI")),
        agency: text_field(item.get("Awarding Agency")),
        sub_agency: text_field(item.get("Awarding Sub Agency")),
        amount: amount_field(item.get("Award Amount")),
        award_date: date_field(item.get("Start Date")),
        start_date: date_field(item.get("Start Date")),
        end_date: date_field(item.get("End Date")),
        naics_code,
        program: text_field(item.get("Award Type")),
        phase: None,
        state: text_field(item.get("Place of Performance State Code")),
        raw: item.clone(),
    })
}

fn parse_recipient(body: &str) -> Result<Option<RecipientProfile>, FetchFailure> {
    let payload: Value = serde_json::from_str(body)?;
    if !payload.is_object() {
        return Err(FetchFailure::Shape(String::from("expected a recipient object")));
    }
    let name = text_field(payload.get("name"));
    let uei = text_field(payload.get("uei"));
    if name.is_none() && uei.is_none() {
        return Ok(None);
    }

    let business_types = payload
        .get("business_types")
        .and_then(Value::as_array)
        .map(|types| types.iter().filter_map(|entry| text_field(Some(entry))).collect())
        .unwrap_or_default();

    Ok(Some(RecipientProfile {
        uei,
        name,
        duns: text_field(payload.get("duns")),
        recipient_id: text_field(payload.get("recipient_id")),
        total_transaction_amount: amount_field(payload.get("total_transaction_amount")),
        total_transactions: payload.get("total_transactions").and_then(Value::as_u64),
        state: text_field(
            payload
                .get("location")
                .and_then(|location| location.get("state_code")),
        ),
        business_types,
        raw: payload,
    }))
}

fn parse_budget(body: &str, toptier_code: &str) -> Result<Option<AgencyBudget>, FetchFailure> {
    let payload: Value = serde_json::from_str(body)?;
    let Some(years) = payload.get("agency_data_by_year").and_then(Value::as_array) else {
        return Ok(None);
    };

    let mut fiscal_years = years
        .iter()
        .filter_map(|year| {
            Some(FiscalYearBudget {
                fiscal_year: year_field(year.get("fiscal_year"))?,
                agency_budgetary_resources: amount_field(year.get("agency_budgetary_resources")),
                agency_total_obligated: amount_field(year.get("agency_total_obligated")),
                total_budgetary_resources: amount_field(year.get("total_budgetary_resources")),
            })
        })
        .collect::<Vec<_>>();
    if fiscal_years.is_empty() {
        return Ok(None);
    }
    fiscal_years.sort_by_key(|year| std::cmp::Reverse(year.fiscal_year));

    Ok(Some(AgencyBudget {
        toptier_code: text_field(payload.get("toptier_code"))
            .unwrap_or_else(|| toptier_code.to_owned()),
        fiscal_years,
        raw: payload,
    }))
}

fn parse_toptier_agencies(body: &str) -> Result<Vec<ToptierAgency>, FetchFailure> {
    let payload: Value = serde_json::from_str(body)?;
    let results = payload
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| FetchFailure::Shape(String::from("missing results array")))?;

    Ok(results
        .iter()
        .filter_map(|agency| {
            Some(ToptierAgency {
                agency_id: agency.get("agency_id").and_then(Value::as_i64),
                toptier_code: text_field(agency.get("toptier_code")),
                abbreviation: text_field(agency.get("abbreviation")),
                name: text_field(agency.get("agency_name"))?,
                budget_authority_amount: amount_field(agency.get("budget_authority_amount")),
                obligated_amount: amount_field(agency.get("obligated_amount")),
            })
        })
        .collect())
}
