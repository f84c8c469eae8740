//! Contract tests every source adapter must satisfy.

#[path = "../support/mod.rs"]
mod support;

use std::sync::Arc;

use govscout_core::adapters::{geocoder, opportunities, sbir, spending};
use govscout_core::{
    AddressQuery, CensusGeocoderAdapter, FetchOutcome, GatewaySettings, HttpMethod, PageCursor,
    PagedSource, QueryFilter, RecordingObserver, SamOpportunitiesAdapter, SbirAdapter, SourceId,
    UsaSpendingAdapter,
};
use support::ScriptedHttpClient;
use time::macros::date;

const SAM_KEY: &str = "test-key";

fn window_filter(limit: usize) -> QueryFilter {
    QueryFilter::new(limit)
        .expect("valid limit")
        .with_naics("541512")
        .with_date_window(date!(2025 - 03 - 01), date!(2025 - 03 - 31))
        .expect("valid window")
}

fn address() -> AddressQuery {
    AddressQuery::one_line("4600 Silver Hill Rd, Washington, DC 20233").expect("valid address")
}

/// Runs one representative call against each adapter and returns how many
/// records came back per source.
async fn call_every_adapter(
    settings: impl Fn(&str) -> GatewaySettings,
    client: Arc<ScriptedHttpClient>,
    observer: Arc<RecordingObserver>,
) -> Vec<(SourceId, usize)> {
    let filter = window_filter(10);

    let sam = SamOpportunitiesAdapter::new(
        &settings(opportunities::DEFAULT_BASE_URL),
        Some(String::from(SAM_KEY)),
        client.clone(),
    )
    .with_observer(observer.clone());
    let geocoder = CensusGeocoderAdapter::new(&settings(geocoder::DEFAULT_BASE_URL), client.clone())
        .with_observer(observer.clone());
    let sbir = SbirAdapter::new(&settings(sbir::DEFAULT_BASE_URL), client.clone())
        .with_observer(observer.clone());
    let spending = UsaSpendingAdapter::new(&settings(spending::DEFAULT_BASE_URL), client)
        .with_observer(observer);

    vec![
        (SourceId::SamOpportunities, sam.search(&filter).await.len()),
        (
            SourceId::CensusGeocoder,
            usize::from(geocoder.geocode(&address()).await.is_some()),
        ),
        (
            SourceId::Sbir,
            sbir.fetch_page(&filter, PageCursor::first(10))
                .await
                .records
                .len(),
        ),
        (
            SourceId::UsaSpending,
            spending
                .fetch_page(&filter, PageCursor::first(10))
                .await
                .records
                .len(),
        ),
    ]
}

// =============================================================================
// Disabled sources
// =============================================================================

#[tokio::test]
async fn disabled_adapters_make_zero_transport_calls() {
    // Given: Every adapter disabled over a transport that would answer
    let client = Arc::new(ScriptedHttpClient::json("[]"));
    let observer = Arc::new(RecordingObserver::new());

    // When: Each adapter is called once
    let counts = call_every_adapter(
        |base| GatewaySettings::new(base, 0).disabled(),
        client.clone(),
        observer.clone(),
    )
    .await;

    // Then: Nothing reached the network and every call says why
    assert_eq!(client.call_count(), 0);
    assert!(counts.iter().all(|(_, count)| *count == 0));
    let events = observer.events();
    assert_eq!(events.len(), 4);
    assert!(events
        .iter()
        .all(|event| event.outcome == FetchOutcome::Disabled));
    assert!(observer.failures().is_empty());
}

// =============================================================================
// Failures never escape
// =============================================================================

#[tokio::test]
async fn transport_failure_yields_empty_results_and_one_failure_event_per_call() {
    let client = Arc::new(ScriptedHttpClient::failing());
    let observer = Arc::new(RecordingObserver::new());

    let counts = call_every_adapter(
        |base| GatewaySettings::new(base, 0),
        client.clone(),
        observer.clone(),
    )
    .await;

    assert_eq!(client.call_count(), 4);
    assert!(counts.iter().all(|(_, count)| *count == 0));

    let failures = observer.failures();
    let sources = failures.iter().map(|event| event.source).collect::<Vec<_>>();
    assert_eq!(sources, SourceId::ALL.to_vec());
    assert!(failures
        .iter()
        .all(|event| matches!(event.outcome, FetchOutcome::TransportFailure { .. })));
}

#[tokio::test]
async fn malformed_body_is_a_parse_failure_not_an_empty_match() {
    let client = Arc::new(ScriptedHttpClient::json("<html>maintenance</html>"));
    let observer = Arc::new(RecordingObserver::new());

    call_every_adapter(
        |base| GatewaySettings::new(base, 0),
        client,
        observer.clone(),
    )
    .await;

    let failures = observer.failures();
    assert_eq!(failures.len(), 4);
    assert!(failures
        .iter()
        .all(|event| matches!(event.outcome, FetchOutcome::ParseFailure { .. })));
}

#[tokio::test]
async fn sam_without_api_key_fails_fast_without_a_network_call() {
    let client = Arc::new(ScriptedHttpClient::json("{}"));
    let observer = Arc::new(RecordingObserver::new());
    let adapter = SamOpportunitiesAdapter::new(
        &GatewaySettings::new(opportunities::DEFAULT_BASE_URL, 0),
        None,
        client.clone(),
    )
    .with_observer(observer.clone());

    let results = adapter.search(&window_filter(10)).await;

    assert!(results.is_empty());
    assert_eq!(client.call_count(), 0);
    assert!(matches!(
        observer.failures()[0].outcome,
        FetchOutcome::InvalidFilter { .. }
    ));
}

// =============================================================================
// Request shape and idempotence
// =============================================================================

#[test]
fn sam_request_carries_key_window_and_filters() {
    let adapter = SamOpportunitiesAdapter::new(
        &GatewaySettings::new(opportunities::DEFAULT_BASE_URL, 0),
        Some(String::from(SAM_KEY)),
        Arc::new(ScriptedHttpClient::json("{}")),
    );
    let filter = window_filter(25).with_procurement_type("o");

    let request = adapter
        .build_request(&filter, PageCursor::first(25))
        .expect("complete filter");

    assert_eq!(request.method, HttpMethod::Get);
    assert_eq!(
        request.full_url(),
        "https://api.sam.gov/prod/opportunities/v2/search?api_key=test-key\
&postedFrom=03%2F01%2F2025&postedTo=03%2F31%2F2025&limit=25&ptype=o&ncode=541512"
    );
}

#[test]
fn geocoder_request_asks_for_all_layers_as_json() {
    let adapter = CensusGeocoderAdapter::new(
        &GatewaySettings::new(geocoder::DEFAULT_BASE_URL, 0),
        Arc::new(ScriptedHttpClient::json("{}")),
    );

    let request = adapter.build_request(&address());

    assert!(request
        .url
        .ends_with("/geographies/onelineaddress"));
    assert_eq!(request.query_value("benchmark"), Some(geocoder::DEFAULT_BENCHMARK));
    assert_eq!(request.query_value("vintage"), Some(geocoder::DEFAULT_VINTAGE));
    assert_eq!(request.query_value("layers"), Some("all"));
    assert_eq!(request.query_value("format"), Some("json"));
}

#[test]
fn usaspending_search_is_a_json_post() {
    let adapter = UsaSpendingAdapter::new(
        &GatewaySettings::new(spending::DEFAULT_BASE_URL, 0),
        Arc::new(ScriptedHttpClient::json("{}")),
    );

    let request = adapter
        .build_request(&window_filter(100), PageCursor::new(200, 100))
        .expect("window present");

    assert_eq!(request.method, HttpMethod::Post);
    assert!(request.url.ends_with("/search/spending_by_award/"));
    assert_eq!(
        request.headers.get("content-type").map(String::as_str),
        Some("application/json")
    );
    let body: serde_json::Value =
        serde_json::from_str(request.body.as_deref().expect("body present")).expect("json body");
    assert_eq!(body["page"], 3);
    assert_eq!(body["limit"], 100);
    assert_eq!(body["filters"]["naics_codes"][0], "541512");
    assert_eq!(body["filters"]["time_period"][0]["start_date"], "2025-03-01");
}

#[test]
fn same_filter_builds_byte_identical_requests() {
    let client = Arc::new(ScriptedHttpClient::json("{}"));
    let sam = SamOpportunitiesAdapter::new(
        &GatewaySettings::new(opportunities::DEFAULT_BASE_URL, 0),
        Some(String::from(SAM_KEY)),
        client.clone(),
    );
    let sbir = SbirAdapter::new(&GatewaySettings::new(sbir::DEFAULT_BASE_URL, 0), client.clone());
    let spending = UsaSpendingAdapter::new(
        &GatewaySettings::new(spending::DEFAULT_BASE_URL, 0),
        client,
    );
    let filter = window_filter(50).with_agency("DOD").with_year(2024);
    let cursor = PageCursor::new(50, 50);

    let sam_first = sam.build_request(&filter, cursor).expect("valid");
    let sam_second = sam.build_request(&filter.clone(), cursor).expect("valid");
    assert_eq!(sam_first.full_url(), sam_second.full_url());

    assert_eq!(
        sbir.build_request(&filter, cursor).full_url(),
        sbir.build_request(&filter, cursor).full_url()
    );
    assert_eq!(
        sbir.solicitations().build_request(&filter, cursor).full_url(),
        sbir.solicitations().build_request(&filter, cursor).full_url()
    );

    let spending_first = spending.build_request(&filter, cursor).expect("valid");
    let spending_second = spending.build_request(&filter, cursor).expect("valid");
    assert_eq!(spending_first, spending_second);
}
