//! Behavior tests for multi-page fetches.
//!
//! These tests verify when the pagination driver stops asking for pages and
//! what it hands back, against both a scripted source and real adapters over
//! a scripted transport.

mod support;

use std::sync::Arc;

use govscout_core::{
    GatewaySettings, HttpError, HttpResponse, PageStatus, PaginationConfig, PaginationDriver,
    QueryFilter, RecordingObserver, SbirAdapter, StopReason, UsaSpendingAdapter,
};
use support::{filter, sbir_award_rows, spending_page, FakeSource, ScriptedHttpClient, Step};
use time::macros::date;

fn driver(page_size: usize, max_results: usize) -> PaginationDriver {
    PaginationDriver::new(PaginationConfig::new(page_size, max_results).expect("valid config"))
}

// =============================================================================
// Stop conditions
// =============================================================================

#[tokio::test]
async fn when_last_page_is_short_driver_returns_everything_after_three_requests() {
    // Given: A source holding 247 records behind pages of 100
    let source = FakeSource::new(vec![
        Step::Rows(100, PageStatus::More),
        Step::Rows(100, PageStatus::More),
        Step::Rows(47, PageStatus::More),
    ]);

    // When: The driver fetches with a generous cap
    let result = driver(100, 1_000).drive(&source, &filter(1_000)).await;

    // Then: All 247 records arrive and the short page ends the fetch
    assert_eq!(result.records.len(), 247);
    assert_eq!(result.pages_requested, 3);
    assert_eq!(result.stop, StopReason::ShortPage);
    assert_eq!(source.request_count(), 3);

    let offsets = source
        .requests()
        .iter()
        .map(|(_, cursor)| cursor.offset)
        .collect::<Vec<_>>();
    assert_eq!(offsets, vec![0, 100, 200]);
}

#[tokio::test]
async fn when_cap_falls_inside_a_page_driver_returns_exactly_the_cap() {
    // Given: An endless source and a cap of 150
    let source = FakeSource::new(vec![Step::Rows(100, PageStatus::More); 10]);

    // When: The driver fetches
    let result = driver(100, 150).drive(&source, &filter(1_000)).await;

    // Then: Two requests are made and the second page is trimmed
    assert_eq!(result.pages_requested, 2);
    assert_eq!(result.records.len(), 150);
    assert_eq!(result.stop, StopReason::CapReached);
    assert_eq!(result.records.last().map(String::as_str), Some("all:149"));
}

#[tokio::test]
async fn when_filter_limit_is_smaller_than_max_results_filter_limit_wins() {
    let source = FakeSource::new(vec![Step::Rows(100, PageStatus::More); 10]);

    let result = driver(100, 1_000).drive(&source, &filter(120)).await;

    assert_eq!(result.records.len(), 120);
    assert_eq!(result.pages_requested, 2);
    assert_eq!(result.stop, StopReason::CapReached);
}

#[tokio::test]
async fn when_a_later_page_fails_driver_keeps_earlier_records() {
    // Given: A source whose second page fails
    let source = FakeSource::new(vec![Step::Rows(100, PageStatus::More), Step::Fail]);

    // When: The driver fetches
    let result = driver(100, 1_000).drive(&source, &filter(1_000)).await;

    // Then: The first page survives and no third request is made
    assert_eq!(result.records.len(), 100);
    assert_eq!(result.pages_requested, 2);
    assert_eq!(result.stop, StopReason::SourceFailed);
}

#[tokio::test]
async fn when_a_page_comes_back_empty_driver_stops() {
    let source = FakeSource::new(vec![
        Step::Rows(100, PageStatus::More),
        Step::Rows(0, PageStatus::More),
        Step::Rows(100, PageStatus::More),
    ]);

    let result = driver(100, 1_000).drive(&source, &filter(1_000)).await;

    assert_eq!(result.records.len(), 100);
    assert_eq!(result.pages_requested, 2);
    assert_eq!(result.stop, StopReason::EmptyPage);
}

#[tokio::test]
async fn when_source_reports_exhaustion_on_a_full_page_driver_stops() {
    let source = FakeSource::new(vec![
        Step::Rows(100, PageStatus::Exhausted),
        Step::Rows(100, PageStatus::More),
    ]);

    let result = driver(100, 1_000).drive(&source, &filter(1_000)).await;

    assert_eq!(result.records.len(), 100);
    assert_eq!(result.pages_requested, 1);
    assert_eq!(result.stop, StopReason::SourceExhausted);
}

#[tokio::test]
async fn when_source_is_disabled_driver_makes_no_requests() {
    let source = FakeSource::new(vec![Step::Rows(100, PageStatus::More)]).disabled();

    let result = driver(100, 1_000).drive(&source, &filter(1_000)).await;

    assert!(result.records.is_empty());
    assert_eq!(result.pages_requested, 0);
    assert_eq!(result.stop, StopReason::Disabled);
    assert_eq!(source.request_count(), 0);
}

// =============================================================================
// Real adapters over a scripted transport
// =============================================================================

#[tokio::test]
async fn sbir_awards_page_by_start_offset() {
    // Given: SBIR.gov serving 100, 100, then 47 rows
    let client = Arc::new(ScriptedHttpClient::scripted(
        vec![
            Ok(HttpResponse::ok_json(sbir_award_rows("SB", 0, 100))),
            Ok(HttpResponse::ok_json(sbir_award_rows("SB", 100, 100))),
            Ok(HttpResponse::ok_json(sbir_award_rows("SB", 200, 47))),
        ],
        Ok(HttpResponse::ok_json("[]")),
    ));
    let adapter = SbirAdapter::new(
        &GatewaySettings::new("https://sbir.example.test/api", 0),
        client.clone(),
    );

    // When: Awards for one agency are driven to completion
    let filter = filter(1_000).with_agency("DOD");
    let result = driver(100, 1_000).drive(&adapter, &filter).await;

    // Then: Every row is normalized and each request moved the offset
    assert_eq!(result.records.len(), 247);
    assert_eq!(result.stop, StopReason::ShortPage);
    assert_eq!(result.records[246].award_id, "SB-246");

    let starts = client
        .requests()
        .iter()
        .map(|request| request.query_value("start").map(str::to_owned))
        .collect::<Vec<_>>();
    assert_eq!(
        starts,
        vec![
            Some(String::from("0")),
            Some(String::from("100")),
            Some(String::from("200"))
        ]
    );
    assert!(client
        .requests()
        .iter()
        .all(|request| request.query_value("rows") == Some("100")));
}

#[tokio::test]
async fn unusable_row_on_a_full_sbir_page_does_not_end_pagination() {
    // Given: A first page of 100 rows where one row has no award id
    let mut first_page: serde_json::Value =
        serde_json::from_str(&sbir_award_rows("SB", 0, 100)).expect("rows are json");
    first_page[5]
        .as_object_mut()
        .expect("row is an object")
        .remove("contract");
    let client = Arc::new(ScriptedHttpClient::scripted(
        vec![
            Ok(HttpResponse::ok_json(first_page.to_string())),
            Ok(HttpResponse::ok_json(sbir_award_rows("SB", 100, 100))),
            Ok(HttpResponse::ok_json(sbir_award_rows("SB", 200, 47))),
        ],
        Ok(HttpResponse::ok_json("[]")),
    ));
    let adapter = SbirAdapter::new(
        &GatewaySettings::new("https://sbir.example.test/api", 0),
        client.clone(),
    );

    // When: Awards are driven to completion
    let result = driver(100, 1_000)
        .drive(&adapter, &filter(1_000).with_agency("DOD"))
        .await;

    // Then: Only the unusable row is missing and every page was requested
    assert_eq!(result.records.len(), 246);
    assert_eq!(result.pages_requested, 3);
    assert_eq!(result.stop, StopReason::ShortPage);
    assert_eq!(client.call_count(), 3);
    assert!(result.records.iter().all(|award| award.award_id != "SB-5"));
}

#[tokio::test]
async fn usaspending_pages_by_page_number_until_has_next_is_false() {
    let client = Arc::new(ScriptedHttpClient::scripted(
        vec![
            Ok(HttpResponse::ok_json(spending_page("P1", 50, true))),
            Ok(HttpResponse::ok_json(spending_page("P2", 50, false))),
        ],
        Ok(HttpResponse::ok_json(spending_page("P3", 50, true))),
    ));
    let adapter = UsaSpendingAdapter::new(
        &GatewaySettings::new("https://spending.example.test/api/v2", 0),
        client.clone(),
    );
    let filter = QueryFilter::new(500)
        .expect("valid limit")
        .with_naics("541512")
        .with_date_window(date!(2024 - 01 - 01), date!(2024 - 12 - 31))
        .expect("valid window");

    let result = driver(50, 500).drive(&adapter, &filter).await;

    assert_eq!(result.records.len(), 100);
    assert_eq!(result.pages_requested, 2);
    assert_eq!(result.stop, StopReason::SourceExhausted);

    let pages = client
        .requests()
        .iter()
        .map(|request| {
            let body: serde_json::Value = serde_json::from_str(
                request.body.as_deref().expect("search is a POST with a body"),
            )
            .expect("body is json");
            body["page"].as_u64()
        })
        .collect::<Vec<_>>();
    assert_eq!(pages, vec![Some(1), Some(2)]);
}

#[tokio::test]
async fn transport_failure_mid_fetch_keeps_partial_results_and_is_observed() {
    // Given: The second SBIR page fails at the transport
    let client = Arc::new(ScriptedHttpClient::scripted(
        vec![
            Ok(HttpResponse::ok_json(sbir_award_rows("SB", 0, 100))),
            Err(HttpError::timeout("read timed out")),
        ],
        Ok(HttpResponse::ok_json(sbir_award_rows("SB", 200, 100))),
    ));
    let observer = Arc::new(RecordingObserver::new());
    let adapter = SbirAdapter::new(
        &GatewaySettings::new("https://sbir.example.test/api", 0),
        client.clone(),
    )
    .with_observer(observer.clone());

    // When: The driver fetches
    let result = driver(100, 1_000).drive(&adapter, &filter(1_000)).await;

    // Then: Page one survives, the failure is visible, and nothing more is asked
    assert_eq!(result.records.len(), 100);
    assert_eq!(result.stop, StopReason::SourceFailed);
    assert_eq!(client.call_count(), 2);
    assert_eq!(observer.failures().len(), 1);
}
