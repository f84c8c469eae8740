//! Shared fakes for the workspace-level behavior tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};

use govscout_core::{
    HttpClient, HttpError, HttpRequest, HttpResponse, Page, PageCursor, PageStatus, PagedSource,
    QueryFilter, SourceId,
};
use serde_json::{json, Value};
use tokio::time::Instant;

/// One transport call as the fake saw it.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub request: HttpRequest,
    pub at: Instant,
}

/// Replays scripted responses in order, then answers with the fallback.
/// Every request is kept with its arrival time on the tokio clock.
#[derive(Debug)]
pub struct ScriptedHttpClient {
    script: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    fallback: Result<HttpResponse, HttpError>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedHttpClient {
    pub fn json(body: impl Into<String>) -> Self {
        Self::scripted(Vec::new(), Ok(HttpResponse::ok_json(body)))
    }

    pub fn failing() -> Self {
        Self::scripted(Vec::new(), Err(HttpError::new("connection refused")))
    }

    pub fn scripted(
        script: Vec<Result<HttpResponse, HttpError>>,
        fallback: Result<HttpResponse, HttpError>,
    ) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.calls().into_iter().map(|call| call.request).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                request,
                at: Instant::now(),
            });
        let response = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        Box::pin(async move { response })
    }
}

/// SBIR.gov award rows with ids `prefix-start` onwards.
pub fn sbir_award_rows(prefix: &str, start: usize, count: usize) -> String {
    let rows = (start..start + count)
        .map(|index| {
            json!({
                "contract": format!("{prefix}-{index}"),
                "award_title": "Autonomous sensing",
                "firm": "Acme Research LLC",
                "agency": "DOD",
                "award_amount": "149999.00",
                "proposal_award_date": "2024-06-01",
            })
        })
        .collect::<Vec<_>>();
    Value::Array(rows).to_string()
}

/// One USAspending `spending_by_award` page.
pub fn spending_page(prefix: &str, count: usize, has_next: bool) -> String {
    let results = (0..count)
        .map(|index| {
            json!({
                "Award ID": format!("{prefix}-{index}"),
                "Recipient Name": "Acme Federal Inc",
                "Award Amount": 250000.0,
                "Awarding Agency": "Department of Defense",
                "Start Date": "2024-02-15",
                "NAICS": {"code": "541512", "description": "Computer Systems Design Services"},
            })
        })
        .collect::<Vec<_>>();
    json!({
        "results": results,
        "page_metadata": {"page": 1, "hasNext": has_next},
    })
    .to_string()
}

/// What a [`FakeSource`] does for one page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Rows(usize, PageStatus),
    Fail,
    Panic,
}

/// Paged source scripted per NAICS code; a `None` key covers every filter
/// without a matching script. Records are `"{naics}:{offset}"` strings.
pub struct FakeSource {
    scripts: Vec<(Option<String>, Vec<Step>)>,
    requests: Mutex<Vec<(Option<String>, PageCursor)>>,
    enabled: bool,
}

impl FakeSource {
    pub fn new(steps: Vec<Step>) -> Self {
        Self::per_naics(vec![(None, steps)])
    }

    pub fn per_naics(scripts: Vec<(Option<&str>, Vec<Step>)>) -> Self {
        Self {
            scripts: scripts
                .into_iter()
                .map(|(naics, steps)| (naics.map(str::to_owned), steps))
                .collect(),
            requests: Mutex::new(Vec::new()),
            enabled: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn requests(&self) -> Vec<(Option<String>, PageCursor)> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn steps_for(&self, naics: &Option<String>) -> &[Step] {
        self.scripts
            .iter()
            .find(|(key, _)| key == naics)
            .or_else(|| self.scripts.iter().find(|(key, _)| key.is_none()))
            .map(|(_, steps)| steps.as_slice())
            .unwrap_or_default()
    }
}

impl PagedSource for FakeSource {
    type Record = String;

    fn id(&self) -> SourceId {
        SourceId::UsaSpending
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn fetch_page<'a>(
        &'a self,
        filter: &'a QueryFilter,
        cursor: PageCursor,
    ) -> Pin<Box<dyn Future<Output = Page<String>> + Send + 'a>> {
        Box::pin(async move {
            let naics = filter.naics_code.clone();
            let index = {
                let mut requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
                let index = requests.iter().filter(|(key, _)| *key == naics).count();
                requests.push((naics.clone(), cursor));
                index
            };

            let step = self
                .steps_for(&naics)
                .get(index)
                .copied()
                .unwrap_or(Step::Rows(0, PageStatus::Exhausted));
            let label = naics.as_deref().unwrap_or("all");

            match step {
                Step::Rows(count, status) => Page::new(
                    (cursor.offset..cursor.offset + count)
                        .map(|offset| format!("{label}:{offset}"))
                        .collect(),
                    status,
                ),
                Step::Fail => Page::failed(),
                Step::Panic => panic!("scripted panic for {label}"),
            }
        })
    }
}

pub fn filter(limit: usize) -> QueryFilter {
    QueryFilter::new(limit).expect("limit is positive")
}

pub fn naics_filter(limit: usize, naics: &str) -> QueryFilter {
    filter(limit).with_naics(naics)
}
