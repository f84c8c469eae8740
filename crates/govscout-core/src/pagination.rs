//! Multi-page fetch driver.
//!
//! [`PaginationDriver::drive`] repeatedly asks a [`PagedSource`] for the page
//! at the current [`PageCursor`], accumulating records until one of the stop
//! conditions in [`StopReason`] fires. Every page goes through the source's own
//! `fetch_page`, and therefore through that source's rate limiter.
//!
//! # Cap policy
//!
//! The driver never returns more than the effective cap
//! (`min(max_results, filter.limit)`). Pages are always requested at the full
//! configured page size so page-number sources stay aligned; the page that
//! crosses the cap is truncated and no further page is requested.

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use tracing::debug;

use crate::query::{PageCursor, QueryFilter};
use crate::{SourceId, ValidationError};

/// Adapter verdict on whether another page may exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    More,
    Exhausted,
    /// The call failed; the page is empty and nothing further should be requested.
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    pub records: Vec<R>,
    pub status: PageStatus,
    /// Rows the upstream sent, counted before unusable rows were dropped.
    /// The driver's empty and short page checks use this, not `records`.
    pub upstream_rows: usize,
}

impl<R> Page<R> {
    pub fn new(records: Vec<R>, status: PageStatus) -> Self {
        Self {
            upstream_rows: records.len(),
            records,
            status,
        }
    }

    pub fn more(records: Vec<R>) -> Self {
        Self::new(records, PageStatus::More)
    }

    pub fn exhausted(records: Vec<R>) -> Self {
        Self::new(records, PageStatus::Exhausted)
    }

    pub fn failed() -> Self {
        Self::new(Vec::new(), PageStatus::Failed)
    }

    pub fn with_upstream_rows(mut self, upstream_rows: usize) -> Self {
        self.upstream_rows = upstream_rows;
        self
    }

    pub fn empty() -> Self {
        Self::exhausted(Vec::new())
    }
}

/// A source that can be read one page at a time.
///
/// Implementations never return errors: failures become [`Page::failed`]
/// and are reported through the adapter's fetch observer.
pub trait PagedSource: Send + Sync {
    type Record: Send + 'static;

    fn id(&self) -> SourceId;

    /// Disabled sources are skipped by the driver without any page request.
    fn is_enabled(&self) -> bool;

    fn fetch_page<'a>(
        &'a self,
        filter: &'a QueryFilter,
        cursor: PageCursor,
    ) -> Pin<Box<dyn Future<Output = Page<Self::Record>> + Send + 'a>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationConfig {
    pub page_size: usize,
    pub max_results: usize,
}

impl PaginationConfig {
    pub fn new(page_size: usize, max_results: usize) -> Result<Self, ValidationError> {
        if page_size == 0 {
            return Err(ValidationError::ZeroValue { field: "page_size" });
        }
        if max_results == 0 {
            return Err(ValidationError::ZeroValue {
                field: "max_results",
            });
        }
        Ok(Self {
            page_size,
            max_results,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Disabled,
    EmptyPage,
    ShortPage,
    CapReached,
    SourceExhausted,
    SourceFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DriveResult<R> {
    pub records: Vec<R>,
    pub pages_requested: usize,
    pub stop: StopReason,
}

#[derive(Debug, Clone, Copy)]
pub struct PaginationDriver {
    config: PaginationConfig,
}

impl PaginationDriver {
    pub const fn new(config: PaginationConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> PaginationConfig {
        self.config
    }

    /// Drives `source` from offset zero until a stop condition fires.
    ///
    /// A failed page ends the fetch but keeps what earlier pages returned.
    pub async fn drive<S>(&self, source: &S, filter: &QueryFilter) -> DriveResult<S::Record>
    where
        S: PagedSource + ?Sized,
    {
        let source_id = source.id();
        if !source.is_enabled() {
            debug!(source = %source_id, "source disabled; skipping pagination");
            return DriveResult {
                records: Vec::new(),
                pages_requested: 0,
                stop: StopReason::Disabled,
            };
        }

        let cap = self.config.max_results.min(filter.limit);
        let mut cursor = PageCursor::first(self.config.page_size);
        let mut records = Vec::new();
        let mut pages_requested = 0;

        loop {
            let requested = cursor.page_size;
            let page = source.fetch_page(filter, cursor).await;
            pages_requested += 1;

            let returned = page.upstream_rows;
            let remaining = cap.saturating_sub(records.len());
            records.extend(page.records.into_iter().take(remaining));

            debug!(
                source = %source_id,
                offset = cursor.offset,
                requested,
                returned,
                accumulated = records.len(),
                "page fetched"
            );

            let stop = match page.status {
                PageStatus::Failed => Some(StopReason::SourceFailed),
                _ if returned == 0 => Some(StopReason::EmptyPage),
                _ if returned < requested => Some(StopReason::ShortPage),
                _ if records.len() >= cap => Some(StopReason::CapReached),
                PageStatus::Exhausted => Some(StopReason::SourceExhausted),
                PageStatus::More => None,
            };

            if let Some(stop) = stop {
                debug!(
                    source = %source_id,
                    pages_requested,
                    records = records.len(),
                    stop = ?stop,
                    "pagination finished"
                );
                return DriveResult {
                    records,
                    pages_requested,
                    stop,
                };
            }

            cursor = cursor.advanced_by(requested);
        }
    }
}
