//! One logical query fanned out over many filters.
//!
//! Each filter is one branch: a full [`PaginationDriver`] run against the same
//! source. Branches run one after another in filter order, each inside its own
//! spawned task so a panicking branch is contained. A branch never removes
//! anything another branch contributed.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::pagination::{PagedSource, PaginationDriver, StopReason};
use crate::query::QueryFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "branch_outcome", content = "stop", rename_all = "snake_case")]
pub enum BranchOutcome {
    Completed(StopReason),
    /// The branch task panicked or was cancelled; it contributed nothing.
    Aborted,
}

impl BranchOutcome {
    pub const fn is_failure(self) -> bool {
        matches!(
            self,
            Self::Aborted | Self::Completed(StopReason::SourceFailed)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchReport {
    pub index: usize,
    pub label: String,
    pub records: usize,
    pub pages_requested: usize,
    pub outcome: BranchOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FanOutResult<R> {
    pub records: Vec<R>,
    pub branches: Vec<BranchReport>,
}

#[derive(Debug, Clone, Copy)]
pub struct FanOutOrchestrator {
    driver: PaginationDriver,
}

impl FanOutOrchestrator {
    pub const fn new(driver: PaginationDriver) -> Self {
        Self { driver }
    }

    pub const fn driver(&self) -> PaginationDriver {
        self.driver
    }

    /// Concatenation of every branch's records, in filter order.
    pub async fn fetch_all<S>(&self, source: Arc<S>, filters: Vec<QueryFilter>) -> Vec<S::Record>
    where
        S: PagedSource + 'static,
    {
        self.fetch_all_reported(source, filters).await.records
    }

    /// Like [`fetch_all`](Self::fetch_all), plus one report per branch.
    pub async fn fetch_all_reported<S>(
        &self,
        source: Arc<S>,
        filters: Vec<QueryFilter>,
    ) -> FanOutResult<S::Record>
    where
        S: PagedSource + 'static,
    {
        let source_id = source.id();
        let mut records = Vec::new();
        let mut branches = Vec::with_capacity(filters.len());

        for (index, filter) in filters.into_iter().enumerate() {
            let label = branch_label(&filter);
            let branch_source = Arc::clone(&source);
            let driver = self.driver;
            let mut branch = BranchTask(tokio::spawn(async move {
                driver.drive(branch_source.as_ref(), &filter).await
            }));

            let report = match (&mut branch.0).await {
                Ok(result) => {
                    let report = BranchReport {
                        index,
                        label,
                        records: result.records.len(),
                        pages_requested: result.pages_requested,
                        outcome: BranchOutcome::Completed(result.stop),
                    };
                    records.extend(result.records);
                    report
                }
                Err(error) => {
                    warn!(
                        source = %source_id,
                        branch = index,
                        label = %label,
                        panicked = error.is_panic(),
                        "fan-out branch aborted; contributing no records"
                    );
                    BranchReport {
                        index,
                        label,
                        records: 0,
                        pages_requested: 0,
                        outcome: BranchOutcome::Aborted,
                    }
                }
            };

            if report.outcome == BranchOutcome::Completed(StopReason::SourceFailed) {
                warn!(
                    source = %source_id,
                    branch = index,
                    label = %report.label,
                    records = report.records,
                    "fan-out branch stopped on a failed page"
                );
            } else {
                info!(
                    source = %source_id,
                    branch = index,
                    label = %report.label,
                    records = report.records,
                    pages = report.pages_requested,
                    "fan-out branch finished"
                );
            }
            branches.push(report);
        }

        info!(
            source = %source_id,
            branches = branches.len(),
            failed = branches.iter().filter(|branch| branch.outcome.is_failure()).count(),
            records = records.len(),
            "fan-out finished"
        );
        FanOutResult { records, branches }
    }
}

/// Aborts the branch task if the fan-out future is dropped mid-branch.
struct BranchTask<T>(JoinHandle<T>);

impl<T> Drop for BranchTask<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Short human label for logs and reports, e.g. `naics=541512`.
fn branch_label(filter: &QueryFilter) -> String {
    let parts = [
        ("naics", filter.naics_code.as_deref()),
        ("agency", filter.agency.as_deref()),
        ("keyword", filter.keyword.as_deref()),
        ("firm", filter.firm.as_deref()),
    ];
    let label = parts
        .iter()
        .filter_map(|(name, value)| value.map(|value| format!("{name}={value}")))
        .collect::<Vec<_>>()
        .join(",");
    if label.is_empty() {
        String::from("all")
    } else {
        label
    }
}
