//! Structured per-call outcomes.
//!
//! Adapters always hand back a (possibly empty) collection, so the return
//! value alone cannot tell "source down" from "nothing matched". Every adapter
//! call therefore also emits one [`FetchEvent`] to a [`FetchObserver`].

use std::fmt::{Display, Formatter};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, warn};

use crate::SourceId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FetchOutcome {
    Success,
    NoMatch,
    Disabled,
    InvalidFilter { reason: String },
    QuotaExhausted { retry_in_ms: u64 },
    TransportFailure { message: String },
    HttpStatus { status: u16 },
    ParseFailure { message: String },
}

impl FetchOutcome {
    /// True when the source could not answer, as opposed to answering "nothing".
    pub const fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidFilter { .. }
                | Self::QuotaExhausted { .. }
                | Self::TransportFailure { .. }
                | Self::HttpStatus { .. }
                | Self::ParseFailure { .. }
        )
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::Success => "fetch.success",
            Self::NoMatch => "fetch.no_match",
            Self::Disabled => "fetch.disabled",
            Self::InvalidFilter { .. } => "fetch.invalid_filter",
            Self::QuotaExhausted { .. } => "fetch.quota_exhausted",
            Self::TransportFailure { .. } => "fetch.transport_failure",
            Self::HttpStatus { .. } => "fetch.http_status",
            Self::ParseFailure { .. } => "fetch.parse_failure",
        }
    }
}

impl Display for FetchOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFilter { reason } => write!(f, "{}: {reason}", self.code()),
            Self::QuotaExhausted { retry_in_ms } => {
                write!(f, "{}: retry in {retry_in_ms}ms", self.code())
            }
            Self::TransportFailure { message } | Self::ParseFailure { message } => {
                write!(f, "{}: {message}", self.code())
            }
            Self::HttpStatus { status } => write!(f, "{}: {status}", self.code()),
            _ => f.write_str(self.code()),
        }
    }
}

/// One adapter call, as seen from outside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchEvent {
    pub source: SourceId,
    pub operation: &'static str,
    #[serde(flatten)]
    pub outcome: FetchOutcome,
    pub records: usize,
    pub elapsed_ms: u64,
}

pub trait FetchObserver: Send + Sync {
    fn observe(&self, event: &FetchEvent);
}

/// Default observer: failures at `warn`, everything else at `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl FetchObserver for TracingObserver {
    fn observe(&self, event: &FetchEvent) {
        if event.outcome.is_failure() {
            warn!(
                source = %event.source,
                operation = event.operation,
                elapsed_ms = event.elapsed_ms,
                "fetch failed: {}",
                event.outcome
            );
        } else {
            debug!(
                source = %event.source,
                operation = event.operation,
                records = event.records,
                elapsed_ms = event.elapsed_ms,
                outcome = event.outcome.code(),
                "fetch completed"
            );
        }
    }
}

/// Keeps every event in memory and forwards it to tracing.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<FetchEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<FetchEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn failures(&self) -> Vec<FetchEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.outcome.is_failure())
            .collect()
    }
}

impl FetchObserver for RecordingObserver {
    fn observe(&self, event: &FetchEvent) {
        TracingObserver.observe(event);
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
