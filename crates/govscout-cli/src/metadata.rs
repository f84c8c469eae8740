use std::fmt::{Display, Formatter};

use govscout_core::SourceId;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// Request identifier (UUID v4), one per CLI invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Run metadata printed alongside every result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub request_id: RequestId,
    pub command: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
    /// Sources that saw at least one call.
    pub sources: Vec<SourceId>,
    pub latency_ms: u64,
    pub failure_count: usize,
}

impl Metadata {
    pub fn new(command: &'static str) -> Self {
        Self {
            request_id: RequestId::new_v4(),
            command,
            generated_at: OffsetDateTime::now_utc(),
            sources: Vec::new(),
            latency_ms: 0,
            failure_count: 0,
        }
    }
}
