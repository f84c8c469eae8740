use std::time::Duration;

use thiserror::Error;

use crate::http_client::HttpError;
use crate::outcome::FetchOutcome;
use crate::throttling::saturating_millis;

/// Validation errors raised when building filters, addresses, or config values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid source '{value}', expected one of sam, geocoder, sbir, usaspending")]
    InvalidSource { value: String },

    #[error("field '{field}' must be greater than zero")]
    ZeroValue { field: &'static str },
    #[error("field '{field}' must not be blank")]
    BlankValue { field: &'static str },

    #[error("date window is inverted: {from} is after {to}")]
    InvertedDateWindow { from: String, to: String },

    #[error("address components need at least one of street, city, or state")]
    EmptyAddress,
    #[error("coordinate {field}={value} is outside the valid range")]
    CoordinateOutOfRange { field: &'static str, value: String },
}

/// Errors raised while loading an ingestion config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Adapter-internal failure classification. Never escapes an adapter; it is
/// turned into a [`FetchOutcome`] and an empty result.
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("request quota exhausted; retry in {}ms", retry_in.as_millis())]
    QuotaExhausted { retry_in: Duration },

    #[error("transport error: {0}")]
    Transport(#[from] HttpError),

    #[error("upstream returned status {status}")]
    Status { status: u16 },

    #[error("unparseable response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unexpected response shape: {0}")]
    Shape(String),
}

impl FetchFailure {
    pub fn to_outcome(&self) -> FetchOutcome {
        match self {
            Self::InvalidFilter(reason) => FetchOutcome::InvalidFilter {
                reason: reason.clone(),
            },
            Self::QuotaExhausted { retry_in } => FetchOutcome::QuotaExhausted {
                retry_in_ms: saturating_millis(*retry_in),
            },
            Self::Transport(error) => FetchOutcome::TransportFailure {
                message: error.message().to_owned(),
            },
            Self::Status { status } => FetchOutcome::HttpStatus { status: *status },
            Self::Parse(error) => FetchOutcome::ParseFailure {
                message: error.to_string(),
            },
            Self::Shape(message) => FetchOutcome::ParseFailure {
                message: message.clone(),
            },
        }
    }
}
