//! TOML ingestion config.
//!
//! ```toml
//! [sam]
//! rate_limit_ms = 1000
//! naics_codes = ["541512", "541511"]
//!
//! [sbir]
//! agencies = ["DOD", "NASA"]
//!
//! [spending]
//! enabled = false
//! ```
//!
//! Every field has a default, so an empty file (or no file) is a valid config.

use std::path::Path;

use serde::Deserialize;

use crate::adapters::{geocoder, opportunities, sbir, spending, GatewaySettings};
use crate::adapters::DEFAULT_REQUEST_TIMEOUT_MS;
use crate::error::ConfigError;

pub const SAM_API_KEY_ENV_VARS: [&str; 2] = ["GOVSCOUT_SAM_API_KEY", "SAM_API_KEY"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IngestConfig {
    #[serde(default)]
    pub sam: SamConfig,
    #[serde(default)]
    pub geocoder: GeocoderConfig,
    #[serde(default)]
    pub sbir: SbirConfig,
    #[serde(default)]
    pub spending: SpendingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SamConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_sam_rate_limit_ms")]
    pub rate_limit_ms: u64,
    #[serde(default = "default_sam_base_url")]
    pub base_url: String,
    /// Falls back to `GOVSCOUT_SAM_API_KEY`, then `SAM_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_sam_limit")]
    pub limit: usize,
    #[serde(default = "default_sam_lookback_days")]
    pub lookback_days: u32,
    #[serde(default)]
    pub naics_codes: Vec<String>,
    #[serde(default = "default_procurement_type")]
    pub procurement_type: String,
    #[serde(default)]
    pub set_aside: Option<String>,
    #[serde(default)]
    pub daily_quota: Option<u32>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeocoderConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_geocoder_rate_limit_ms")]
    pub rate_limit_ms: u64,
    #[serde(default = "default_geocoder_base_url")]
    pub base_url: String,
    #[serde(default = "default_benchmark")]
    pub benchmark: String,
    #[serde(default = "default_vintage")]
    pub vintage: String,
    #[serde(default)]
    pub daily_quota: Option<u32>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SbirConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_sbir_rate_limit_ms")]
    pub rate_limit_ms: u64,
    #[serde(default = "default_sbir_base_url")]
    pub base_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_sbir_max_results")]
    pub max_results: usize,
    #[serde(default)]
    pub agencies: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub daily_quota: Option<u32>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpendingConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_spending_rate_limit_ms")]
    pub rate_limit_ms: u64,
    #[serde(default = "default_spending_base_url")]
    pub base_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_spending_max_results")]
    pub max_results: usize,
    #[serde(default = "default_spending_lookback_days")]
    pub lookback_days: u32,
    #[serde(default)]
    pub naics_codes: Vec<String>,
    #[serde(default)]
    pub agency: Option<String>,
    #[serde(default)]
    pub award_type_codes: Vec<String>,
    #[serde(default)]
    pub daily_quota: Option<u32>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_enabled() -> bool {
    true
}
fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}
fn default_page_size() -> usize {
    100
}

fn default_sam_rate_limit_ms() -> u64 {
    1_000
}
fn default_sam_base_url() -> String {
    opportunities::DEFAULT_BASE_URL.to_string()
}
fn default_sam_limit() -> usize {
    100
}
fn default_sam_lookback_days() -> u32 {
    30
}
fn default_procurement_type() -> String {
    "o".to_string()
}

fn default_geocoder_rate_limit_ms() -> u64 {
    200
}
fn default_geocoder_base_url() -> String {
    geocoder::DEFAULT_BASE_URL.to_string()
}
fn default_benchmark() -> String {
    geocoder::DEFAULT_BENCHMARK.to_string()
}
fn default_vintage() -> String {
    geocoder::DEFAULT_VINTAGE.to_string()
}

fn default_sbir_rate_limit_ms() -> u64 {
    1_000
}
fn default_sbir_base_url() -> String {
    sbir::DEFAULT_BASE_URL.to_string()
}
fn default_sbir_max_results() -> usize {
    1_000
}

fn default_spending_rate_limit_ms() -> u64 {
    500
}
fn default_spending_base_url() -> String {
    spending::DEFAULT_BASE_URL.to_string()
}
fn default_spending_max_results() -> usize {
    500
}
fn default_spending_lookback_days() -> u32 {
    365
}

impl Default for SamConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            rate_limit_ms: default_sam_rate_limit_ms(),
            base_url: default_sam_base_url(),
            api_key: None,
            limit: default_sam_limit(),
            lookback_days: default_sam_lookback_days(),
            naics_codes: Vec::new(),
            procurement_type: default_procurement_type(),
            set_aside: None,
            daily_quota: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            rate_limit_ms: default_geocoder_rate_limit_ms(),
            base_url: default_geocoder_base_url(),
            benchmark: default_benchmark(),
            vintage: default_vintage(),
            daily_quota: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for SbirConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            rate_limit_ms: default_sbir_rate_limit_ms(),
            base_url: default_sbir_base_url(),
            page_size: default_page_size(),
            max_results: default_sbir_max_results(),
            agencies: Vec::new(),
            keywords: Vec::new(),
            year: None,
            daily_quota: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for SpendingConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            rate_limit_ms: default_spending_rate_limit_ms(),
            base_url: default_spending_base_url(),
            page_size: default_page_size(),
            max_results: default_spending_max_results(),
            lookback_days: default_spending_lookback_days(),
            naics_codes: Vec::new(),
            agency: None,
            award_type_codes: Vec::new(),
            daily_quota: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl SamConfig {
    pub fn gateway_settings(&self) -> GatewaySettings {
        gateway_settings(
            self.enabled,
            &self.base_url,
            self.rate_limit_ms,
            self.daily_quota,
            self.request_timeout_ms,
        )
    }

    /// Config value first, then the environment.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    pub fn resolve_api_key_with<F>(&self, lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                SAM_API_KEY_ENV_VARS
                    .iter()
                    .filter_map(|name| lookup(name))
                    .find(|key| !key.trim().is_empty())
            })
    }
}

impl GeocoderConfig {
    pub fn gateway_settings(&self) -> GatewaySettings {
        gateway_settings(
            self.enabled,
            &self.base_url,
            self.rate_limit_ms,
            self.daily_quota,
            self.request_timeout_ms,
        )
    }
}

impl SbirConfig {
    pub fn gateway_settings(&self) -> GatewaySettings {
        gateway_settings(
            self.enabled,
            &self.base_url,
            self.rate_limit_ms,
            self.daily_quota,
            self.request_timeout_ms,
        )
    }
}

impl SpendingConfig {
    pub fn gateway_settings(&self) -> GatewaySettings {
        gateway_settings(
            self.enabled,
            &self.base_url,
            self.rate_limit_ms,
            self.daily_quota,
            self.request_timeout_ms,
        )
    }
}

fn gateway_settings(
    enabled: bool,
    base_url: &str,
    rate_limit_ms: u64,
    daily_quota: Option<u32>,
    request_timeout_ms: u64,
) -> GatewaySettings {
    GatewaySettings {
        enabled,
        base_url: base_url.to_owned(),
        rate_limit_ms,
        daily_quota,
        request_timeout_ms,
    }
}

impl IngestConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_base_url("sam.base_url", &self.sam.base_url)?;
        check_base_url("geocoder.base_url", &self.geocoder.base_url)?;
        check_base_url("sbir.base_url", &self.sbir.base_url)?;
        check_base_url("spending.base_url", &self.spending.base_url)?;

        if self.sam.limit == 0 || self.sam.limit > opportunities::MAX_PAGE_LIMIT {
            return Err(ConfigError::invalid(
                "sam.limit",
                format!("must be between 1 and {}", opportunities::MAX_PAGE_LIMIT),
            ));
        }
        check_positive("sbir.page_size", self.sbir.page_size)?;
        check_positive("sbir.max_results", self.sbir.max_results)?;
        if self.spending.page_size == 0 || self.spending.page_size > spending::MAX_PAGE_LIMIT {
            return Err(ConfigError::invalid(
                "spending.page_size",
                format!("must be between 1 and {}", spending::MAX_PAGE_LIMIT),
            ));
        }
        check_positive("spending.max_results", self.spending.max_results)?;

        for (field, quota) in [
            ("sam.daily_quota", self.sam.daily_quota),
            ("geocoder.daily_quota", self.geocoder.daily_quota),
            ("sbir.daily_quota", self.sbir.daily_quota),
            ("spending.daily_quota", self.spending.daily_quota),
        ] {
            if quota == Some(0) {
                return Err(ConfigError::invalid(field, "must be > 0 when set"));
            }
        }

        for (field, timeout_ms) in [
            ("sam.request_timeout_ms", self.sam.request_timeout_ms),
            ("geocoder.request_timeout_ms", self.geocoder.request_timeout_ms),
            ("sbir.request_timeout_ms", self.sbir.request_timeout_ms),
            ("spending.request_timeout_ms", self.spending.request_timeout_ms),
        ] {
            if timeout_ms == 0 {
                return Err(ConfigError::invalid(field, "must be > 0"));
            }
        }

        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<IngestConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    IngestConfig::from_toml_str(&content)
}

fn check_base_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::invalid(field, "must not be empty"));
    }
    if !(value.starts_with("https://") || value.starts_with("http://")) {
        return Err(ConfigError::invalid(field, "must be an http(s) URL"));
    }
    Ok(())
}

fn check_positive(field: &str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::invalid(field, "must be > 0"));
    }
    Ok(())
}
