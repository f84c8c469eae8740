use std::sync::Arc;

use serde_json::{Map, Value};

use crate::adapters::gateway::{GatewaySettings, SourceGateway};
use crate::domain::parse::text_field;
use crate::domain::GeocodeResult;
use crate::error::FetchFailure;
use crate::http_client::{HttpClient, HttpRequest};
use crate::outcome::FetchObserver;
use crate::query::AddressQuery;
use crate::throttling::RateLimiter;
use crate::SourceId;

pub const DEFAULT_BASE_URL: &str = "https://geocoding.geo.census.gov/geocoder";
pub const DEFAULT_BENCHMARK: &str = "Public_AR_Current";
pub const DEFAULT_VINTAGE: &str = "Current_Current";

/// Census Bureau geocoder, geographies flavour.
#[derive(Debug, Clone)]
pub struct CensusGeocoderAdapter {
    gateway: SourceGateway,
    benchmark: String,
    vintage: String,
}

impl CensusGeocoderAdapter {
    pub fn new(settings: &GatewaySettings, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            gateway: SourceGateway::new(SourceId::CensusGeocoder, settings, http_client),
            benchmark: String::from(DEFAULT_BENCHMARK),
            vintage: String::from(DEFAULT_VINTAGE),
        }
    }

    pub fn with_benchmark(mut self, benchmark: impl Into<String>, vintage: impl Into<String>) -> Self {
        self.benchmark = benchmark.into();
        self.vintage = vintage.into();
        self
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

    pub fn is_enabled(&self) -> bool {
        self.gateway.is_enabled()
    }

    /// Component mode sends only the parts that are present.
    pub fn build_request(&self, query: &AddressQuery) -> HttpRequest {
        let request = match query {
            AddressQuery::OneLine(address) => self
                .gateway
                .get("geographies/onelineaddress")
                .with_query("address", address.as_str()),
            AddressQuery::Components(components) => self
                .gateway
                .get("geographies/address")
                .with_optional_query("street", components.street.as_deref())
                .with_optional_query("city", components.city.as_deref())
                .with_optional_query("state", components.state.as_deref())
                .with_optional_query("zip", components.zip.as_deref()),
            AddressQuery::Coordinates {
                longitude,
                latitude,
            } => self
                .gateway
                .get("geographies/coordinates")
                .with_query("x", longitude.to_string())
                .with_query("y", latitude.to_string()),
        };

        request
            .with_query("benchmark", self.benchmark.as_str())
            .with_query("vintage", self.vintage.as_str())
            .with_query("layers", "all")
            .with_query("format", "json")
    }

    /// Best match for `query`, or `None` when nothing matched or the call
    /// failed (the observer tells which).
    pub async fn geocode(&self, query: &AddressQuery) -> Option<GeocodeResult> {
        let operation = match query {
            AddressQuery::OneLine(_) => "onelineaddress",
            AddressQuery::Components(_) => "address",
            AddressQuery::Coordinates { .. } => "coordinates",
        };
        let request = self.build_request(query);

        self.gateway
            .call(operation, Ok(request), |body| parse_geocode(body, query))
            .await
            .ok()
            .flatten()
    }
}

fn parse_geocode(body: &str, query: &AddressQuery) -> Result<Option<GeocodeResult>, FetchFailure> {
    let payload: Value = serde_json::from_str(body)?;
    let result = payload
        .get("result")
        .ok_or_else(|| FetchFailure::Shape(String::from("missing result object")))?;

    if let AddressQuery::Coordinates {
        longitude,
        latitude,
    } = query
    {
        let Some(geographies) = result.get("geographies").and_then(Value::as_object) else {
            return Ok(None);
        };
        if geographies.values().all(is_empty_layer) {
            return Ok(None);
        }
        let mut geocode = empty_result(result.clone());
        geocode.longitude = Some(*longitude);
        geocode.latitude = Some(*latitude);
        apply_geographies(&mut geocode, geographies);
        return Ok(Some(geocode));
    }

    let Some(best) = result
        .get("addressMatches")
        .and_then(Value::as_array)
        .and_then(|matches| matches.first())
    else {
        return Ok(None);
    };

    let mut geocode = empty_result(best.clone());
    geocode.matched_address = text_field(best.get("matchedAddress"));
    let coordinates = best.get("coordinates");
    geocode.longitude = coordinates
        .and_then(|coordinates| coordinates.get("x"))
        .and_then(Value::as_f64);
    geocode.latitude = coordinates
        .and_then(|coordinates| coordinates.get("y"))
        .and_then(Value::as_f64);

    let components = best.get("addressComponents");
    geocode.zip = text_field(components.and_then(|components| components.get("zip")));
    geocode.state_abbr = text_field(components.and_then(|components| components.get("state")));

    if let Some(geographies) = best.get("geographies").and_then(Value::as_object) {
        apply_geographies(&mut geocode, geographies);
    }
    Ok(Some(geocode))
}

fn empty_result(raw: Value) -> GeocodeResult {
    GeocodeResult {
        matched_address: None,
        longitude: None,
        latitude: None,
        state_fips: None,
        county_fips: None,
        tract: None,
        tract_geoid: None,
        county_name: None,
        state_abbr: None,
        zip: None,
        congressional_district: None,
        raw,
    }
}

fn is_empty_layer(layer: &Value) -> bool {
    layer.as_array().map_or(true, Vec::is_empty)
}

fn first_in_layer<'a>(geographies: &'a Map<String, Value>, layer: &str) -> Option<&'a Value> {
    geographies
        .get(layer)
        .and_then(Value::as_array)
        .and_then(|entries| entries.first())
}

fn apply_geographies(geocode: &mut GeocodeResult, geographies: &Map<String, Value>) {
    if let Some(tract) = first_in_layer(geographies, "Census Tracts") {
        geocode.tract_geoid = text_field(tract.get("GEOID"));
        geocode.tract = text_field(tract.get("TRACT"));
        geocode.state_fips = text_field(tract.get("STATE"));
        geocode.county_fips = text_field(tract.get("COUNTY"));
    }

    if let Some(county) = first_in_layer(geographies, "Counties") {
        geocode.county_name = text_field(county.get("NAME"));
        geocode.county_fips = geocode
            .county_fips
            .take()
            .or_else(|| text_field(county.get("COUNTY")));
        geocode.state_fips = geocode
            .state_fips
            .take()
            .or_else(|| text_field(county.get("STATE")));
    }

    if let Some(state) = first_in_layer(geographies, "States") {
        geocode.state_abbr = geocode
            .state_abbr
            .take()
            .or_else(|| text_field(state.get("STUSAB")));
        geocode.state_fips = geocode
            .state_fips
            .take()
            .or_else(|| text_field(state.get("STATE")));
    }

    // Layer name carries the Congress number ("119th Congressional Districts").
    let district = geographies
        .iter()
        .find(|(name, _)| name.ends_with("Congressional Districts"))
        .and_then(|(_, entries)| entries.as_array())
        .and_then(|entries| entries.first());
    if let Some(district) = district.and_then(Value::as_object) {
        geocode.congressional_district = district
            .iter()
            .find(|(key, _)| key.starts_with("CD") && key[2..].chars().all(|ch| ch.is_ascii_digit()))
            .and_then(|(_, value)| text_field(Some(value)))
            .or_else(|| text_field(district.get("BASENAME")));
    }
}
