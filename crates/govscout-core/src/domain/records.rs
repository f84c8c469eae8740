use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::Date;

use crate::SourceId;

/// Contract opportunity notice from SAM.gov.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub notice_id: String,
    pub title: String,
    pub solicitation_number: Option<String>,
    pub agency: Option<String>,
    pub posted_date: Option<Date>,
    pub response_deadline: Option<Date>,
    pub notice_type: Option<String>,
    pub set_aside: Option<String>,
    pub naics_code: Option<String>,
    pub classification_code: Option<String>,
    pub active: bool,
    pub award_amount: Option<f64>,
    pub awardee_name: Option<String>,
    pub awardee_uei: Option<String>,
    pub place_state: Option<String>,
    pub place_zip: Option<String>,
    pub ui_link: Option<String>,
    pub raw: Value,
}

/// Award record. SBIR.gov and USAspending both normalize into this shape;
/// `source` says which one produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Award {
    pub source: SourceId,
    pub award_id: String,
    pub title: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_uei: Option<String>,
    pub agency: Option<String>,
    pub sub_agency: Option<String>,
    pub amount: Option<f64>,
    pub award_date: Option<Date>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub naics_code: Option<String>,
    pub program: Option<String>,
    pub phase: Option<String>,
    pub state: Option<String>,
    pub raw: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolicitationTopic {
    pub number: Option<String>,
    pub title: String,
}

/// SBIR/STTR solicitation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solicitation {
    pub solicitation_number: Option<String>,
    pub title: String,
    pub agency: Option<String>,
    pub branch: Option<String>,
    pub program: Option<String>,
    pub phase: Option<String>,
    pub year: Option<i32>,
    pub open_date: Option<Date>,
    pub close_date: Option<Date>,
    pub status: Option<String>,
    pub topics: Vec<SolicitationTopic>,
    pub url: Option<String>,
    pub raw: Value,
}

/// Best address match (or reverse lookup) from the Census geocoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub matched_address: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub state_fips: Option<String>,
    pub county_fips: Option<String>,
    pub tract: Option<String>,
    /// Full census tract GEOID (state + county + tract).
    pub tract_geoid: Option<String>,
    pub county_name: Option<String>,
    pub state_abbr: Option<String>,
    pub zip: Option<String>,
    pub congressional_district: Option<String>,
    pub raw: Value,
}

/// The records this layer hands to downstream collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizedRecord {
    Opportunity(Opportunity),
    Award(Award),
    Solicitation(Solicitation),
    Geocode(GeocodeResult),
}

impl NormalizedRecord {
    pub const fn source(&self) -> SourceId {
        match self {
            Self::Opportunity(_) => SourceId::SamOpportunities,
            Self::Award(award) => award.source,
            Self::Solicitation(_) => SourceId::Sbir,
            Self::Geocode(_) => SourceId::CensusGeocoder,
        }
    }
}

impl From<Opportunity> for NormalizedRecord {
    fn from(value: Opportunity) -> Self {
        Self::Opportunity(value)
    }
}

impl From<Award> for NormalizedRecord {
    fn from(value: Award) -> Self {
        Self::Award(value)
    }
}

impl From<Solicitation> for NormalizedRecord {
    fn from(value: Solicitation) -> Self {
        Self::Solicitation(value)
    }
}

impl From<GeocodeResult> for NormalizedRecord {
    fn from(value: GeocodeResult) -> Self {
        Self::Geocode(value)
    }
}
