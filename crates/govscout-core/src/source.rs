use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Canonical identifiers for the upstream APIs this crate ingests from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    SamOpportunities,
    CensusGeocoder,
    Sbir,
    UsaSpending,
}

impl SourceId {
    pub const ALL: [Self; 4] = [
        Self::SamOpportunities,
        Self::CensusGeocoder,
        Self::Sbir,
        Self::UsaSpending,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SamOpportunities => "sam_opportunities",
            Self::CensusGeocoder => "census_geocoder",
            Self::Sbir => "sbir",
            Self::UsaSpending => "usa_spending",
        }
    }
}

impl Display for SourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sam" | "sam_opportunities" => Ok(Self::SamOpportunities),
            "census" | "geocoder" | "census_geocoder" => Ok(Self::CensusGeocoder),
            "sbir" => Ok(Self::Sbir),
            "usaspending" | "usa_spending" => Ok(Self::UsaSpending),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_aliases() {
        assert_eq!("SAM".parse::<SourceId>(), Ok(SourceId::SamOpportunities));
        assert_eq!(" usaspending ".parse::<SourceId>(), Ok(SourceId::UsaSpending));
        assert_eq!("geocoder".parse::<SourceId>(), Ok(SourceId::CensusGeocoder));
    }

    #[test]
    fn unknown_source_is_rejected() {
        let error = "fpds".parse::<SourceId>().expect_err("fpds is not a source");
        assert_eq!(
            error,
            ValidationError::InvalidSource {
                value: String::from("fpds")
            }
        );
    }
}
