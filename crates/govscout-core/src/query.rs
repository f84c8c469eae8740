//! Request value types shared by every adapter.
//!
//! | Type | Used by |
//! |------|---------|
//! | [`QueryFilter`] | SAM opportunities, SBIR awards/solicitations, USAspending search |
//! | [`PageCursor`] | [`PaginationDriver`](crate::pagination::PaginationDriver) |
//! | [`AddressQuery`] | Census geocoder |
//!
//! Filters are plain owned values: each fetch clones its own copy and nothing
//! in this crate mutates one after it is built.

use time::Date;

use crate::ValidationError;

/// One logical fetch against one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFilter {
    pub naics_code: Option<String>,
    pub agency: Option<String>,
    pub keyword: Option<String>,
    pub date_from: Option<Date>,
    pub date_to: Option<Date>,
    pub procurement_type: Option<String>,
    pub set_aside: Option<String>,
    pub firm: Option<String>,
    pub year: Option<i32>,
    pub award_type_codes: Vec<String>,
    pub limit: usize,
}

impl QueryFilter {
    pub fn new(limit: usize) -> Result<Self, ValidationError> {
        if limit == 0 {
            return Err(ValidationError::ZeroValue { field: "limit" });
        }
        Ok(Self {
            naics_code: None,
            agency: None,
            keyword: None,
            date_from: None,
            date_to: None,
            procurement_type: None,
            set_aside: None,
            firm: None,
            year: None,
            award_type_codes: Vec::new(),
            limit,
        })
    }

    pub fn with_naics(mut self, code: impl AsRef<str>) -> Self {
        self.naics_code = non_blank(code.as_ref());
        self
    }

    pub fn with_agency(mut self, agency: impl AsRef<str>) -> Self {
        self.agency = non_blank(agency.as_ref());
        self
    }

    pub fn with_keyword(mut self, keyword: impl AsRef<str>) -> Self {
        self.keyword = non_blank(keyword.as_ref());
        self
    }

    pub fn with_procurement_type(mut self, ptype: impl AsRef<str>) -> Self {
        self.procurement_type = non_blank(ptype.as_ref());
        self
    }

    pub fn with_set_aside(mut self, set_aside: impl AsRef<str>) -> Self {
        self.set_aside = non_blank(set_aside.as_ref());
        self
    }

    pub fn with_firm(mut self, firm: impl AsRef<str>) -> Self {
        self.firm = non_blank(firm.as_ref());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_award_type_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.award_type_codes = codes
            .into_iter()
            .filter_map(|code| non_blank(code.as_ref()))
            .collect();
        self
    }

    pub fn with_date_window(mut self, from: Date, to: Date) -> Result<Self, ValidationError> {
        if from > to {
            return Err(ValidationError::InvertedDateWindow {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        self.date_from = Some(from);
        self.date_to = Some(to);
        Ok(self)
    }

    /// Window of `lookback_days` ending on `today`.
    pub fn with_lookback(self, today: Date, lookback_days: u32) -> Result<Self, ValidationError> {
        let from = today
            .checked_sub(time::Duration::days(i64::from(lookback_days)))
            .unwrap_or(Date::MIN);
        self.with_date_window(from, today)
    }

    pub fn date_window(&self) -> Option<(Date, Date)> {
        self.date_from.zip(self.date_to)
    }
}

/// Offset-based page position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub offset: usize,
    pub page_size: usize,
}

impl PageCursor {
    pub const fn first(page_size: usize) -> Self {
        Self {
            offset: 0,
            page_size,
        }
    }

    pub const fn new(offset: usize, page_size: usize) -> Self {
        Self { offset, page_size }
    }

    /// 1-based page number for sources that paginate by page index.
    pub const fn page_number(self) -> usize {
        if self.page_size == 0 {
            return 1;
        }
        self.offset / self.page_size + 1
    }

    pub(crate) const fn advanced_by(self, requested: usize) -> Self {
        Self {
            offset: self.offset + requested,
            page_size: self.page_size,
        }
    }
}

/// Component-mode address; blank parts are dropped at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressComponents {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
}

/// Geocoder lookup modes.
#[derive(Debug, Clone, PartialEq)]
pub enum AddressQuery {
    OneLine(String),
    Components(AddressComponents),
    Coordinates { longitude: f64, latitude: f64 },
}

impl AddressQuery {
    pub fn one_line(address: impl AsRef<str>) -> Result<Self, ValidationError> {
        non_blank(address.as_ref())
            .map(Self::OneLine)
            .ok_or(ValidationError::BlankValue { field: "address" })
    }

    pub fn components(
        street: Option<&str>,
        city: Option<&str>,
        state: Option<&str>,
        zip: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let components = AddressComponents {
            street: street.and_then(non_blank),
            city: city.and_then(non_blank),
            state: state.and_then(non_blank),
            zip: zip.and_then(non_blank),
        };
        if components.street.is_none() && components.city.is_none() && components.state.is_none()
        {
            return Err(ValidationError::EmptyAddress);
        }
        Ok(Self::Components(components))
    }

    pub fn coordinates(longitude: f64, latitude: f64) -> Result<Self, ValidationError> {
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::CoordinateOutOfRange {
                field: "longitude",
                value: longitude.to_string(),
            });
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::CoordinateOutOfRange {
                field: "latitude",
                value: latitude.to_string(),
            });
        }
        Ok(Self::Coordinates {
            longitude,
            latitude,
        })
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}
