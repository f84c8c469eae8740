//! # Domain Models
//!
//! Normalized records produced by the source adapters.
//!
//! | Type | Produced by |
//! |------|-------------|
//! | [`Opportunity`] | SAM.gov opportunities |
//! | [`Award`] | SBIR.gov awards, USAspending award search |
//! | [`Solicitation`] | SBIR.gov solicitations |
//! | [`GeocodeResult`] | Census geocoder |
//! | [`RecipientProfile`], [`AgencyBudget`], [`ToptierAgency`] | USAspending lookups |
//!
//! Every record keeps the upstream payload in `raw` so collaborators can reach
//! source-specific fields without this crate modelling all of them.

pub mod parse;
mod lookups;
mod records;

pub use lookups::{AgencyBudget, FiscalYearBudget, RecipientProfile, ToptierAgency};
pub use records::{
    Award, GeocodeResult, NormalizedRecord, Opportunity, Solicitation, SolicitationTopic,
};
