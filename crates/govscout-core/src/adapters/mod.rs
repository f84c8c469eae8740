//! Source adapters, one per upstream API.
//!
//! Every adapter wraps a [`SourceGateway`] and converts upstream payloads into
//! domain records. Adapters never return errors: a disabled source, a failed
//! call, or an unparseable body all come back as an empty result, and the
//! gateway's observer records which one it was.

mod gateway;
pub mod geocoder;
pub mod opportunities;
pub mod sbir;
pub mod spending;
#[cfg(test)]
mod testing;

pub use gateway::{
    GatewaySettings, RecordCount, SourceGateway, DEFAULT_REQUEST_TIMEOUT_MS,
};
pub use geocoder::CensusGeocoderAdapter;
pub use opportunities::SamOpportunitiesAdapter;
pub use sbir::{SbirAdapter, SbirSolicitations};
pub use spending::UsaSpendingAdapter;

pub(crate) use gateway::CallError;

use crate::pagination::Page;

/// Collapses a gateway result into the page handed to the driver.
pub(crate) fn settle_page<R>(result: Result<Page<R>, CallError>) -> Page<R> {
    match result {
        Ok(page) => page,
        Err(CallError::Disabled) => Page::empty(),
        Err(CallError::Failed) => Page::failed(),
    }
}
