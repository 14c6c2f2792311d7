//! Resolving city names to coordinates.

pub mod error;
pub mod nominatim;
pub mod rate_limiter;
pub mod resolver;

use crate::geocoding::error::GeocodeError;
use crate::LatLon;

/// A free-text place-name lookup.
///
/// Implementations return `Ok(None)` when the service answered but found no match.
#[allow(async_fn_in_trait)]
pub trait Geocoder {
    async fn geocode(&self, query: &str) -> Result<Option<LatLon>, GeocodeError>;
}
