//! Rows of the input city table and the per-city output records.

use crate::types::normals::MonthlyNormals;
use crate::LatLon;
use serde::Serialize;

/// One row of the input city table.
///
/// `lat`/`lon` are `None` until the row has been geocoded, and stay `None` if
/// geocoding found no match.
#[derive(Debug, Clone, PartialEq)]
pub struct CityRow {
    pub city: String,
    pub country: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl CityRow {
    pub fn new(city: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            country: country.into(),
            lat: None,
            lon: None,
        }
    }

    /// The row's coordinate, if both latitude and longitude are known.
    pub fn location(&self) -> Option<LatLon> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) if !lat.is_nan() && !lon.is_nan() => Some(LatLon(lat, lon)),
            _ => None,
        }
    }
}

/// A successfully processed city. Written unchanged to every output artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityRecord {
    pub city: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(flatten)]
    pub normals: MonthlyNormals,
}

impl CityRecord {
    pub fn new(row: &CityRow, location: LatLon, normals: MonthlyNormals) -> Self {
        Self {
            city: row.city.clone(),
            country: row.country.clone(),
            lat: location.0,
            lon: location.1,
            normals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_requires_both_coordinates() {
        let mut row = CityRow::new("Lisbon", "Portugal");
        assert_eq!(row.location(), None);

        row.lat = Some(38.72);
        assert_eq!(row.location(), None);

        row.lon = Some(-9.14);
        assert_eq!(row.location(), Some(LatLon(38.72, -9.14)));

        row.lon = Some(f64::NAN);
        assert_eq!(row.location(), None);
    }
}
