//! Fills in coordinates for city rows.
//!
//! Each row is looked up as `"City, Country"` first and as `"City"` alone if that
//! finds nothing. Lookup failures are logged and treated as "no match"; the row
//! keeps `None` coordinates and is skipped by later stages.

use crate::geocoding::Geocoder;
use crate::types::city::CityRow;
use crate::LatLon;
use log::{info, warn};

pub struct LocationResolver<'a, G: Geocoder> {
    geocoder: &'a G,
}

impl<'a, G: Geocoder> LocationResolver<'a, G> {
    pub fn new(geocoder: &'a G) -> Self {
        Self { geocoder }
    }

    /// Resolves every row in input order, returning copies with `lat`/`lon` set
    /// (or cleared, for rows that could not be resolved).
    pub async fn resolve_all(&self, rows: &[CityRow]) -> Vec<CityRow> {
        let mut resolved = Vec::with_capacity(rows.len());
        for row in rows {
            let location = self.resolve(row).await;
            if location.is_none() {
                info!("No geocoding match for {}, {}", row.city, row.country);
            }
            resolved.push(CityRow {
                lat: location.map(|l| l.0),
                lon: location.map(|l| l.1),
                ..row.clone()
            });
        }
        resolved
    }

    /// Looks up a single row, with the city-only fallback.
    pub async fn resolve(&self, row: &CityRow) -> Option<LatLon> {
        for query in queries_for(row) {
            if let Some(location) = self.lookup(&query).await {
                return Some(location);
            }
        }
        None
    }

    async fn lookup(&self, query: &str) -> Option<LatLon> {
        match self.geocoder.geocode(query).await {
            Ok(location) => location,
            Err(e) => {
                warn!("Geocoding '{}' failed: {}", query, e);
                None
            }
        }
    }
}

fn queries_for(row: &CityRow) -> Vec<String> {
    if row.country.is_empty() {
        vec![row.city.clone()]
    } else {
        vec![format!("{}, {}", row.city, row.country), row.city.clone()]
    }
}
