//! Meteostat weather station metadata, trimmed to what the climate-normals lookup
//! needs, plus the `rstar` impl used for spatial indexing.

use rstar::{RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single Meteostat weather station.
///
/// Deserialized from the Meteostat `stations/lite.json.gz` listing. Fields of the
/// listing that are not declared here are ignored.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    /// The unique Meteostat station identifier (e.g., "08535").
    pub id: String,
    /// The country code where the station is located (e.g., "PT").
    pub country: String,
    /// The region code, if available.
    pub region: Option<String>,
    /// Station names by language code (e.g., {"en": "Lisbon"}).
    pub name: HashMap<String, String>,
    pub location: Location,
    pub inventory: Inventory,
}

impl Station {
    /// English station name, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.get("en").map(String::as_str).unwrap_or(&self.id)
    }

    /// Whether the station advertises any climate normals.
    pub fn has_normals(&self) -> bool {
        self.inventory.normals.start.is_some() && self.inventory.normals.end.is_some()
    }
}

/// Data availability for the frequencies this crate cares about.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Inventory {
    /// The reported start and end years for climate normals data.
    pub normals: YearRange,
}

/// A year range with optional start and end years.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct YearRange {
    pub start: Option<i32>,
    pub end: Option<i32>,
}

/// The geographical location of a weather station.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Location {
    /// Latitude in decimal degrees (positive for North, negative for South).
    pub latitude: f64,
    /// Longitude in decimal degrees (positive for East, negative for West).
    pub longitude: f64,
    /// Elevation above sea level in meters, if available.
    pub elevation: Option<i32>,
}

// --- R-Tree Implementation ---

impl RTreeObject for Station {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.location.latitude, self.location.longitude])
    }
}
