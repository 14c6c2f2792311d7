use crate::stations::error::LocateStationError;
use crate::types::station::Station;
use async_compression::tokio::bufread::GzipDecoder;
use bincode::config::{Configuration, Fixint, LittleEndian};
use futures_util::TryStreamExt;
use haversine::{distance, Location as HaversineLocation, Units};
use log::{debug, info};
use ordered_float::OrderedFloat;
use reqwest::Client;
use rstar::{RTree, AABB};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::io;
use std::path::Path;
use tokio::io::{AsyncReadExt, BufReader};
use tokio_util::io::StreamReader;

const DATA_URL: &str = "https://bulk.meteostat.net/v2/stations/lite.json.gz";
// Mean Earth radius used by the haversine crate
const EARTH_RADIUS_KM: f64 = 6371.0;
const BINCODE_CACHE_FILE_NAME: &str = "stations_lite.bin";
const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

/// Spatial index over the Meteostat stations that publish climate normals.
#[derive(Debug, Clone)]
pub struct StationLocator {
    rtree: RTree<Station>,
}

// Heap entry, ordered by distance only
struct StationCandidate<'a> {
    distance_km: OrderedFloat<f64>,
    station: &'a Station,
}
impl PartialEq for StationCandidate<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.distance_km == other.distance_km
    }
}
impl Eq for StationCandidate<'_> {}
impl PartialOrd for StationCandidate<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for StationCandidate<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_km.cmp(&other.distance_km)
    }
}

impl StationLocator {
    /// Loads the station list from the bincode cache in `cache_dir`, downloading
    /// and caching it first if needed.
    pub async fn new(cache_dir: &Path) -> Result<Self, LocateStationError> {
        let cache_file = cache_dir.join(BINCODE_CACHE_FILE_NAME);

        let stations: Vec<Station> = if cache_file.exists() {
            let path_clone = cache_file.clone();
            tokio::task::spawn_blocking(move || Self::get_cached_stations(&path_clone)).await??
        } else {
            info!("Station cache not found. Fetching from URL: {}", DATA_URL);
            let stations = Self::fetch_stations().await?;
            Self::cache_stations(stations.clone(), &cache_file).await?;
            stations
        };

        Ok(Self::from_stations(stations))
    }

    /// Builds the index from an in-memory station list. Stations without a
    /// normals inventory are dropped.
    pub fn from_stations(stations: Vec<Station>) -> Self {
        let with_normals: Vec<Station> = stations.into_iter().filter(Station::has_normals).collect();
        debug!("Indexing {} stations with climate normals", with_normals.len());
        StationLocator {
            rtree: RTree::bulk_load(with_normals),
        }
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    fn get_cached_stations(cache_path: &Path) -> Result<Vec<Station>, LocateStationError> {
        let bytes = std::fs::read(cache_path)
            .map_err(|e| LocateStationError::CacheRead(cache_path.to_path_buf(), e))?;
        let (decoded_stations, _) =
            bincode::serde::decode_from_slice::<Vec<Station>, _>(&bytes, BINCODE_CONFIG).map_err(
                |e| LocateStationError::CacheDecode(cache_path.to_path_buf(), Box::from(e)),
            )?;
        Ok(decoded_stations)
    }

    async fn fetch_stations() -> Result<Vec<Station>, LocateStationError> {
        let client = Client::new();
        let response = client
            .get(DATA_URL)
            .send()
            .await
            .map_err(|e| LocateStationError::NetworkRequest(DATA_URL.to_string(), e))?;
        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                return Err(match e.status() {
                    Some(status) => LocateStationError::HttpStatus {
                        url: DATA_URL.to_string(),
                        status,
                        source: e,
                    },
                    None => LocateStationError::NetworkRequest(DATA_URL.to_string(), e),
                });
            }
        };
        let stream = response.bytes_stream().map_err(io::Error::other);
        let stream_reader = StreamReader::new(stream);
        let gzip_decoder = GzipDecoder::new(BufReader::new(stream_reader));
        let mut decoder_reader = BufReader::new(gzip_decoder);
        let mut decompressed_json = Vec::with_capacity(20_000_000);
        decoder_reader.read_to_end(&mut decompressed_json).await?;

        let parse_start = std::time::Instant::now();
        let stations = tokio::task::spawn_blocking(move || {
            serde_json::from_slice::<Vec<Station>>(&decompressed_json)
                .map_err(LocateStationError::from)
        })
        .await??;
        info!(
            "Parsed {} stations from JSON in {:?}",
            stations.len(),
            parse_start.elapsed()
        );
        Ok(stations)
    }

    async fn cache_stations(
        stations: Vec<Station>,
        cache_path: &Path,
    ) -> Result<(), LocateStationError> {
        let bincode_data = tokio::task::spawn_blocking(move || {
            bincode::serde::encode_to_vec(stations, BINCODE_CONFIG)
                .map_err(|e| LocateStationError::CacheEncode(Box::new(e)))
        })
        .await??;
        tokio::fs::write(&cache_path, &bincode_data)
            .await
            .map_err(|e| LocateStationError::CacheWrite(cache_path.to_path_buf(), e))?;
        debug!(
            "Wrote station cache ({} bytes) to {}",
            bincode_data.len(),
            cache_path.display()
        );
        Ok(())
    }

    /// Finds up to `n_results` stations with climate normals within
    /// `max_distance_km` of the point, closest first, with their Haversine
    /// distance in kilometers.
    pub fn query(
        &self,
        latitude: f64,
        longitude: f64,
        n_results: usize,
        max_distance_km: f64,
    ) -> Vec<(Station, f64)> {
        if n_results == 0 || max_distance_km < 0.0 {
            return vec![];
        }

        let mut heap: BinaryHeap<StationCandidate<'_>> = BinaryHeap::with_capacity(n_results);

        for envelope in search_envelopes(latitude, longitude, max_distance_km) {
            for station in self.rtree.locate_in_envelope_intersecting(&envelope) {
                let dist_km = distance(
                    HaversineLocation {
                        latitude,
                        longitude,
                    },
                    HaversineLocation {
                        latitude: station.location.latitude,
                        longitude: station.location.longitude,
                    },
                    Units::Kilometers,
                );
                if dist_km > max_distance_km {
                    continue;
                }

                let candidate = StationCandidate {
                    distance_km: OrderedFloat(dist_km),
                    station,
                };
                if heap.len() < n_results {
                    heap.push(candidate);
                } else if heap
                    .peek()
                    .is_some_and(|worst| candidate.distance_km < worst.distance_km)
                {
                    heap.pop();
                    heap.push(candidate);
                }
            }
        }

        heap.into_sorted_vec()
            .into_iter()
            .map(|c| (c.station.to_owned(), c.distance_km.into_inner()))
            .collect()
    }
}

/// Latitude/longitude boxes that together contain every point within
/// `radius_km` of the center. Boxes are split at the antimeridian, and widen to
/// all longitudes when the circle reaches a pole.
fn search_envelopes(latitude: f64, longitude: f64, radius_km: f64) -> Vec<AABB<[f64; 2]>> {
    // Slightly oversized so points exactly on the radius are not lost to rounding
    let angular = radius_km / EARTH_RADIUS_KM * 1.001;
    let lat = latitude.to_radians();
    let min_lat = (lat - angular).to_degrees();
    let max_lat = (lat + angular).to_degrees();

    let delta_lon = if max_lat >= 90.0 || min_lat <= -90.0 {
        None
    } else {
        let ratio = angular.sin() / lat.cos();
        (ratio < 1.0).then(|| ratio.asin().to_degrees())
    };
    let Some(delta_lon) = delta_lon else {
        return vec![AABB::from_corners(
            [min_lat.max(-90.0), -180.0],
            [max_lat.min(90.0), 180.0],
        )];
    };

    let west = longitude - delta_lon;
    let east = longitude + delta_lon;
    let mut envelopes = vec![AABB::from_corners(
        [min_lat, west.max(-180.0)],
        [max_lat, east.min(180.0)],
    )];
    if west < -180.0 {
        envelopes.push(AABB::from_corners([min_lat, west + 360.0], [max_lat, 180.0]));
    }
    if east > 180.0 {
        envelopes.push(AABB::from_corners([min_lat, -180.0], [max_lat, east - 360.0]));
    }
    envelopes
}
