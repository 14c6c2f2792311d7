//! Where normals frames come from.

use crate::normals::error::NormalsError;
use crate::normals::extract::extract_normals;
use crate::normals::loader::NormalsLoader;
use crate::stations::locate_station::StationLocator;
use crate::LatLon;
use log::{debug, info};
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;

/// A point-based climate normals lookup.
///
/// Returns `Ok(None)` when the source has no data for the point. The frame uses
/// the [`NORMALS_COLUMNS`](crate::normals::loader::NORMALS_COLUMNS) names plus
/// `tavg`.
#[allow(async_fn_in_trait)]
pub trait NormalsSource {
    async fn normals_frame(&self, location: LatLon) -> Result<Option<DataFrame>, NormalsError>;
}

/// Meteostat bulk normals of the nearest station(s) to a point.
///
/// Candidate stations within `max_distance_km` are tried closest first; the
/// first one whose latest period covers all twelve months wins.
///
/// The station index is loaded on the first lookup, so a failed station list
/// download fails that lookup only and is attempted again on the next one.
pub struct MeteostatNormals {
    cache_dir: PathBuf,
    locator: OnceCell<StationLocator>,
    loader: NormalsLoader,
    max_distance_km: f64,
    station_limit: usize,
}

impl MeteostatNormals {
    /// A source caching station metadata and normals in `cache_dir`.
    pub fn new(cache_dir: &Path, max_distance_km: f64, station_limit: usize) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
            locator: OnceCell::new(),
            loader: NormalsLoader::new(cache_dir),
            max_distance_km,
            station_limit,
        }
    }

    /// A source over an already built station index.
    pub fn with_locator(
        locator: StationLocator,
        loader: NormalsLoader,
        max_distance_km: f64,
        station_limit: usize,
    ) -> Self {
        Self {
            cache_dir: PathBuf::new(),
            locator: OnceCell::new_with(Some(locator)),
            loader,
            max_distance_km,
            station_limit,
        }
    }

    async fn locator(&self) -> Result<&StationLocator, NormalsError> {
        self.locator
            .get_or_try_init(|| async {
                let locator = StationLocator::new(&self.cache_dir).await?;
                info!("Loaded {} stations with climate normals", locator.len());
                Ok::<_, NormalsError>(locator)
            })
            .await
    }
}

impl NormalsSource for MeteostatNormals {
    async fn normals_frame(&self, location: LatLon) -> Result<Option<DataFrame>, NormalsError> {
        let stations = self.locator().await?.query(
            location.0,
            location.1,
            self.station_limit,
            self.max_distance_km,
        );
        if stations.is_empty() {
            debug!(
                "No normals station within {} km of ({:.4}, {:.4})",
                self.max_distance_km, location.0, location.1
            );
            return Ok(None);
        }

        let mut last_error: Option<NormalsError> = None;
        for (station, distance_km) in &stations {
            let frame = match self.loader.get_frame(&station.id).await {
                Ok(lazy_frame) => lazy_frame.collect()?,
                Err(e) if e.is_not_found() => {
                    debug!("Station {} has no normals file", station.id);
                    continue;
                }
                Err(e) => {
                    debug!("Loading normals of station {} failed: {}", station.id, e);
                    last_error = Some(e);
                    continue;
                }
            };
            match extract_normals(&frame) {
                Ok(Some(_)) => {}
                Ok(None) => {
                    debug!(
                        "Latest normals period of station {} does not cover all months",
                        station.id
                    );
                    continue;
                }
                Err(e) => {
                    debug!("Normals of station {} are unusable: {}", station.id, e);
                    last_error = Some(e);
                    continue;
                }
            }
            info!(
                "Using station {} ({}) at {:.1} km",
                station.id,
                station.display_name(),
                distance_km
            );
            return Ok(Some(frame));
        }

        match last_error {
            Some(e) => Err(NormalsError::NoDataFoundForNearbyStations {
                lat: location.0,
                lon: location.1,
                stations_tried: stations.len(),
                last_error: Box::new(e),
            }),
            None => Ok(None),
        }
    }
}
