use crate::cities::error::TableError;
use crate::emit::error::EmitError;
use crate::geocoding::error::GeocodeError;
use crate::normals::error::NormalsError;
use crate::stations::error::LocateStationError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComfortMapError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    #[error(transparent)]
    LocateStation(#[from] LocateStationError),

    #[error(transparent)]
    Normals(#[from] NormalsError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),

    /// Every city was skipped; no output files were written.
    #[error("No data collected: none of the {cities} cities produced climate normals")]
    NoDataCollected { cities: usize },
}
