use crate::normals::error::NormalsError;
use async_compression::tokio::bufread::GzipDecoder;
use futures_util::TryStreamExt;
use log::{debug, info, warn};
use polars::frame::DataFrame;
use polars::prelude::*;
use reqwest::Client;
use std::collections::{hash_map::Entry, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::io::AsyncReadExt;
use tokio::sync::Mutex;
use tokio::{fs, task};
use tokio_util::io::StreamReader;

const NORMALS_URL: &str = "https://bulk.meteostat.net/v2/normals";
const CACHE_FILE_PREFIX: &str = "normals-";

/// Column names of the headerless Meteostat bulk normals CSV, in file order.
pub const NORMALS_COLUMNS: [&str; 9] = [
    "start_year",
    "end_year",
    "month",
    "tmin",
    "tmax",
    "prcp",
    "wspd",
    "pres",
    "tsun",
];

/// Downloads per-station climate normals and caches them as parquet files.
///
/// Frames are also kept in memory for the lifetime of the loader, so nearby
/// cities that share a station only read it once.
pub struct NormalsLoader {
    cache_dir: PathBuf,
    download_client: Client,
    frames: Mutex<HashMap<String, LazyFrame>>,
}

impl NormalsLoader {
    pub fn new(cache_dir: &Path) -> NormalsLoader {
        NormalsLoader {
            cache_dir: cache_dir.to_path_buf(),
            download_client: Client::new(),
            frames: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the normals frame for `station`, from memory, the parquet cache,
    /// or a fresh download, in that order.
    pub async fn get_frame(&self, station: &str) -> Result<LazyFrame, NormalsError> {
        {
            let frames = self.frames.lock().await;
            if let Some(frame) = frames.get(station) {
                return Ok(frame.clone());
            }
        }

        let loaded = self.load_cached_or_download(station).await?;

        let mut frames = self.frames.lock().await;
        match frames.entry(station.to_string()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                entry.insert(loaded.clone());
                Ok(loaded)
            }
        }
    }

    async fn load_cached_or_download(&self, station: &str) -> Result<LazyFrame, NormalsError> {
        let cache_filename = format!("{}{}.parquet", CACHE_FILE_PREFIX, station);
        let parquet_path = self.cache_dir.join(&cache_filename);

        if fs::metadata(&parquet_path).await.is_ok() {
            debug!(
                "Cache hit for normals of station {} at {:?}",
                station, parquet_path
            );
        } else {
            info!(
                "Cache miss for normals of station {}. Downloading and processing.",
                station
            );
            let raw_bytes = self.download(station).await?;
            let df = Self::csv_to_dataframe(raw_bytes, station).await?;

            fs::create_dir_all(&self.cache_dir)
                .await
                .map_err(|e| NormalsError::CacheDirCreation(self.cache_dir.clone(), e))?;

            Self::cache_dataframe(df, &parquet_path).await?;
            debug!(
                "Cached normals for station {} to {:?}",
                station, parquet_path
            );
        }

        LazyFrame::scan_parquet(&parquet_path, Default::default())
            .map_err(|e| NormalsError::ParquetScan(parquet_path.clone(), e))
    }

    /// Downloads and decompresses the normals file of one station.
    async fn download(&self, station: &str) -> Result<Vec<u8>, NormalsError> {
        let url = format!("{}/{}.csv.gz", NORMALS_URL, station);
        debug!("Downloading data from {}", url);

        let response = self
            .download_client
            .get(&url)
            .send()
            .await
            .map_err(|e| NormalsError::NetworkRequest(url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {}", url, e);
                return Err(match e.status() {
                    Some(status) => NormalsError::HttpStatus {
                        url,
                        status,
                        source: e,
                    },
                    None => NormalsError::NetworkRequest(url, e),
                });
            }
        };

        let stream = response.bytes_stream().map_err(std::io::Error::other);
        let stream_reader = StreamReader::new(stream);
        let mut decoder = GzipDecoder::new(stream_reader);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .await
            .map_err(NormalsError::DownloadIo)?;
        debug!(
            "Downloaded and decompressed {} bytes for station {}",
            decompressed.len(),
            station
        );
        Ok(decompressed)
    }

    /// Parses raw headerless normals CSV bytes into a DataFrame on a blocking task,
    /// assigning [`NORMALS_COLUMNS`] and deriving `tavg`.
    pub(crate) async fn csv_to_dataframe(
        bytes: Vec<u8>,
        station: &str,
    ) -> Result<DataFrame, NormalsError> {
        let station_owned = station.to_string();

        task::spawn_blocking(move || {
            let csv_io_error = |e: std::io::Error| NormalsError::CsvReadIo {
                station: station_owned.clone(),
                source: e,
            };
            let mut temp_file = NamedTempFile::new().map_err(csv_io_error)?;
            temp_file.write_all(&bytes).map_err(csv_io_error)?;
            temp_file.flush().map_err(csv_io_error)?;

            let mut df = CsvReadOptions::default()
                .with_has_header(false)
                .try_into_reader_with_file_path(Some(temp_file.path().to_path_buf()))
                .and_then(|reader| reader.finish())
                .map_err(|e| NormalsError::CsvReadPolars {
                    station: station_owned.clone(),
                    source: e,
                })?;

            if df.width() != NORMALS_COLUMNS.len() {
                warn!(
                    "CSV column count ({}) does not match schema length ({}) for normals of station {}",
                    df.width(),
                    NORMALS_COLUMNS.len(),
                    station_owned
                );
                return Err(NormalsError::SchemaMismatch {
                    station: station_owned,
                    expected: NORMALS_COLUMNS.len(),
                    found: df.width(),
                });
            }

            df.set_column_names(NORMALS_COLUMNS.iter().copied())
                .map_err(|e| NormalsError::ColumnRenameError {
                    station: station_owned,
                    source: e,
                })?;

            Ok(derive_tavg(df)?)
        })
        .await?
    }

    /// Writes a DataFrame to a Parquet file on a blocking task.
    async fn cache_dataframe(mut df: DataFrame, path: &Path) -> Result<(), NormalsError> {
        let path_buf = path.to_path_buf();
        task::spawn_blocking(move || {
            let file = std::fs::File::create(&path_buf)
                .map_err(|e| NormalsError::ParquetWriteIo(path_buf.clone(), e))?;
            ParquetWriter::new(file)
                .with_compression(ParquetCompression::Snappy)
                .finish(&mut df)
                .map_err(|e| NormalsError::ParquetWritePolars(path_buf, e))?;
            Ok::<(), NormalsError>(())
        })
        .await??;
        Ok(())
    }
}

/// Adds a `tavg` column as the mean of `tmin` and `tmax` when the frame has none.
/// The result is null wherever either input is null.
pub(crate) fn derive_tavg(df: DataFrame) -> PolarsResult<DataFrame> {
    if df.column("tavg").is_ok() || df.column("tmin").is_err() || df.column("tmax").is_err() {
        return Ok(df);
    }
    df.lazy()
        .with_column(
            ((col("tmin").cast(DataType::Float64) + col("tmax").cast(DataType::Float64))
                / lit(2.0))
            .alias("tavg"),
        )
        .collect()
}
