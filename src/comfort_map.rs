//! The end-to-end batch run: city table → coordinates → normals → artifacts.
//!
//! Cities are processed one at a time in input order. A city that cannot be
//! geocoded or has no usable normals is logged and skipped; only a run in which
//! every city was skipped fails, and then no output files are written.

use crate::cities::table::CityTable;
use crate::emit::{write_all, OutputPaths};
use crate::error::ComfortMapError;
use crate::filter::ComfortFilter;
use crate::geocoding::nominatim::NominatimClient;
use crate::geocoding::resolver::LocationResolver;
use crate::geocoding::Geocoder;
use crate::normals::fetcher::ClimateFetcher;
use crate::normals::source::{MeteostatNormals, NormalsSource};
use crate::types::city::CityRecord;
use crate::types::month::CalendarMonth;
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use bon::Builder;
use log::{error, info, warn};
use std::path::PathBuf;
use std::time::Duration;
use tokio::task;

pub const DEFAULT_INPUT: &str = "cities_200.csv";
pub const DEFAULT_CSV_NAME: &str = "dataset_monthly_normals.csv";
pub const DEFAULT_JSON_NAME: &str = "dataset_monthly_normals.json";
pub const DEFAULT_HTML_NAME: &str = "comfort_map_dropdown.html";
pub const DEFAULT_USER_AGENT: &str = "nomad-comfort-map";

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// ```
/// use comfort_map::LatLon;
///
/// let lisbon = LatLon(38.72, -9.14);
/// assert_eq!(lisbon.0, 38.72); // Latitude
/// assert_eq!(lisbon.1, -9.14); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon(pub f64, pub f64);

/// Settings for one run. Every field has a default, so `ComfortMapConfig::default()`
/// reproduces the stock batch job in the working directory.
///
/// ```
/// use comfort_map::ComfortMapConfig;
///
/// let config = ComfortMapConfig::builder()
///     .input("my_cities.csv")
///     .output_dir("out")
///     .station_limit(5)
///     .build();
/// assert_eq!(config.json_name, "dataset_monthly_normals.json");
/// ```
#[derive(Debug, Clone, Builder)]
pub struct ComfortMapConfig {
    /// City table with `City`, `Country` and optionally `Lat`, `Lon` columns.
    /// Rewritten with coordinates after geocoding.
    #[builder(into, default = PathBuf::from(DEFAULT_INPUT))]
    pub input: PathBuf,
    #[builder(into, default = PathBuf::from("."))]
    pub output_dir: PathBuf,
    #[builder(into, default = DEFAULT_CSV_NAME.to_string())]
    pub csv_name: String,
    #[builder(into, default = DEFAULT_JSON_NAME.to_string())]
    pub json_name: String,
    #[builder(into, default = DEFAULT_HTML_NAME.to_string())]
    pub html_name: String,
    #[builder(into, default = DEFAULT_USER_AGENT.to_string())]
    pub user_agent: String,
    /// Minimum spacing between geocoding requests.
    #[builder(default = Duration::from_secs(1))]
    pub geocode_delay: Duration,
    #[builder(default = 50.0)]
    pub max_distance_km: f64,
    /// Number of nearest normals stations to try per city.
    #[builder(default = 3)]
    pub station_limit: usize,
    /// Where station metadata and normals are cached. Defaults to the system
    /// cache directory.
    #[builder(into)]
    pub cache_dir: Option<PathBuf>,
    #[builder(default)]
    pub filter: ComfortFilter,
}

impl Default for ComfortMapConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ComfortMapConfig {
    pub fn output_paths(&self) -> OutputPaths {
        OutputPaths::in_dir(
            &self.output_dir,
            &self.csv_name,
            &self.json_name,
            &self.html_name,
        )
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub cities: usize,
    pub records: Vec<CityRecord>,
    pub skipped_no_coordinates: usize,
    pub skipped_no_data: usize,
    pub failed: usize,
    pub paths: OutputPaths,
    /// Cities inside the configured comfort filter, per month.
    pub comfortable_by_month: Vec<(CalendarMonth, usize)>,
}

/// The batch job, generic over where coordinates and normals come from.
///
/// [`ComfortMap::new`] wires up Nominatim and Meteostat; [`ComfortMap::with_sources`]
/// accepts any [`Geocoder`] and [`NormalsSource`].
pub struct ComfortMap<G: Geocoder, S: NormalsSource> {
    config: ComfortMapConfig,
    geocoder: G,
    normals: S,
}

impl ComfortMap<NominatimClient, MeteostatNormals> {
    /// Builds the networked pipeline. Nothing is downloaded until the run needs
    /// it; the station list is loaded on the first normals lookup.
    pub async fn new(config: ComfortMapConfig) -> Result<Self, ComfortMapError> {
        let cache_dir = match &config.cache_dir {
            Some(dir) => dir.clone(),
            None => get_cache_dir().map_err(ComfortMapError::CacheDirResolution)?,
        };
        ensure_cache_dir_exists(&cache_dir)
            .await
            .map_err(|e| ComfortMapError::CacheDirCreation(cache_dir.clone(), e))?;

        let geocoder = NominatimClient::new(&config.user_agent, config.geocode_delay)?;
        let normals =
            MeteostatNormals::new(&cache_dir, config.max_distance_km, config.station_limit);
        Ok(Self::with_sources(config, geocoder, normals))
    }
}

impl<G: Geocoder, S: NormalsSource> ComfortMap<G, S> {
    pub fn with_sources(config: ComfortMapConfig, geocoder: G, normals: S) -> Self {
        Self {
            config,
            geocoder,
            normals,
        }
    }

    /// Runs the whole job once.
    ///
    /// # Errors
    ///
    /// Returns [`ComfortMapError::NoDataCollected`] if no city produced a record,
    /// in which case nothing is written. Failures reading or rewriting the city
    /// table, or writing the artifacts, are also returned. Per-city lookup
    /// failures are not errors; they are counted in the [`RunSummary`].
    pub async fn run(&self) -> Result<RunSummary, ComfortMapError> {
        let input = self.config.input.clone();
        let table = task::spawn_blocking(move || CityTable::load(&input)).await??;
        info!(
            "Loaded {} cities from {}",
            table.len(),
            table.path().display()
        );

        let table = if table.has_coordinates() {
            info!("City table already has Lat/Lon; skipping geocoding");
            table
        } else {
            self.geocode_table(table).await?
        };

        let fetcher = ClimateFetcher::new(&self.normals);
        let mut records = Vec::new();
        let (mut skipped_no_coordinates, mut skipped_no_data, mut failed) = (0, 0, 0);

        for row in table.rows() {
            let Some(location) = row.location() else {
                info!("Skipping {}, {} (no coordinates)", row.city, row.country);
                skipped_no_coordinates += 1;
                continue;
            };
            match fetcher.fetch(location).await {
                Ok(Some(normals)) => {
                    info!("Fetched normals for {}, {}", row.city, row.country);
                    records.push(CityRecord::new(row, location, normals));
                }
                Ok(None) => {
                    warn!("No normals returned for {}, {}", row.city, row.country);
                    skipped_no_data += 1;
                }
                Err(e) => {
                    error!("Error for {}, {}: {}", row.city, row.country, e);
                    failed += 1;
                }
            }
        }

        if records.is_empty() {
            return Err(ComfortMapError::NoDataCollected {
                cities: table.len(),
            });
        }

        let paths = self.config.output_paths();
        write_all(&records, &paths, &self.config.filter)?;

        let comfortable_by_month = self.config.filter.count_by_month(&records);
        info!(
            "Collected {} of {} cities ({} without coordinates, {} without normals, {} failed)",
            records.len(),
            table.len(),
            skipped_no_coordinates,
            skipped_no_data,
            failed
        );
        for (month, count) in &comfortable_by_month {
            info!("{}: {} comfortable cities", month, count);
        }

        Ok(RunSummary {
            cities: table.len(),
            records,
            skipped_no_coordinates,
            skipped_no_data,
            failed,
            paths,
            comfortable_by_month,
        })
    }

    /// Geocodes every row and writes the coordinates back to the table file.
    async fn geocode_table(&self, mut table: CityTable) -> Result<CityTable, ComfortMapError> {
        info!("Geocoding {} cities...", table.len());
        let resolved = LocationResolver::new(&self.geocoder)
            .resolve_all(table.rows())
            .await;
        let found = resolved.iter().filter(|r| r.location().is_some()).count();
        info!("Geocoded {} of {} cities", found, resolved.len());

        table.set_coordinates(resolved)?;
        let table = task::spawn_blocking(move || table.save().map(|_| table)).await??;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocoding::resolver::tests::FakeGeocoder;
    use crate::normals::extract::tests::normals_frame;
    use crate::normals::fetcher::tests::{FakeAnswer, FakeNormalsSource};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const LISBON: LatLon = LatLon(38.72, -9.14);
    const REYKJAVIK: LatLon = LatLon(64.15, -21.94);
    const HANOI: LatLon = LatLon(21.03, 105.85);
    const QUITO: LatLon = LatLon(-0.18, -78.47);

    fn config_in(dir: &Path, input_csv: &str) -> ComfortMapConfig {
        let input = dir.join("cities.csv");
        fs::write(&input, input_csv).unwrap();
        ComfortMapConfig::builder()
            .input(input)
            .output_dir(dir.join("out"))
            .cache_dir(dir.join("cache"))
            .geocode_delay(Duration::ZERO)
            .build()
    }

    fn geocoder() -> FakeGeocoder {
        FakeGeocoder::new(&[
            ("Lisbon, Portugal", LISBON),
            ("Reykjavik, Iceland", REYKJAVIK),
            ("Hanoi", HANOI),
            ("Quito, Ecuador", QUITO),
        ])
    }

    fn normals() -> FakeNormalsSource {
        FakeNormalsSource::new(vec![
            (LISBON, FakeAnswer::Frame(normals_frame(12))),
            (REYKJAVIK, FakeAnswer::Frame(normals_frame(11))),
            (HANOI, FakeAnswer::Fail),
            (QUITO, FakeAnswer::NoData),
        ])
    }

    fn output_files(config: &ComfortMapConfig) -> [PathBuf; 3] {
        let paths = config.output_paths();
        [paths.csv, paths.json, paths.html]
    }

    #[test]
    fn test_config_defaults() {
        let config = ComfortMapConfig::default();
        assert_eq!(config.input, PathBuf::from("cities_200.csv"));
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.csv_name, "dataset_monthly_normals.csv");
        assert_eq!(config.html_name, "comfort_map_dropdown.html");
        assert_eq!(config.user_agent, "nomad-comfort-map");
        assert_eq!(config.geocode_delay, Duration::from_secs(1));
        assert_eq!(config.max_distance_km, 50.0);
        assert_eq!(config.station_limit, 3);
        assert_eq!(config.cache_dir, None);
        assert_eq!(config.filter, ComfortFilter::default());
    }

    #[tokio::test]
    async fn test_run_skips_failed_cities_and_writes_artifacts() -> Result<(), ComfortMapError> {
        let dir = TempDir::new().unwrap();
        let config = config_in(
            dir.path(),
            "City,Country\n\
             Lisbon,Portugal\n\
             Springfield,Nowhereland\n\
             Reykjavik,Iceland\n\
             Hanoi,Vietnam\n\
             Quito,Ecuador\n",
        );
        let geocoder = geocoder();
        let pipeline = ComfortMap::with_sources(config.clone(), geocoder, normals());

        let summary = pipeline.run().await?;

        assert_eq!(summary.cities, 5);
        assert_eq!(summary.records.len(), 1);
        assert_eq!(summary.records[0].city, "Lisbon");
        assert_eq!(summary.skipped_no_coordinates, 1);
        assert_eq!(summary.skipped_no_data, 2);
        assert_eq!(summary.failed, 1);

        for path in output_files(&config) {
            let contents = fs::read_to_string(&path).unwrap();
            assert!(!contents.contains("Springfield"), "{path:?}");
        }
        let csv_rows = fs::read_to_string(&summary.paths.csv).unwrap().lines().count() - 1;
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&summary.paths.json).unwrap()).unwrap();
        assert_eq!(csv_rows, 1);
        assert_eq!(json.as_array().map(Vec::len), Some(1));
        Ok(())
    }

    #[tokio::test]
    async fn test_run_saves_coordinates_and_skips_geocoding_next_time(
    ) -> Result<(), ComfortMapError> {
        let dir = TempDir::new().unwrap();
        let config = config_in(
            dir.path(),
            "City,Country\nLisbon,Portugal\nSpringfield,Nowhereland\n",
        );

        let first = ComfortMap::with_sources(config.clone(), geocoder(), normals());
        first.run().await?;

        let saved = CityTable::load(&config.input)?;
        assert!(saved.has_coordinates());
        assert_eq!(saved.rows()[0].location(), Some(LISBON));
        assert_eq!(saved.rows()[1].location(), None);

        let second = ComfortMap::with_sources(config, geocoder(), normals());
        let summary = second.run().await?;
        assert!(second.geocoder.queries().is_empty());
        assert_eq!(summary.records.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_run_with_existing_coordinates_does_not_geocode() -> Result<(), ComfortMapError>
    {
        let dir = TempDir::new().unwrap();
        let config = config_in(
            dir.path(),
            "City,Country,Lat,Lon\nLisbon,Portugal,38.72,-9.14\nNowhere,Land,,\n",
        );
        let pipeline = ComfortMap::with_sources(config, geocoder(), normals());

        let summary = pipeline.run().await?;

        assert!(pipeline.geocoder.queries().is_empty());
        assert_eq!(summary.records.len(), 1);
        assert_eq!(summary.skipped_no_coordinates, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_zero_resolvable_cities_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let config = config_in(
            dir.path(),
            "City,Country\nSpringfield,Nowhereland\nAtlantis,Ocean\n",
        );
        let pipeline = ComfortMap::with_sources(config.clone(), geocoder(), normals());

        let result = pipeline.run().await;

        assert!(matches!(
            result,
            Err(ComfortMapError::NoDataCollected { cities: 2 })
        ));
        for path in output_files(&config) {
            assert!(!path.exists(), "{path:?} should not be written");
        }
    }

    #[tokio::test]
    async fn test_station_list_failure_is_a_per_city_skip() {
        let dir = TempDir::new().unwrap();
        let config = config_in(
            dir.path(),
            "City,Country\nLisbon,Portugal\nReykjavik,Iceland\n",
        );
        let cache_dir = dir.path().join("cache");
        fs::create_dir_all(&cache_dir).unwrap();
        fs::write(cache_dir.join("stations_lite.bin"), b"bad").unwrap();
        let normals = MeteostatNormals::new(&cache_dir, 50.0, 3);
        let pipeline = ComfortMap::with_sources(config.clone(), geocoder(), normals);

        let result = pipeline.run().await;

        assert!(matches!(
            result,
            Err(ComfortMapError::NoDataCollected { cities: 2 })
        ));
        // Geocoding finished and was saved before any normals lookup
        let saved = CityTable::load(&config.input).unwrap();
        assert_eq!(saved.rows()[0].location(), Some(LISBON));
        assert_eq!(saved.rows()[1].location(), Some(REYKJAVIK));
        for path in output_files(&config) {
            assert!(!path.exists(), "{path:?} should not be written");
        }
    }

    #[tokio::test]
    async fn test_new_does_not_download() {
        let dir = TempDir::new().unwrap();
        let config = ComfortMapConfig::builder()
            .cache_dir(dir.path().join("cache"))
            .build();
        assert!(ComfortMap::new(config).await.is_ok());
        assert!(!dir.path().join("cache").join("stations_lite.bin").exists());
    }

    #[tokio::test]
    async fn test_comfortable_counts_use_configured_filter() -> Result<(), ComfortMapError> {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(dir.path(), "City,Country\nLisbon,Portugal\n");
        // Lisbon's fake normals run from 51.8 °F in January to 71.6 °F in December
        config.filter = ComfortFilter::new(60.0, 100.0, 100.0);
        let pipeline = ComfortMap::with_sources(config, geocoder(), normals());

        let summary = pipeline.run().await?;

        let counts: Vec<usize> = summary.comfortable_by_month.iter().map(|(_, n)| *n).collect();
        assert_eq!(counts[0], 0);
        assert_eq!(counts[11], 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_input_is_an_error() {
        let dir = TempDir::new().unwrap();
        let config = ComfortMapConfig::builder()
            .input(dir.path().join("absent.csv"))
            .output_dir(dir.path())
            .build();
        let pipeline = ComfortMap::with_sources(config, geocoder(), normals());
        assert!(matches!(
            pipeline.run().await,
            Err(ComfortMapError::Table(_))
        ));
    }
}
