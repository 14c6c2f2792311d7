mod cities;
mod comfort_map;
mod emit;
mod error;
mod filter;
mod geocoding;
mod normals;
mod stations;
mod types;
mod units;
mod utils;

pub use comfort_map::*;
pub use error::ComfortMapError;

pub use cities::table::CityTable;
pub use emit::csv_file::{column_names, records_to_frame};
pub use emit::json_file::records_to_json;
pub use emit::{render_html, write_all, write_csv, write_html, write_json, OutputPaths};
pub use filter::*;
pub use geocoding::nominatim::NominatimClient;
pub use geocoding::rate_limiter::RateLimiter;
pub use geocoding::resolver::LocationResolver;
pub use geocoding::Geocoder;
pub use normals::extract::extract_normals;
pub use normals::fetcher::ClimateFetcher;
pub use normals::loader::{NormalsLoader, NORMALS_COLUMNS};
pub use normals::source::{MeteostatNormals, NormalsSource};
pub use stations::locate_station::StationLocator;
pub use units::{c_to_f, mm_to_in};

pub use types::city::{CityRecord, CityRow};
pub use types::month::{CalendarMonth, MonthlyValues};
pub use types::normals::MonthlyNormals;
pub use types::station::*;

pub use cities::error::TableError;
pub use emit::error::EmitError;
pub use geocoding::error::GeocodeError;
pub use normals::error::NormalsError;
pub use stations::error::LocateStationError;
