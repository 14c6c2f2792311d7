//! The input city table: a CSV with `City` and `Country` columns and, once
//! geocoded, `Lat` and `Lon`.
//!
//! The table is read through Polars and kept as a `DataFrame` so that saving it
//! back only replaces the coordinate columns and leaves any other columns intact.

use crate::cities::error::TableError;
use crate::types::city::CityRow;
use log::info;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const CITY_COLUMN: &str = "City";
pub const COUNTRY_COLUMN: &str = "Country";
pub const LAT_COLUMN: &str = "Lat";
pub const LON_COLUMN: &str = "Lon";

pub struct CityTable {
    path: PathBuf,
    frame: DataFrame,
    rows: Vec<CityRow>,
    has_coordinates: bool,
}

impl CityTable {
    /// Reads the table at `path`. Blocking; call from `spawn_blocking` in async code.
    pub fn load(path: &Path) -> Result<Self, TableError> {
        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .map_err(|e| TableError::Read(path.to_path_buf(), e))?
            .finish()
            .map_err(|e| TableError::Read(path.to_path_buf(), e))?;
        Self::from_frame(path, frame)
    }

    /// Wraps an already parsed frame. `path` is where [`CityTable::save`] writes.
    pub fn from_frame(path: &Path, frame: DataFrame) -> Result<Self, TableError> {
        let cities = string_values(path, &frame, CITY_COLUMN)?;
        let countries = string_values(path, &frame, COUNTRY_COLUMN)?;
        let has_coordinates =
            frame.column(LAT_COLUMN).is_ok() && frame.column(LON_COLUMN).is_ok();

        let (lats, lons) = if has_coordinates {
            (
                float_values(path, &frame, LAT_COLUMN)?,
                float_values(path, &frame, LON_COLUMN)?,
            )
        } else {
            (vec![None; frame.height()], vec![None; frame.height()])
        };

        let rows = cities
            .into_iter()
            .zip(countries)
            .zip(lats.into_iter().zip(lons))
            .map(|((city, country), (lat, lon))| CityRow {
                city,
                country,
                lat,
                lon,
            })
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            frame,
            rows,
            has_coordinates,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> &[CityRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether the table already carried both `Lat` and `Lon` columns when loaded
    /// (or has since been given coordinates).
    pub fn has_coordinates(&self) -> bool {
        self.has_coordinates
    }

    /// Replaces every row's coordinates, in row order.
    pub fn set_coordinates(&mut self, rows: Vec<CityRow>) -> Result<(), TableError> {
        if rows.len() != self.rows.len() {
            return Err(TableError::LengthMismatch {
                path: self.path.clone(),
                rows: self.rows.len(),
                values: rows.len(),
            });
        }
        self.rows = rows;
        self.has_coordinates = true;
        Ok(())
    }

    /// Writes the table back to its source path with `Lat`/`Lon` columns set from
    /// the current rows. The file is replaced atomically.
    pub fn save(&self) -> Result<(), TableError> {
        let mut frame = self.frame.clone();
        let lats: Vec<Option<f64>> = self.rows.iter().map(|r| r.lat).collect();
        let lons: Vec<Option<f64>> = self.rows.iter().map(|r| r.lon).collect();
        frame
            .with_column(Column::new(LAT_COLUMN.into(), lats))
            .and_then(|f| f.with_column(Column::new(LON_COLUMN.into(), lons)))
            .map_err(|e| TableError::Frame {
                path: self.path.clone(),
                source: e,
            })?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp_file = NamedTempFile::new_in(dir)
            .map_err(|e| TableError::WriteIo(self.path.clone(), e))?;
        CsvWriter::new(temp_file.as_file_mut())
            .include_header(true)
            .finish(&mut frame)
            .map_err(|e| TableError::WritePolars(self.path.clone(), e))?;
        temp_file
            .persist(&self.path)
            .map_err(|e| TableError::WriteIo(self.path.clone(), e.error))?;

        info!(
            "Saved {} rows with coordinates to {}",
            self.rows.len(),
            self.path.display()
        );
        Ok(())
    }
}

fn string_values(path: &Path, frame: &DataFrame, name: &str) -> Result<Vec<String>, TableError> {
    let column = frame.column(name).map_err(|_| TableError::MissingColumn {
        path: path.to_path_buf(),
        column: name.to_string(),
    })?;
    let column = column
        .cast(&DataType::String)
        .map_err(|e| TableError::Frame {
            path: path.to_path_buf(),
            source: e,
        })?;
    let values = column.str().map_err(|e| TableError::Frame {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(values
        .into_iter()
        .map(|v| v.map(str::trim).unwrap_or_default().to_string())
        .collect())
}

fn float_values(
    path: &Path,
    frame: &DataFrame,
    name: &str,
) -> Result<Vec<Option<f64>>, TableError> {
    let column = frame.column(name).map_err(|_| TableError::MissingColumn {
        path: path.to_path_buf(),
        column: name.to_string(),
    })?;
    let column = column
        .cast(&DataType::Float64)
        .map_err(|e| TableError::Frame {
            path: path.to_path_buf(),
            source: e,
        })?;
    let values = column.f64().map_err(|e| TableError::Frame {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(values
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_table(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("cities.csv");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_without_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(dir.path(), "City,Country\nLisbon,Portugal\nHanoi,Vietnam\n");

        let table = CityTable::load(&path).unwrap();
        assert!(!table.has_coordinates());
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0], CityRow::new("Lisbon", "Portugal"));
        assert_eq!(table.rows()[1].city, "Hanoi");
        assert!(table.rows().iter().all(|r| r.location().is_none()));
    }

    #[test]
    fn test_load_with_coordinates_and_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(
            dir.path(),
            "City,Country,Lat,Lon\nLisbon,Portugal,38.72,-9.14\nSpringfield,Nowhereland,,\n",
        );

        let table = CityTable::load(&path).unwrap();
        assert!(table.has_coordinates());
        assert_eq!(table.rows()[0].lat, Some(38.72));
        assert_eq!(table.rows()[0].lon, Some(-9.14));
        assert_eq!(table.rows()[1].location(), None);
    }

    #[test]
    fn test_missing_country_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(dir.path(), "City\nLisbon\n");

        let result = CityTable::load(&path);
        assert!(matches!(
            result,
            Err(TableError::MissingColumn { ref column, .. }) if column == "Country"
        ));
    }

    #[test]
    fn test_save_writes_coordinates_and_keeps_other_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(
            dir.path(),
            "City,Country,Note\nLisbon,Portugal,coast\nSpringfield,Nowhereland,\n",
        );

        let mut table = CityTable::load(&path).unwrap();
        let mut rows = table.rows().to_vec();
        rows[0].lat = Some(38.72);
        rows[0].lon = Some(-9.14);
        table.set_coordinates(rows).unwrap();
        table.save().unwrap();

        let reloaded = CityTable::load(&path).unwrap();
        assert!(reloaded.has_coordinates());
        assert_eq!(reloaded.rows()[0].lat, Some(38.72));
        assert_eq!(reloaded.rows()[1].lat, None);

        let header = fs::read_to_string(&path).unwrap();
        assert!(header.starts_with("City,Country,Note,Lat,Lon"));
    }

    #[test]
    fn test_set_coordinates_rejects_wrong_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(dir.path(), "City,Country\nLisbon,Portugal\n");

        let mut table = CityTable::load(&path).unwrap();
        assert!(matches!(
            table.set_coordinates(vec![]),
            Err(TableError::LengthMismatch { rows: 1, values: 0, .. })
        ));
        assert!(!table.has_coordinates());
    }
}
