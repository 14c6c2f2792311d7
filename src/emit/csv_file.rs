//! The flat tabular artifact: one row per city, four columns per month.

use crate::emit::error::EmitError;
use crate::types::city::CityRecord;
use crate::types::month::CalendarMonth;
use crate::types::normals::MonthlyNormals;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Column names in output order: `City, Country, Lat, Lon, Jan_tavg_f, Jan_tmin_f, ...`.
pub fn column_names() -> Vec<String> {
    let mut names: Vec<String> = ["City", "Country", "Lat", "Lon"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    for month in CalendarMonth::ALL {
        for field in MonthlyNormals::FIELD_NAMES {
            names.push(format!("{}_{}", month.label(), field));
        }
    }
    names
}

/// Flattens the records into a DataFrame with [`column_names`] columns.
pub fn records_to_frame(records: &[CityRecord]) -> PolarsResult<DataFrame> {
    let mut columns = vec![
        Column::new(
            "City".into(),
            records.iter().map(|r| r.city.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(
            "Country".into(),
            records.iter().map(|r| r.country.as_str()).collect::<Vec<_>>(),
        ),
        Column::new("Lat".into(), records.iter().map(|r| r.lat).collect::<Vec<_>>()),
        Column::new("Lon".into(), records.iter().map(|r| r.lon).collect::<Vec<_>>()),
    ];

    for month in CalendarMonth::ALL {
        for (idx, field) in MonthlyNormals::FIELD_NAMES.iter().enumerate() {
            let values: Vec<Option<f64>> = records
                .iter()
                .map(|r| r.normals.fields()[idx].1.get(month))
                .collect();
            let name = format!("{}_{}", month.label(), field);
            columns.push(Column::new(name.into(), values));
        }
    }

    DataFrame::new(columns)
}

pub fn write_csv(records: &[CityRecord], path: &Path) -> Result<(), EmitError> {
    let mut frame =
        records_to_frame(records).map_err(|e| EmitError::Frame(path.to_path_buf(), e))?;
    let mut file = File::create(path).map_err(|e| EmitError::WriteIo(path.to_path_buf(), e))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut frame)
        .map_err(|e| EmitError::CsvWrite(path.to_path_buf(), e))
}
