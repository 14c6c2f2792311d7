//! Writes the three output artifacts from the collected city records.

pub mod csv_file;
pub mod error;
pub mod html;
pub mod json_file;

pub use csv_file::write_csv;
pub use html::{render_html, write_html};
pub use json_file::write_json;

use crate::emit::error::EmitError;
use crate::filter::ComfortFilter;
use crate::types::city::CityRecord;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Where the CSV, JSON and HTML artifacts are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub csv: PathBuf,
    pub json: PathBuf,
    pub html: PathBuf,
}

impl OutputPaths {
    pub fn in_dir(dir: &Path, csv_name: &str, json_name: &str, html_name: &str) -> Self {
        Self {
            csv: dir.join(csv_name),
            json: dir.join(json_name),
            html: dir.join(html_name),
        }
    }
}

/// Writes all three artifacts, replacing any previous run's files.
pub fn write_all(
    records: &[CityRecord],
    paths: &OutputPaths,
    filter: &ComfortFilter,
) -> Result<(), EmitError> {
    for path in [&paths.csv, &paths.json, &paths.html] {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| EmitError::OutputDirCreation(parent.to_path_buf(), e))?;
        }
    }

    write_csv(records, &paths.csv)?;
    debug!("Wrote {}", paths.csv.display());
    write_json(records, &paths.json)?;
    debug!("Wrote {}", paths.json.display());
    write_html(records, filter, &paths.html)?;
    debug!("Wrote {}", paths.html.display());
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::month::{CalendarMonth, MonthlyValues};
    use crate::types::normals::MonthlyNormals;

    /// Lisbon with full data (68 °F in January) and Reykjavik with unknown
    /// January precipitation.
    pub(crate) fn sample_records() -> Vec<CityRecord> {
        let full = |base: f64| MonthlyValues::from_fn(|m| Some(base + m.number() as f64));
        let mut reykjavik_prcp = full(2.0);
        reykjavik_prcp.set(CalendarMonth::Jan, None);

        vec![
            CityRecord {
                city: "Lisbon".to_string(),
                country: "Portugal".to_string(),
                lat: 38.72,
                lon: -9.14,
                normals: MonthlyNormals {
                    tavg_f: full(67.0),
                    tmin_f: full(50.0),
                    tmax_f: full(80.0),
                    prcp_in: full(1.0),
                },
            },
            CityRecord {
                city: "Reykjavik".to_string(),
                country: "Iceland".to_string(),
                lat: 64.15,
                lon: -21.94,
                normals: MonthlyNormals {
                    tavg_f: full(30.0),
                    tmin_f: full(25.0),
                    tmax_f: full(35.0),
                    prcp_in: reykjavik_prcp,
                },
            },
        ]
    }

    #[test]
    fn test_write_all_creates_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out");
        let paths = OutputPaths::in_dir(&out, "a.csv", "a.json", "a.html");

        write_all(&sample_records(), &paths, &ComfortFilter::default()).unwrap();

        assert!(paths.csv.is_file());
        assert!(paths.json.is_file());
        assert!(paths.html.is_file());
    }

    #[test]
    fn test_artifacts_agree_on_record_count() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::in_dir(dir.path(), "a.csv", "a.json", "a.html");
        let records = sample_records();
        write_all(&records, &paths, &ComfortFilter::default()).unwrap();

        let csv_rows = fs::read_to_string(&paths.csv).unwrap().lines().count() - 1;
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&paths.json).unwrap()).unwrap();
        assert_eq!(csv_rows, records.len());
        assert_eq!(json.as_array().map(Vec::len), Some(records.len()));
    }
}
