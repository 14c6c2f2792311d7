//! The JSON artifact: an array of per-city objects, nested by field then month.

use crate::emit::error::EmitError;
use crate::types::city::CityRecord;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub fn records_to_json(records: &[CityRecord]) -> Result<String, EmitError> {
    Ok(serde_json::to_string(records)?)
}

pub fn write_json(records: &[CityRecord], path: &Path) -> Result<(), EmitError> {
    let file = File::create(path).map_err(|e| EmitError::WriteIo(path.to_path_buf(), e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, records)?;
    writer
        .flush()
        .map_err(|e| EmitError::WriteIo(path.to_path_buf(), e))
}
