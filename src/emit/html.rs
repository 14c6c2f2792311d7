//! The self-contained map document.
//!
//! The page shell lives in `templates/comfort_map.html`; this module fills its
//! `{{PLACEHOLDER}}` slots with the month selector, filter defaults and the
//! embedded city data.

use crate::emit::error::EmitError;
use crate::filter::ComfortFilter;
use crate::types::city::CityRecord;
use crate::types::month::CalendarMonth;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs;
use std::path::Path;

const TEMPLATE: &str = include_str!("../../templates/comfort_map.html");

/// Renders the map document around `records`.
///
/// The data literal is inserted last so city names can never be mistaken for
/// template placeholders.
pub fn render_html(
    records: &[CityRecord],
    filter: &ComfortFilter,
    generated_at: DateTime<Utc>,
) -> Result<String, EmitError> {
    let month_labels: Vec<&str> = CalendarMonth::ALL.iter().map(|m| m.label()).collect();
    let month_options = month_labels
        .iter()
        .map(|m| format!("        <option value=\"{m}\">{m}</option>"))
        .collect::<Vec<_>>()
        .join("\n");

    let html = TEMPLATE
        .replace(
            "{{GENERATED_AT}}",
            &generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        )
        .replace("{{MONTH_OPTIONS}}", &month_options)
        .replace("{{COMFORT_MIN}}", &filter.min_temp_f.to_string())
        .replace("{{COMFORT_MAX}}", &filter.max_temp_f.to_string())
        .replace("{{MAX_PRCP}}", &filter.max_prcp_in.to_string())
        .replace("{{MONTHS}}", &script_literal(&month_labels)?)
        .replace("{{CITY_DATA}}", &script_literal(records)?);
    Ok(html)
}

pub fn write_html(
    records: &[CityRecord],
    filter: &ComfortFilter,
    path: &Path,
) -> Result<(), EmitError> {
    let html = render_html(records, filter, Utc::now())?;
    fs::write(path, html).map_err(|e| EmitError::WriteIo(path.to_path_buf(), e))
}

/// JSON that is safe to place inside a `<script>` element.
fn script_literal<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, EmitError> {
    let json = serde_json::to_string(value)?;
    Ok(json
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026"))
}
