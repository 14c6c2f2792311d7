//! Turns a station's normals frame into [`MonthlyNormals`].
//!
//! The frame may hold several averaging periods (e.g. 1961-1990 and 1991-2020);
//! only the latest one is used. A period that does not cover all twelve months
//! yields no result at all.

use crate::normals::error::NormalsError;
use crate::types::month::{CalendarMonth, MonthlyValues};
use crate::types::normals::MonthlyNormals;
use crate::units::{c_to_f, mm_to_in};
use polars::prelude::*;

/// Extracts the latest period's monthly normals, converted to °F and inches.
///
/// Returns `Ok(None)` if the frame has fewer than twelve monthly rows for that
/// period. A missing value column (`tavg`, `tmin`, `tmax` or `prcp`) yields an
/// all-`None` series.
pub fn extract_normals(frame: &DataFrame) -> Result<Option<MonthlyNormals>, NormalsError> {
    if frame.height() < 12 {
        return Ok(None);
    }

    let months = int_values(frame, "month")?
        .ok_or_else(|| NormalsError::MissingColumn("month".to_string()))?;
    let period_rows = latest_period_rows(frame)?;

    let mut row_for_month: [Option<usize>; 12] = [None; 12];
    for idx in period_rows {
        let Some(month) = months[idx].and_then(CalendarMonth::from_number) else {
            continue;
        };
        let slot = &mut row_for_month[(month.number() - 1) as usize];
        if slot.is_none() {
            *slot = Some(idx);
        }
    }
    if row_for_month.iter().any(Option::is_none) {
        return Ok(None);
    }

    let series = |name: &str, convert: fn(Option<f64>) -> Option<f64>| {
        let values = float_values(frame, name)?;
        Ok::<_, NormalsError>(match values {
            Some(values) => MonthlyValues::from_fn(|month| {
                let idx = row_for_month[(month.number() - 1) as usize]?;
                convert(values[idx])
            }),
            None => MonthlyValues::empty(),
        })
    };

    Ok(Some(MonthlyNormals {
        tavg_f: series("tavg", c_to_f)?,
        tmin_f: series("tmin", c_to_f)?,
        tmax_f: series("tmax", c_to_f)?,
        prcp_in: series("prcp", mm_to_in)?,
    }))
}

/// Indices of the rows belonging to the period with the greatest end year (ties
/// broken by start year). Frames without period columns are a single period.
fn latest_period_rows(frame: &DataFrame) -> Result<Vec<usize>, NormalsError> {
    let (Some(starts), Some(ends)) = (
        int_values(frame, "start_year")?,
        int_values(frame, "end_year")?,
    ) else {
        return Ok((0..frame.height()).collect());
    };

    let periods: Vec<Option<(i64, i64)>> = ends
        .iter()
        .zip(&starts)
        .map(|(end, start)| Some(((*end)?, (*start)?)))
        .collect();
    let Some(latest) = periods.iter().flatten().max().copied() else {
        return Ok((0..frame.height()).collect());
    };

    Ok(periods
        .iter()
        .enumerate()
        .filter(|(_, period)| **period == Some(latest))
        .map(|(idx, _)| idx)
        .collect())
}

fn int_values(frame: &DataFrame, name: &str) -> Result<Option<Vec<Option<i64>>>, NormalsError> {
    let Ok(column) = frame.column(name) else {
        return Ok(None);
    };
    let column = column.cast(&DataType::Int64)?;
    Ok(Some(column.i64()?.into_iter().collect()))
}

fn float_values(frame: &DataFrame, name: &str) -> Result<Option<Vec<Option<f64>>>, NormalsError> {
    let Ok(column) = frame.column(name) else {
        return Ok(None);
    };
    let column = column.cast(&DataType::Float64)?;
    Ok(Some(column.f64()?.into_iter().collect()))
}
