//! The comfort filter applied by the map, mirrored here so the dataset can be
//! summarized with the same rule the browser uses.

use crate::types::city::CityRecord;
use crate::types::month::CalendarMonth;
use serde::Serialize;

pub const DEFAULT_MIN_TEMP_F: f64 = 50.0;
pub const DEFAULT_MAX_TEMP_F: f64 = 75.0;
pub const DEFAULT_MAX_PRCP_IN: f64 = 5.0;

/// A comfortable range of average temperature plus a precipitation cap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComfortFilter {
    pub min_temp_f: f64,
    pub max_temp_f: f64,
    pub max_prcp_in: f64,
}

impl Default for ComfortFilter {
    fn default() -> Self {
        Self {
            min_temp_f: DEFAULT_MIN_TEMP_F,
            max_temp_f: DEFAULT_MAX_TEMP_F,
            max_prcp_in: DEFAULT_MAX_PRCP_IN,
        }
    }
}

impl ComfortFilter {
    pub fn new(min_temp_f: f64, max_temp_f: f64, max_prcp_in: f64) -> Self {
        Self {
            min_temp_f,
            max_temp_f,
            max_prcp_in,
        }
    }

    /// Whether `record` is comfortable in `month`.
    ///
    /// The month's average temperature must be known and inside the inclusive
    /// range. Unknown precipitation never excludes a city.
    pub fn matches(&self, record: &CityRecord, month: CalendarMonth) -> bool {
        let Some(tavg) = record.normals.tavg_f.get(month) else {
            return false;
        };
        let temp_ok = tavg >= self.min_temp_f && tavg <= self.max_temp_f;
        let prcp_ok = record
            .normals
            .prcp_in
            .get(month)
            .map_or(true, |p| p <= self.max_prcp_in);
        temp_ok && prcp_ok
    }

    /// Number of comfortable records for each month, in calendar order.
    pub fn count_by_month(&self, records: &[CityRecord]) -> Vec<(CalendarMonth, usize)> {
        CalendarMonth::ALL
            .into_iter()
            .map(|month| {
                let count = records.iter().filter(|r| self.matches(r, month)).count();
                (month, count)
            })
            .collect()
    }
}
