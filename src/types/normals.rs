use crate::types::month::MonthlyValues;
use serde::Serialize;

/// Monthly climate normals for one location, already converted to imperial units.
///
/// All four series share the same twelve month keys; a field the data source
/// could not provide is an all-`None` series rather than a missing one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyNormals {
    pub tavg_f: MonthlyValues, // average temperature, °F
    pub tmin_f: MonthlyValues, // average daily minimum, °F
    pub tmax_f: MonthlyValues, // average daily maximum, °F
    pub prcp_in: MonthlyValues, // monthly precipitation total, inches
}

impl MonthlyNormals {
    /// Field names, used as JSON keys and flat column suffixes (`Jan_tavg_f`).
    pub const FIELD_NAMES: [&'static str; 4] = ["tavg_f", "tmin_f", "tmax_f", "prcp_in"];

    /// The four series in [`MonthlyNormals::FIELD_NAMES`] order.
    pub fn fields(&self) -> [(&'static str, &MonthlyValues); 4] {
        [
            (Self::FIELD_NAMES[0], &self.tavg_f),
            (Self::FIELD_NAMES[1], &self.tmin_f),
            (Self::FIELD_NAMES[2], &self.tmax_f),
            (Self::FIELD_NAMES[3], &self.prcp_in),
        ]
    }
}
