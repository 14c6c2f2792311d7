//! Calendar months and per-month value series.
//!
//! Every per-month mapping in this crate is keyed by the same twelve labels, in
//! calendar order. [`MonthlyValues`] stores one optional value per month in a fixed
//! array, so a mapping can never be missing a key: an unknown value is `None`.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};

/// One of the twelve calendar months.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub enum CalendarMonth {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl CalendarMonth {
    /// All months in calendar order.
    pub const ALL: [CalendarMonth; 12] = [
        CalendarMonth::Jan,
        CalendarMonth::Feb,
        CalendarMonth::Mar,
        CalendarMonth::Apr,
        CalendarMonth::May,
        CalendarMonth::Jun,
        CalendarMonth::Jul,
        CalendarMonth::Aug,
        CalendarMonth::Sep,
        CalendarMonth::Oct,
        CalendarMonth::Nov,
        CalendarMonth::Dec,
    ];

    /// The three-letter label used as column prefix and JSON key (e.g. `"Jan"`).
    pub fn label(self) -> &'static str {
        match self {
            CalendarMonth::Jan => "Jan",
            CalendarMonth::Feb => "Feb",
            CalendarMonth::Mar => "Mar",
            CalendarMonth::Apr => "Apr",
            CalendarMonth::May => "May",
            CalendarMonth::Jun => "Jun",
            CalendarMonth::Jul => "Jul",
            CalendarMonth::Aug => "Aug",
            CalendarMonth::Sep => "Sep",
            CalendarMonth::Oct => "Oct",
            CalendarMonth::Nov => "Nov",
            CalendarMonth::Dec => "Dec",
        }
    }

    /// Month number, 1 for January through 12 for December.
    pub fn number(self) -> u32 {
        self.index() as u32 + 1
    }

    /// Resolves a month number (1-12). Returns `None` for anything else.
    pub fn from_number(number: i64) -> Option<CalendarMonth> {
        if (1..=12).contains(&number) {
            Some(Self::ALL[(number - 1) as usize])
        } else {
            None
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl Display for CalendarMonth {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Twelve optional values, one per calendar month.
///
/// Serializes as a JSON object keyed by month label in calendar order, with
/// `null` for unknown values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MonthlyValues([Option<f64>; 12]);

impl MonthlyValues {
    /// A series where every month is unknown.
    pub fn empty() -> Self {
        Self([None; 12])
    }

    /// Builds a series by evaluating `f` for each month in calendar order.
    pub fn from_fn(mut f: impl FnMut(CalendarMonth) -> Option<f64>) -> Self {
        let mut values = [None; 12];
        for month in CalendarMonth::ALL {
            values[month.index()] = f(month);
        }
        Self(values)
    }

    pub fn get(&self, month: CalendarMonth) -> Option<f64> {
        self.0[month.index()]
    }

    pub fn set(&mut self, month: CalendarMonth, value: Option<f64>) {
        self.0[month.index()] = value;
    }

    /// Iterates `(month, value)` pairs in calendar order.
    pub fn iter(&self) -> impl Iterator<Item = (CalendarMonth, Option<f64>)> + '_ {
        CalendarMonth::ALL.into_iter().map(|m| (m, self.get(m)))
    }

    /// The month labels this series is keyed by. Always all twelve.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> {
        CalendarMonth::ALL.into_iter().map(CalendarMonth::label)
    }
}

impl Serialize for MonthlyValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(12))?;
        for (month, value) in self.iter() {
            map.serialize_entry(month.label(), &value)?;
        }
        map.end()
    }
}
