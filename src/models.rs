use chrono::{Datelike, NaiveDate};

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageView {
    pub date: NaiveDate,
    pub value: u64,
}

impl PageView {
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// Zero-based month index into [`MONTH_NAMES`].
    pub fn month_index(&self) -> usize {
        self.date.month0() as usize
    }
}

/// Date-ordered series with at most one entry per day.
///
/// Only the loader and the cleaner build tables, so the ordering and
/// uniqueness hold for every instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageViewTable {
    entries: Vec<PageView>,
}

impl PageViewTable {
    /// Caller guarantees `entries` is sorted ascending by date with no duplicates.
    pub(crate) fn from_sorted(entries: Vec<PageView>) -> Self {
        debug_assert!(entries.windows(2).all(|w| w[0].date < w[1].date));
        Self { entries }
    }

    pub fn entries(&self) -> &[PageView] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.iter().map(|entry| entry.value)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.entries.first().map(|entry| entry.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.entries.last().map(|entry| entry.date)
    }

    /// Keeps the entries matching `keep`, preserving date order.
    pub fn retain_by<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&PageView) -> bool,
    {
        Self {
            entries: self.entries.iter().copied().filter(|e| keep(e)).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleanReport {
    pub low: f64,
    pub high: f64,
    pub kept: usize,
    pub dropped: usize,
}

/// Year-by-month mean page views. `None` marks a month without data.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyAverages {
    pub rows: Vec<YearRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearRow {
    pub year: i32,
    pub months: [Option<f64>; 12],
}

impl MonthlyAverages {
    pub fn max_value(&self) -> Option<f64> {
        self.rows
            .iter()
            .flat_map(|row| row.months.iter().flatten().copied())
            .reduce(f64::max)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartitionGroup {
    pub label: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
}
