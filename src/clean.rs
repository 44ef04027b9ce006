use tracing::info;

use crate::error::CleanError;
use crate::models::{CleanReport, PageViewTable};

pub const LOWER_CUTOFF: f64 = 0.025;
pub const UPPER_CUTOFF: f64 = 0.975;

/// Quantile of an ascending-sorted slice; `None` when empty or `p` is outside [0, 1].
///
/// Linear interpolation between the order statistics around rank `p * (n - 1)`.
pub fn quantile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }

    let rank = p * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

pub fn sorted_values<I>(values: I) -> Vec<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut sorted: Vec<f64> = values.into_iter().collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Keeps entries with `low <= value <= high`, date order retained.
pub fn filter_between(table: &PageViewTable, low: f64, high: f64) -> PageViewTable {
    table.retain_by(|entry| {
        let value = entry.value as f64;
        value >= low && value <= high
    })
}

/// Drops the bottom and top 2.5% of values.
///
/// Both cutoffs come from the distribution of `table` as given; they are not
/// recomputed on the filtered result.
pub fn clean(table: &PageViewTable) -> Result<(PageViewTable, CleanReport), CleanError> {
    let sorted = sorted_values(table.values().map(|v| v as f64));
    let (Some(low), Some(high)) = (
        quantile(&sorted, LOWER_CUTOFF),
        quantile(&sorted, UPPER_CUTOFF),
    ) else {
        return Err(CleanError::Empty);
    };

    let cleaned = filter_between(table, low, high);
    if cleaned.is_empty() {
        return Err(CleanError::NothingLeft { low, high });
    }

    let report = CleanReport {
        low,
        high,
        kept: cleaned.len(),
        dropped: table.len() - cleaned.len(),
    };
    info!(
        low = report.low,
        high = report.high,
        kept = report.kept,
        dropped = report.dropped,
        "removed outliers"
    );
    Ok((cleaned, report))
}
