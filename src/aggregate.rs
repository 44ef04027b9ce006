use std::collections::BTreeMap;

use crate::clean::{quantile, sorted_values};
use crate::models::{
    BoxStats, MonthlyAverages, PageViewTable, PartitionGroup, YearRow, MONTH_ABBREVIATIONS,
};

const WHISKER_REACH: f64 = 1.5;

/// Mean page views per (year, month), pivoted to one row per year.
pub fn monthly_averages(table: &PageViewTable) -> MonthlyAverages {
    let mut sums: BTreeMap<i32, [(f64, usize); 12]> = BTreeMap::new();

    for entry in table.entries() {
        let row = sums.entry(entry.year()).or_insert([(0.0, 0); 12]);
        let cell = &mut row[entry.month_index()];
        cell.0 += entry.value as f64;
        cell.1 += 1;
    }

    let rows = sums
        .into_iter()
        .map(|(year, cells)| YearRow {
            year,
            months: cells.map(|(sum, count)| {
                if count == 0 {
                    None
                } else {
                    Some(sum / count as f64)
                }
            }),
        })
        .collect();

    MonthlyAverages { rows }
}

/// One group per year present, ascending.
pub fn year_partition(table: &PageViewTable) -> Vec<PartitionGroup> {
    let mut by_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for entry in table.entries() {
        by_year
            .entry(entry.year())
            .or_default()
            .push(entry.value as f64);
    }

    by_year
        .into_iter()
        .map(|(year, values)| PartitionGroup {
            label: year.to_string(),
            values,
        })
        .collect()
}

/// Twelve groups `Jan`..`Dec`, each pooling that month across every year.
pub fn month_partition(table: &PageViewTable) -> Vec<PartitionGroup> {
    let mut groups: Vec<PartitionGroup> = MONTH_ABBREVIATIONS
        .iter()
        .map(|label| PartitionGroup {
            label: (*label).to_string(),
            values: Vec::new(),
        })
        .collect();

    for entry in table.entries() {
        groups[entry.month_index()].values.push(entry.value as f64);
    }

    groups
}

/// Quartiles and whiskers for one box; `None` for an empty group.
///
/// Whiskers end at the most extreme data points within 1.5 IQR of the box.
pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    let sorted = sorted_values(values.iter().copied());
    let q1 = quantile(&sorted, 0.25)?;
    let median = quantile(&sorted, 0.5)?;
    let q3 = quantile(&sorted, 0.75)?;
    let reach = WHISKER_REACH * (q3 - q1);

    let lower_whisker = sorted
        .iter()
        .copied()
        .find(|&v| v >= q1 - reach)
        .unwrap_or(q1);
    let upper_whisker = sorted
        .iter()
        .rev()
        .copied()
        .find(|&v| v <= q3 + reach)
        .unwrap_or(q3);

    Some(BoxStats {
        q1,
        median,
        q3,
        lower_whisker,
        upper_whisker,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageView;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn table(rows: &[((i32, u32, u32), u64)]) -> PageViewTable {
        let mut entries: Vec<PageView> = rows
            .iter()
            .map(|&((y, m, d), value)| PageView {
                date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
                value,
            })
            .collect();
        entries.sort_by_key(|e| e.date);
        PageViewTable::from_sorted(entries)
    }

    fn mean_for(averages: &MonthlyAverages, year: i32, month: u32) -> Option<f64> {
        let index = month.checked_sub(1)? as usize;
        averages
            .rows
            .iter()
            .find(|row| row.year == year)
            .and_then(|row| row.months.get(index).copied().flatten())
    }

    #[test]
    fn monthly_mean_uses_only_that_month() {
        let table = table(&[
            ((2016, 5, 1), 10),
            ((2016, 5, 2), 20),
            ((2016, 5, 3), 30),
            ((2016, 6, 1), 1000),
            ((2017, 5, 1), 500),
        ]);
        let averages = monthly_averages(&table);

        assert_relative_eq!(mean_for(&averages, 2016, 5).unwrap(), 20.0);
        assert_relative_eq!(mean_for(&averages, 2016, 6).unwrap(), 1000.0);
        assert_relative_eq!(mean_for(&averages, 2017, 5).unwrap(), 500.0);
        assert_eq!(mean_for(&averages, 2016, 13), None);
        assert_eq!(mean_for(&averages, 2016, 0), None);
    }

    #[test]
    fn missing_months_are_none_not_zero() {
        let averages = monthly_averages(&table(&[((2016, 5, 1), 10), ((2016, 12, 1), 40)]));

        assert_eq!(averages.rows.len(), 1);
        let row = &averages.rows[0];
        assert_eq!(row.year, 2016);
        assert_eq!(row.months.iter().filter(|m| m.is_some()).count(), 2);
        assert_eq!(row.months[0], None);
        assert_eq!(row.months[4], Some(10.0));
        assert_eq!(row.months[11], Some(40.0));
        assert_eq!(averages.max_value(), Some(40.0));
    }

    #[test]
    fn years_are_ascending() {
        let averages = monthly_averages(&table(&[
            ((2019, 1, 1), 1),
            ((2016, 5, 1), 1),
            ((2017, 3, 1), 1),
        ]));
        let years: Vec<i32> = averages.rows.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2016, 2017, 2019]);
    }

    #[test]
    fn year_partition_collects_every_value_in_year() {
        let table = table(&[
            ((2016, 5, 1), 1),
            ((2016, 11, 3), 2),
            ((2017, 1, 1), 3),
            ((2017, 12, 31), 4),
        ]);
        let groups = year_partition(&table);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, "2016");
        assert_eq!(groups[0].values, vec![1.0, 2.0]);
        assert_eq!(groups[1].label, "2017");
        assert_eq!(groups[1].values, vec![3.0, 4.0]);
    }

    #[test]
    fn month_partition_pools_across_years_in_calendar_order() {
        let table = table(&[
            ((2016, 8, 1), 1),
            ((2017, 8, 1), 2),
            ((2017, 4, 1), 3),
            ((2018, 1, 5), 4),
        ]);
        let groups = month_partition(&table);

        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, MONTH_ABBREVIATIONS.to_vec());
        assert_eq!(groups[0].values, vec![4.0]);
        assert_eq!(groups[3].values, vec![3.0]);
        assert_eq!(groups[7].values, vec![1.0, 2.0]);
        assert!(groups[1].values.is_empty());
    }

    #[test]
    fn box_stats_uses_interpolated_quartiles() {
        let stats = box_stats(&[5.0, 1.0, 3.0, 2.0, 4.0]).unwrap();
        assert_relative_eq!(stats.q1, 2.0);
        assert_relative_eq!(stats.median, 3.0);
        assert_relative_eq!(stats.q3, 4.0);
        assert_relative_eq!(stats.lower_whisker, 1.0);
        assert_relative_eq!(stats.upper_whisker, 5.0);
        assert_relative_eq!(stats.q3 - stats.q1, 2.0);
    }

    #[test]
    fn whiskers_stop_at_last_point_inside_fence() {
        // fences at -3.5 and 14.5
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 100.0];
        let stats = box_stats(&values).unwrap();
        assert_relative_eq!(stats.q1, 3.25);
        assert_relative_eq!(stats.q3, 7.75);
        assert_relative_eq!(stats.lower_whisker, 1.0);
        assert_relative_eq!(stats.upper_whisker, 9.0);
    }

    #[test]
    fn empty_group_has_no_box() {
        assert_eq!(box_stats(&[]), None);
    }
}
