use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use clap::ValueEnum;
use tracing::{debug, info, warn};

use crate::error::LoadError;
use crate::models::{PageView, PageViewTable};

/// What to do when the same date appears on more than one row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum DuplicatePolicy {
    /// Fail the load.
    #[default]
    Reject,
    /// Keep the first row seen for the date and skip the rest.
    KeepFirst,
}

#[derive(serde::Deserialize)]
struct CsvRow {
    date: NaiveDate,
    value: u64,
}

pub fn load_page_views(path: &Path, policy: DuplicatePolicy) -> Result<PageViewTable, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = load_page_views_from_reader(file, policy)?;
    info!(
        path = %path.display(),
        rows = table.len(),
        "loaded page view series"
    );
    Ok(table)
}

pub fn load_page_views_from_reader<R: Read>(
    reader: R,
    policy: DuplicatePolicy,
) -> Result<PageViewTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut by_date: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    let mut skipped = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        match by_date.entry(row.date) {
            Entry::Vacant(slot) => {
                slot.insert(row.value);
            }
            Entry::Occupied(_) => match policy {
                DuplicatePolicy::Reject => {
                    return Err(LoadError::DuplicateDate { date: row.date });
                }
                DuplicatePolicy::KeepFirst => {
                    warn!(date = %row.date, value = row.value, "skipping duplicate date");
                    skipped += 1;
                }
            },
        }
    }

    if by_date.is_empty() {
        return Err(LoadError::Empty);
    }

    debug!(rows = by_date.len(), skipped, "parsed page view rows");

    let entries = by_date
        .into_iter()
        .map(|(date, value)| PageView { date, value })
        .collect();
    Ok(PageViewTable::from_sorted(entries))
}
