use std::slice;

use log::debug;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    monthmap::{MonthBuckets, MonthKey},
    record::CommitRecord,
};

/// English month names, independent of the host locale.
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

time::serde::format_description!(iso_day, Date, "[year]-[month]-[day]");

/// All commits of one month, as shown under a single changelog heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyEntry {
    /// `git-YYYY-MM`
    pub id: String,
    /// Month name and year, e.g. `January 2024`
    pub title: String,
    /// First day of the month
    #[serde(with = "iso_day")]
    pub date: Date,
    pub commits: Vec<CommitRecord>,
}

impl MonthlyEntry {
    /// Builds the entry for `key`. Title and date come from the key alone so
    /// every commit of the month shares them.
    pub fn new(key: &MonthKey, commits: Vec<CommitRecord>) -> MonthlyEntry {
        MonthlyEntry {
            id: format!("git-{key}"),
            title: month_title(key),
            date: key.first_day(),
            commits,
        }
    }
}

/// Formats a month key as `<Month name> <year>`.
///
/// # Example
///
/// ```
/// # use doclog::{dataset::month_title, MonthKey};
/// # use time::macros::date;
/// assert_eq!(month_title(&MonthKey::of(date!(2023 - 12 - 20))), "December 2023");
/// ```
pub fn month_title(key: &MonthKey) -> String {
    let idx = usize::from(key.month().clamp(1, 12)) - 1;
    format!("{} {}", MONTH_NAMES[idx], key.year())
}

/// The ordered list of monthly entries, most recent month first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangelogDataset(Vec<MonthlyEntry>);

impl ChangelogDataset {
    pub fn entries(&self) -> &[MonthlyEntry] { &self.0 }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn len(&self) -> usize { self.0.len() }

    /// Total number of commits across all months.
    pub fn commit_count(&self) -> usize { self.0.iter().map(|e| e.commits.len()).sum() }

    pub fn iter(&self) -> slice::Iter<'_, MonthlyEntry> { self.0.iter() }
}

impl<'a> IntoIterator for &'a ChangelogDataset {
    type IntoIter = slice::Iter<'a, MonthlyEntry>;
    type Item = &'a MonthlyEntry;

    fn into_iter(self) -> Self::IntoIter { self.0.iter() }
}

/// Turns month buckets into a [`ChangelogDataset`].
pub struct ChangelogAssembler;

impl ChangelogAssembler {
    /// Creates one entry per bucket and orders them by date, newest first.
    /// The sort is stable, so entries with equal dates keep bucket order.
    pub fn assemble(buckets: MonthBuckets) -> ChangelogDataset {
        let mut entries: Vec<MonthlyEntry> = buckets
            .into_iter()
            .map(|(key, commits)| MonthlyEntry::new(&key, commits))
            .collect();
        entries.sort_by(|a, b| b.date.cmp(&a.date));

        debug!("Assembled changelog with {} monthly entries", entries.len());
        ChangelogDataset(entries)
    }
}
