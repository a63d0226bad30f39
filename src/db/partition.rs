use crate::error::{fail, ErrorType};
use crate::Result;
use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The extension of partition files.
const PARTITION_EXTENSION: &str = "pq";

/// Identifies the partition file that holds all transactions of one calendar month.
///
/// Partitions live at `<root>/<year>/<month>.pq`, e.g. `transactions/2023/03.pq`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct PartitionKey {
    year: i32,
    month: u32,
}

impl PartitionKey {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            fail!(ErrorType::Internal, "Invalid month {month} for year {year}");
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: &NaiveDateTime) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn contains(&self, date: &NaiveDateTime) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// The year folder under `root`.
    pub fn dir(&self, root: &Path) -> PathBuf {
        root.join(self.year.to_string())
    }

    /// The partition file under `root`.
    pub fn path(&self, root: &Path) -> PathBuf {
        self.dir(root)
            .join(format!("{:02}.{PARTITION_EXTENSION}", self.month))
    }

    /// The partition that `file` holds, if it is named like one: a `.pq` file whose stem is a
    /// month number, inside a folder named after the year. Unpadded months such as `3.pq` are
    /// recognized as well as `03.pq`.
    pub fn from_file(file: &Path) -> Option<Self> {
        if file.extension()? != PARTITION_EXTENSION {
            return None;
        }
        let month: u32 = file.file_stem()?.to_str()?.parse().ok()?;
        let year: i32 = file.parent()?.file_name()?.to_str()?.parse().ok()?;
        Self::new(year, month).ok()
    }
}

impl Display for PartitionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Parses `YYYY-MM`.
impl FromStr for PartitionKey {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parsed = s
            .trim()
            .split_once('-')
            .and_then(|(y, m)| Some((y.parse::<i32>().ok()?, m.parse::<u32>().ok()?)));
        match parsed {
            Some((year, month)) if (1..=12).contains(&month) => Ok(Self { year, month }),
            _ => fail!(
                ErrorType::Coercion,
                "Unable to parse '{s}' as a month, expected YYYY-MM"
            ),
        }
    }
}
