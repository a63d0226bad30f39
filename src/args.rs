//! These structs provide the CLI interface for the findash CLI.

use crate::db::PartitionKey;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// findash: A command-line tool for keeping financial transactions in a local store.
///
/// Transactions are kept in one Parquet file per calendar month under the transactions directory
/// of $FINDASH_HOME. Every change rewrites only the months it touched.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory, the configuration file and an empty transactions store.
    ///
    /// This is the first command you should run. By default the data directory is
    /// $HOME/findash, pass --findash-home if you want it somewhere else.
    Init(InitArgs),
    /// Insert a single transaction.
    Insert(InsertArgs),
    /// Insert every row of a CSV file. The file needs date, payee and amount headers.
    Import(ImportArgs),
    /// Print transactions by id.
    Get(GetArgs),
    /// Print the transactions that match every --where filter.
    Find(FindArgs),
    /// Change columns of existing transactions.
    Update(UpdateArgs),
    /// Delete transactions by id.
    Delete(DeleteArgs),
    /// Rewrite monthly partition files from the current data.
    Save(SaveArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where findash data and configuration is held. Defaults to ~/findash
    #[arg(long, env = "FINDASH_HOME", default_value_t = default_findash_home())]
    findash_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, findash_home: PathBuf) -> Self {
        Self {
            log_level,
            findash_home: findash_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn findash_home(&self) -> &DisplayPath {
        &self.findash_home
    }
}

/// Args for the `findash init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// Where to keep the transactions store. Relative paths are resolved against the data
    /// directory. Defaults to `transactions`.
    #[arg(long)]
    trans_db_path: Option<PathBuf>,
}

impl InitArgs {
    pub fn new(trans_db_path: Option<PathBuf>) -> Self {
        Self { trans_db_path }
    }

    pub fn trans_db_path(&self) -> Option<&Path> {
        self.trans_db_path.as_deref()
    }
}

/// Args for the `findash insert` command. Values are given as text and converted to the column
/// types by the store.
#[derive(Debug, Parser, Clone, Default)]
pub struct InsertArgs {
    /// The date of the transaction, e.g. 2023-03-15
    #[arg(long)]
    pub date: String,

    /// Who the money went to or came from.
    #[arg(long)]
    pub payee: String,

    /// The signed amount, e.g. -42.50 or "$1,200.00"
    #[arg(long, allow_hyphen_values = true)]
    pub amount: String,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub memo: Option<String>,

    #[arg(long)]
    pub account: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    pub inflow: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    pub outflow: Option<String>,

    /// true or false
    #[arg(long)]
    pub reconciled: Option<String>,
}

/// Args for the `findash import` command.
#[derive(Debug, Parser, Clone)]
pub struct ImportArgs {
    /// The CSV file to import.
    file: PathBuf,
}

impl ImportArgs {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

/// Args for the `findash get` command.
#[derive(Debug, Parser, Clone)]
pub struct GetArgs {
    /// The ids to look up. Unknown ids are skipped.
    #[arg(long = "id", required = true)]
    ids: Vec<String>,
}

impl GetArgs {
    pub fn new(ids: Vec<String>) -> Self {
        Self { ids }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

/// Args for the `findash find` command.
#[derive(Debug, Parser, Clone)]
pub struct FindArgs {
    /// A `column=value` filter. May be given more than once, all filters must match. Use
    /// `column=` to match an empty or missing value.
    #[arg(long = "where")]
    filters: Vec<Assignment>,
}

impl FindArgs {
    pub fn new(filters: Vec<Assignment>) -> Self {
        Self { filters }
    }

    pub fn filters(&self) -> &[Assignment] {
        &self.filters
    }
}

/// Args for the `findash update` command.
#[derive(Debug, Parser, Clone)]
pub struct UpdateArgs {
    /// The ids of the transactions to change. All of them must exist.
    #[arg(long = "id", required = true)]
    ids: Vec<String>,

    /// A `column=value` change. May be given more than once.
    #[arg(long = "set", required = true)]
    changes: Vec<Assignment>,
}

impl UpdateArgs {
    pub fn new(ids: Vec<String>, changes: Vec<Assignment>) -> Self {
        Self { ids, changes }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn changes(&self) -> &[Assignment] {
        &self.changes
    }
}

/// Args for the `findash delete` command.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    /// The ids of the transactions to delete. All of them must exist.
    #[arg(long = "id", required = true)]
    ids: Vec<String>,
}

impl DeleteArgs {
    pub fn new(ids: Vec<String>) -> Self {
        Self { ids }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

/// Args for the `findash save` command.
#[derive(Debug, Parser, Clone)]
pub struct SaveArgs {
    /// A month to rewrite, as YYYY-MM. May be given more than once.
    #[arg(long = "month", required_unless_present = "all", conflicts_with = "all")]
    months: Vec<PartitionKey>,

    /// Rewrite every month that holds at least one transaction.
    #[arg(long)]
    all: bool,
}

impl SaveArgs {
    pub fn new(months: Vec<PartitionKey>, all: bool) -> Self {
        Self { months, all }
    }

    pub fn months(&self) -> &[PartitionKey] {
        &self.months
    }

    pub fn all(&self) -> bool {
        self.all
    }
}

/// A `column=value` pair given on the command line.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Assignment {
    column: String,
    value: String,
}

impl Assignment {
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl FromStr for Assignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((column, value)) if !column.trim().is_empty() => {
                Ok(Self::new(column.trim(), value))
            }
            _ => Err(format!("expected column=value, got '{s}'")),
        }
    }
}

fn default_findash_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("findash"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --findash-home or FINDASH_HOME instead of relying on the \
                default findash home directory. If you continue using the program right now, you \
                may have problems!",
            );
            PathBuf::from("findash")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
