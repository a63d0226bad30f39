//! Types that represent the data model: the schema registry, transaction rows and tables.
mod amount;
pub mod schema;
mod table;
mod transaction;
mod value;

pub use amount::Amount;
pub use schema::{Column, ColumnDefault, ColumnSpec, ColumnType};
pub use table::Table;
pub use transaction::{Record, Transaction};
pub use value::Value;

use std::collections::BTreeMap;

/// An uncoerced input row: column name to whatever value the caller had, e.g. a CSV cell or a
/// JSON number. Missing keys and `null` values take the column default.
pub type RawRow = BTreeMap<String, serde_json::Value>;
