//! Command handlers for the findash CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod delete;
mod init;
mod insert;
mod query;
mod save;
mod update;

use crate::args::Assignment;
use crate::model::{Column, RawRow};
use serde::Serialize;
use serde_json::Value as Json;
use std::fmt::Debug;
use std::str::FromStr;
use tracing::info;

pub use delete::delete_transactions;
pub use init::init;
pub use insert::{import_transactions, insert_transaction};
pub use query::{find_transactions, get_transactions};
pub use save::save;
pub use update::update_transactions;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to stdout.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                println!("{json}");
            }
        }
    }
}

/// Builds a raw row from `column=value` pairs. An empty value stands for "no value": the column
/// default for columns that have one, and an empty string for required columns such as `payee`.
fn assignments_to_raw(assignments: &[Assignment]) -> RawRow {
    assignments
        .iter()
        .map(|a| {
            let value = if !a.value().is_empty() {
                Json::String(a.value().to_string())
            } else {
                match Column::from_str(a.column()) {
                    Ok(column) if column.default().value().is_some() => Json::Null,
                    _ => Json::String(String::new()),
                }
            };
            (a.column().to_string(), value)
        })
        .collect()
}

/// `1 transaction`, `2 transactions`
fn plural(count: usize, noun: &str) -> String {
    format!("{count} {noun}{}", if count == 1 { "" } else { "s" })
}
