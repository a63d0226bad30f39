//! findash keeps financial transactions in a local store partitioned by calendar month.
//!
//! The `db` module holds the store itself, `model` the schema and row types, and `commands` the
//! handlers behind the `findash` CLI.

pub mod args;
pub mod commands;
mod config;
pub mod db;
mod error;
mod import;
pub mod model;
mod utils;


pub use config::Config;
pub use db::TransactionsDb;
pub use error::{Error, ErrorType, Result};
