//! Insert command handlers.

use crate::args::{ImportArgs, InsertArgs};
use crate::commands::{plural, Out};
use crate::error::{fail, ErrorType};
use crate::model::RawRow;
use crate::{import, Config, Result};
use serde_json::Value;

/// Inserts a new transaction into the store.
///
/// The store generates the id and converts the text values to their column types; columns that are
/// not given take their defaults. The generated id is returned on success.
///
/// # Errors
/// - `ErrorType::Coercion` if a value cannot be converted, e.g. an amount of `lots`.
/// - `ErrorType::Storage` if the partition file cannot be written.
pub async fn insert_transaction(config: Config, args: InsertArgs) -> Result<Out<String>> {
    let mut db = config.open_db()?;
    let row = insert_args_to_raw(args);
    let ids = db.insert_data(&[row])?;
    match ids.into_iter().next() {
        Some(id) => Ok(Out::new(format!("Inserted transaction {id}"), id)),
        None => fail!(ErrorType::Internal, "The store returned no id for the new row"),
    }
}

/// Inserts every row of a CSV file. Either all rows are inserted or none are.
pub async fn import_transactions(config: Config, args: ImportArgs) -> Result<Out<Vec<String>>> {
    let rows = import::read_csv_file(args.file())?;
    let mut db = config.open_db()?;
    let ids = db.insert_data(&rows)?;
    let message = format!(
        "Imported {} from {}",
        plural(ids.len(), "transaction"),
        args.file().display()
    );
    Ok(Out::new(message, ids))
}

fn insert_args_to_raw(args: InsertArgs) -> RawRow {
    let mut row = RawRow::new();
    row.insert("date".into(), Value::String(args.date));
    row.insert("payee".into(), Value::String(args.payee));
    row.insert("amount".into(), Value::String(args.amount));
    let optional = [
        ("category", args.category),
        ("memo", args.memo),
        ("account", args.account),
        ("inflow", args.inflow),
        ("outflow", args.outflow),
        ("reconciled", args.reconciled),
    ];
    for (column, value) in optional {
        if let Some(value) = value {
            row.insert(column.into(), Value::String(value));
        }
    }
    row
}
